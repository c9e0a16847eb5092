//! Sample upstream responses

pub const R_VERSIONS_BODY: &str =
    r#"{"r_versions": ["4.2.3", "4.3.3", "4.4.0", "4.4.3", "4.5.0", "4.5.1"]}"#;

pub const PYTHON_RELEASES_BODY: &str = r#"[
    {"name": "Python 3.11.11", "pre_release": false},
    {"name": "Python 3.12.9", "pre_release": false},
    {"name": "Python 3.13.2", "pre_release": false},
    {"name": "Python 3.14.0a5", "pre_release": true}
]"#;

pub const QUARTO_RELEASES_BODY: &str = r#"[
    {"tag_name": "v1.8.1", "prerelease": true},
    {"tag_name": "v1.7.32"},
    {"tag_name": "v1.6.42"}
]"#;

pub const WORKBENCH_DAILY_BODY: &str = r#"{
    "version": "2025.09.0-daily+212",
    "downloads": {
        "ubuntu2204": "https://downloads.example.invalid/workbench-jammy.deb",
        "ubuntu2404": "https://downloads.example.invalid/workbench-noble.deb"
    }
}"#;

pub const STREAM_BASE_URL: &str = "https://streams.example.invalid";
