//! Operating system catalog and free-text OS normalization
//!
//! Image configs name operating systems in prose ("Ubuntu 22.04",
//! "AlmaLinux 9"). [`normalize_os`] maps those to a [`BuildOs`] from a static
//! catalog so packaging decisions (deb vs rpm) can be made per target.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Packaging family of an operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OsFamily {
    DebianLike,
    RedhatLike,
    SuseLike,
    Unknown,
}

/// Normalized OS metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOs {
    pub family: OsFamily,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
}

struct CatalogEntry {
    family: OsFamily,
    name: &'static str,
    version: &'static str,
    codename: Option<&'static str>,
}

const fn entry(
    family: OsFamily,
    name: &'static str,
    version: &'static str,
    codename: Option<&'static str>,
) -> CatalogEntry {
    CatalogEntry {
        family,
        name,
        version,
        codename,
    }
}

/// Supported operating systems
static CATALOG: &[CatalogEntry] = &[
    entry(OsFamily::DebianLike, "ubuntu", "20.04", Some("focal")),
    entry(OsFamily::DebianLike, "ubuntu", "22.04", Some("jammy")),
    entry(OsFamily::DebianLike, "ubuntu", "24.04", Some("noble")),
    entry(OsFamily::DebianLike, "debian", "11", Some("bullseye")),
    entry(OsFamily::DebianLike, "debian", "12", Some("bookworm")),
    entry(OsFamily::DebianLike, "debian", "13", Some("trixie")),
    entry(OsFamily::RedhatLike, "rhel", "8", None),
    entry(OsFamily::RedhatLike, "rhel", "9", None),
    entry(OsFamily::RedhatLike, "rhel", "10", None),
    entry(OsFamily::RedhatLike, "alma", "8", None),
    entry(OsFamily::RedhatLike, "alma", "9", None),
    entry(OsFamily::RedhatLike, "alma", "10", None),
    entry(OsFamily::RedhatLike, "rocky", "8", None),
    entry(OsFamily::RedhatLike, "rocky", "9", None),
    entry(OsFamily::RedhatLike, "rocky", "10", None),
    entry(OsFamily::RedhatLike, "centos", "7", None),
    entry(OsFamily::SuseLike, "opensuse", "15", None),
    entry(OsFamily::SuseLike, "sles", "15", None),
];

/// Operating systems that are meaningful without a version
const UNVERSIONED: &[&str] = &["scratch"];

/// Alternate spellings, after lower-casing and removing non-alphanumerics
const ALIASES: &[(&str, &str)] = &[
    ("redhat", "rhel"),
    ("redhatenterpriselinux", "rhel"),
    ("almalinux", "alma"),
    ("rockylinux", "rocky"),
    ("centoslinux", "centos"),
    ("opensuseleap", "opensuse"),
    ("leap", "opensuse"),
    ("suse", "sles"),
    ("suselinuxenterpriseserver", "sles"),
];

static OS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\D+)(\d[\d.]*)").expect("os regex is valid"));

impl CatalogEntry {
    fn to_build_os(&self) -> BuildOs {
        BuildOs {
            family: self.family,
            name: self.name.to_string(),
            version: self.version.to_string(),
            codename: self.codename.map(str::to_string),
        }
    }
}

impl BuildOs {
    /// Sentinel returned when an OS name cannot be resolved
    pub fn unknown() -> Self {
        Self {
            family: OsFamily::Unknown,
            name: "unknown".to_string(),
            version: String::new(),
            codename: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.family == OsFamily::Unknown && self.name == "unknown"
    }

    /// Version component before the first dot ("22" for "22.04")
    pub fn major_version(&self) -> &str {
        self.version.split('.').next().unwrap_or_default()
    }

    /// Native package file suffix
    pub fn package_suffix(&self) -> &'static str {
        match self.family {
            OsFamily::DebianLike => "deb",
            OsFamily::RedhatLike | OsFamily::SuseLike => "rpm",
            OsFamily::Unknown => "",
        }
    }

    /// Separator between package version and architecture in file names
    pub fn package_arch_separator(&self) -> &'static str {
        match self.family {
            OsFamily::DebianLike => "_",
            OsFamily::RedhatLike | OsFamily::SuseLike => ".",
            OsFamily::Unknown => "",
        }
    }

    /// Separator between package name and version in file names
    pub fn package_version_separator(&self) -> &'static str {
        match self.family {
            OsFamily::DebianLike => "_",
            OsFamily::RedhatLike | OsFamily::SuseLike => "-",
            OsFamily::Unknown => "",
        }
    }
}

impl fmt::Display for BuildOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

fn canonical_name(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == compact)
        .map(|(_, name)| name.to_string())
        .unwrap_or(compact)
}

fn numeric_parts(version: &str) -> Vec<u32> {
    version
        .split('.')
        .filter_map(|p| p.parse::<u32>().ok())
        .collect()
}

/// Newest catalog entry of an OS family name, compared numerically
fn latest_of(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG
        .iter()
        .filter(|e| e.name == name)
        .max_by(|a, b| numeric_parts(a.version).cmp(&numeric_parts(b.version)))
}

/// Catalog entry for `(name, major version)`, preferring an exact version match
fn lookup(name: &str, version: &str) -> Option<&'static CatalogEntry> {
    let major = version.split('.').next().unwrap_or_default();
    let mut candidates = CATALOG
        .iter()
        .filter(|e| e.name == name && e.version.split('.').next() == Some(major))
        .peekable();
    let first = candidates.peek().copied();
    candidates
        .find(|e| numeric_parts(e.version) == numeric_parts(version))
        .or(first)
}

/// Map a human OS name onto the catalog
///
/// Never fails: unresolvable names log a warning and return
/// [`BuildOs::unknown`].
pub fn normalize_os(name: &str) -> BuildOs {
    let cleaned = name.trim().to_lowercase();

    let resolved = match OS_RE.captures(&cleaned) {
        Some(caps) => {
            let os_name = canonical_name(&caps[1]);
            let version = caps[2].trim_end_matches('.');
            lookup(&os_name, version).map(CatalogEntry::to_build_os)
        }
        None => {
            let os_name = canonical_name(&cleaned);
            if UNVERSIONED.contains(&os_name.as_str()) {
                Some(BuildOs {
                    family: OsFamily::Unknown,
                    name: os_name,
                    version: String::new(),
                    codename: None,
                })
            } else {
                latest_of(&os_name).map(CatalogEntry::to_build_os)
            }
        }
    };

    match resolved {
        Some(os) => {
            debug!("Normalized OS '{}' to {}", name, os);
            os
        }
        None => {
            warn!("Unable to match OS '{}' to a supported OS, using 'unknown'", name);
            BuildOs::unknown()
        }
    }
}
