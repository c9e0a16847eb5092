//! Rendering of version directories from image templates
//!
//! Every image may keep a `template/` directory. Rendering a version walks
//! it and writes each file into the version directory: `.jinja2` files go
//! through Tera (undefined variables are errors), everything else is
//! copied as is.

use crate::error::{Error, Result};
use crate::os::BuildOs;
use crate::types::{Image, ImageVersion};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use tera::{Context, Tera};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Directory under an image holding its templates
pub const TEMPLATE_DIR: &str = "template";

/// Suffix marking files rendered with Tera
pub const TEMPLATE_SUFFIX: &str = ".jinja2";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    name: &'a str,
    display_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionContext<'a> {
    name: &'a str,
    is_development_version: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OsContext<'a> {
    name: &'a str,
    primary: bool,
    extension: &'a str,
    tag_display_name: &'a str,
    build_os: BuildOs,
    artifact_download_url: Option<&'a str>,
}

/// Values visible to templates of one version
pub fn render_context(image: &Image, version: &ImageVersion) -> Context {
    let mut ctx = Context::new();
    ctx.insert(
        "Image",
        &ImageContext {
            name: &image.name,
            display_name: image.display_name(),
        },
    );
    ctx.insert(
        "Version",
        &VersionContext {
            name: &version.name,
            is_development_version: version.is_development_version,
        },
    );

    let os: Vec<OsContext<'_>> = version
        .os
        .iter()
        .map(|o| OsContext {
            name: &o.name,
            primary: o.primary,
            extension: &o.extension,
            tag_display_name: &o.tag_display_name,
            build_os: o.build_os(),
            artifact_download_url: o.artifact_download_url.as_deref(),
        })
        .collect();
    ctx.insert("OS", &os);

    let dependencies: BTreeMap<String, Vec<String>> = version
        .dependencies
        .iter()
        .map(|d| {
            (
                d.dependency.to_string(),
                d.versions.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect();
    ctx.insert("Dependencies", &dependencies);

    // Version values override image values of the same key
    let mut values = image.values.clone();
    values.extend(version.values.clone());
    ctx.insert("Values", &values);

    ctx
}

fn utf8(path: &std::path::Path) -> Result<&Utf8Path> {
    Utf8Path::from_path(path)
        .ok_or_else(|| Error::invalid_config(format!("Path is not valid UTF-8: {:?}", path)))
}

/// Render `<image>/template/` into the version directory
///
/// Returns the written files. An image without a template directory
/// renders nothing.
pub fn render_version(
    context: &Utf8Path,
    image: &Image,
    version: &ImageVersion,
) -> Result<Vec<Utf8PathBuf>> {
    let image_path = image.path(context);
    let template_dir = image_path.join(TEMPLATE_DIR);
    if !template_dir.is_dir() {
        debug!("Image {} has no {} directory", image.name, TEMPLATE_DIR);
        return Ok(Vec::new());
    }
    let output_dir = version.path(&image_path);

    let mut files: Vec<Utf8PathBuf> = Vec::new();
    for entry in WalkDir::new(&template_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            let path = utf8(entry.path())?;
            let rel = path
                .strip_prefix(&template_dir)
                .map_err(|e| Error::invalid_config(format!("Bad template path {}: {}", path, e)))?;
            files.push(rel.to_owned());
        }
    }

    // Register every template first so they can include each other
    let mut tera = Tera::default();
    let mut sources = Vec::new();
    for rel in files.iter().filter(|f| f.as_str().ends_with(TEMPLATE_SUFFIX)) {
        let content = fs::read_to_string(template_dir.join(rel))?;
        sources.push((rel.as_str().to_string(), content));
    }
    tera.add_raw_templates(sources)?;

    let ctx = render_context(image, version);
    let mut written = Vec::new();
    for rel in &files {
        let source = template_dir.join(rel);
        let (output, rendered) = match rel.as_str().strip_suffix(TEMPLATE_SUFFIX) {
            Some(stripped) => (output_dir.join(stripped), true),
            None => (output_dir.join(rel), false),
        };
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        if rendered {
            let content = tera.render(rel.as_str(), &ctx)?;
            fs::write(&output, content)?;
        } else {
            fs::copy(&source, &output)?;
        }
        written.push(output);
    }

    info!(
        "Rendered {} files for {} {} into {}",
        written.len(),
        image.name,
        version.name,
        output_dir
    );
    Ok(written)
}

/// Remove rendered directories of ephemeral versions; returns how many
pub fn cleanup_ephemeral(context: &Utf8Path, image: &Image) -> Result<usize> {
    let image_path = image.path(context);
    let mut removed = 0;
    for version in image.versions.iter().filter(|v| v.ephemeral) {
        let dir = version.path(&image_path);
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
            debug!("Removed ephemeral version directory {}", dir);
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageVersionOs;
    use crate::version::{Dependency, DependencyVersion, DependencyVersions};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Utf8PathBuf, Image, ImageVersion) {
        let dir = TempDir::new().unwrap();
        let context = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let template = context.join("demo").join(TEMPLATE_DIR);
        fs::create_dir_all(template.join("test")).unwrap();
        fs::write(
            template.join("Containerfile.ubuntu2204.jinja2"),
            "FROM ubuntu:22.04\nARG R_VERSION={{ Dependencies.R | first }}\n\
             LABEL v={{ Version.name }} go={{ Values.goVersion }}\n",
        )
        .unwrap();
        fs::write(template.join("test").join("goss.yaml"), "file: {}\n").unwrap();

        let mut image = Image::new("demo");
        image.values.insert("goVersion".to_string(), "1.21".into());
        let mut version = ImageVersion::new("1.0.0");
        let mut os = ImageVersionOs::new("Ubuntu 22.04");
        os.apply_defaults();
        version.os = vec![os];
        version.values.insert("goVersion".to_string(), "1.22".into());
        version.dependencies = vec![DependencyVersions {
            dependency: Dependency::R,
            versions: vec![DependencyVersion::parse("4.5.1").unwrap()],
        }];
        (dir, context, image, version)
    }

    #[test]
    fn test_render_and_copy() {
        let (_dir, context, image, version) = setup();
        let written = render_version(&context, &image, &version).unwrap();
        assert_eq!(written.len(), 2);

        let out = context.join("demo/1.0.0");
        let containerfile = fs::read_to_string(out.join("Containerfile.ubuntu2204")).unwrap();
        assert!(containerfile.contains("ARG R_VERSION=4.5.1"));
        assert!(containerfile.contains("v=1.0.0 go=1.22"));
        assert_eq!(
            fs::read_to_string(out.join("test/goss.yaml")).unwrap(),
            "file: {}\n"
        );
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let (_dir, context, image, version) = setup();
        fs::write(
            context.join("demo/template/broken.jinja2"),
            "{{ Values.missing }}",
        )
        .unwrap();
        let err = render_version(&context, &image, &version).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_no_template_dir() {
        let dir = TempDir::new().unwrap();
        let context = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let written =
            render_version(&context, &Image::new("demo"), &ImageVersion::new("1.0.0")).unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_cleanup_only_ephemeral() {
        let (_dir, context, mut image, version) = setup();
        let mut dev = ImageVersion::new("2.0.0-dev");
        dev.subpath = ".dev-2.0.0-dev".to_string();
        dev.ephemeral = true;
        dev.values = version.values.clone();
        dev.dependencies = version.dependencies.clone();
        render_version(&context, &image, &version).unwrap();
        render_version(&context, &image, &dev).unwrap();
        image.versions = vec![version, dev];

        assert_eq!(cleanup_ephemeral(&context, &image).unwrap(), 1);
        assert!(context.join("demo/1.0.0").is_dir());
        assert!(!context.join("demo/.dev-2.0.0-dev").exists());
    }
}
