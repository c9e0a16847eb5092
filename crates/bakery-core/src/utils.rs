//! Shared helpers for naming and repository metadata

use camino::Utf8Path;
use std::process::Command;
use tracing::{debug, warn};

/// Lower-case slug with every non-alphanumeric run collapsed to a single `-`
///
/// Used for target uids, which must be safe as file names and as bake
/// target names.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// File-name friendly extension: lower-case, only `[a-z0-9_-]` kept
///
/// "Ubuntu 22.04" becomes "ubuntu2204".
pub fn extension_slug(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Tag friendly display name: lower-case, whitespace becomes `-`, dots kept
///
/// "Ubuntu 22.04" becomes "ubuntu-22.04".
pub fn tag_slug(input: &str) -> String {
    let replaced: String = input
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    collapse_dashes(&replaced)
}

/// Image repository path component: lower-case `[a-z0-9._-]`
///
/// "RStudio Workbench" becomes "rstudio-workbench".
pub fn repository_name(input: &str) -> String {
    tag_slug(input)
        .trim_matches(['.', '_', '-'])
        .to_string()
}

/// Restrict a rendered tag to the Docker tag alphabet `[A-Za-z0-9_.-]`
pub fn sanitize_tag(input: &str) -> String {
    let replaced: String = input
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let collapsed = collapse_dashes(&replaced);
    let trimmed = collapsed.trim_start_matches(['.', '-']).trim_end_matches('-');
    trimmed.chars().take(128).collect()
}

fn collapse_dashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Current commit SHA of the repository containing `repo_path`
///
/// Best effort: any failure is logged and yields an empty string, since the
/// value only feeds the revision label.
pub fn git_current_commit_sha(repo_path: &Utf8Path) -> String {
    let output = Command::new("git")
        .args(["-C", repo_path.as_str(), "rev-parse", "HEAD"])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
            debug!("Resolved git revision {} for {}", sha, repo_path);
            sha
        }
        Ok(out) => {
            warn!(
                "Unable to determine git revision for {}: {}",
                repo_path,
                String::from_utf8_lossy(&out.stderr).trim()
            );
            String::new()
        }
        Err(e) => {
            warn!("Unable to run git for {}: {}", repo_path, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("demo"), "demo");
        assert_eq!(slugify("1.0.0+build"), "1-0-0-build");
        assert_eq!(slugify("Ubuntu 22.04"), "ubuntu-22-04");
        assert_eq!(slugify("  spaced / out  "), "spaced-out");
    }

    #[test]
    fn test_extension_slug() {
        assert_eq!(extension_slug("Ubuntu 22.04"), "ubuntu2204");
        assert_eq!(extension_slug("Red_Hat-9"), "red_hat-9");
    }

    #[test]
    fn test_tag_slug() {
        assert_eq!(tag_slug("Ubuntu 22.04"), "ubuntu-22.04");
        assert_eq!(tag_slug("Rocky  Linux 9"), "rocky-linux-9");
    }

    #[test]
    fn test_repository_name() {
        assert_eq!(repository_name("demo"), "demo");
        assert_eq!(repository_name("RStudio Workbench"), "rstudio-workbench");
        assert_eq!(repository_name("_R-Session."), "r-session");
    }

    #[test]
    fn test_sanitize_tag() {
        assert_eq!(sanitize_tag("1.0.0-ubuntu-22.04-std"), "1.0.0-ubuntu-22.04-std");
        assert_eq!(sanitize_tag("2024.12.1+563"), "2024.12.1-563");
        assert_eq!(sanitize_tag("-leading"), "leading");
        assert_eq!(sanitize_tag(&"a".repeat(200)).len(), 128);
    }

    #[test]
    fn test_git_sha_outside_repo_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap();
        assert_eq!(git_current_commit_sha(path), "");
    }
}
