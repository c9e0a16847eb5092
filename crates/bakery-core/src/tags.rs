//! Tag patterns
//!
//! A tag pattern is a list of tera snippets (`{{ Version }}-{{ OS }}`) plus a
//! set of filters restricting which targets it applies to.

use crate::utils::sanitize_tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tera::{Context, Tera};
use tracing::debug;

/// Conditions a target must meet for a pattern to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagFilter {
    /// Applies to every target regardless of other filters
    #[serde(rename = "all")]
    All,
    /// Only targets of the version marked latest
    #[serde(rename = "latest")]
    Latest,
    /// Only targets built on the primary OS
    #[serde(rename = "primaryOS")]
    PrimaryOs,
    /// Only targets of the primary variant
    #[serde(rename = "primaryVariant")]
    PrimaryVariant,
}

/// Ordered pattern strings with inclusion filters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPattern {
    pub patterns: Vec<String>,

    #[serde(default = "default_only")]
    pub only: BTreeSet<TagFilter>,
}

fn default_only() -> BTreeSet<TagFilter> {
    BTreeSet::from([TagFilter::All])
}

/// Token values available to a pattern for one target
#[derive(Debug, Clone, Default)]
pub struct TagTokens {
    pub name: String,
    pub version: String,
    pub os: Option<String>,
    pub variant: Option<String>,
}

impl TagTokens {
    fn to_context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert("Name", &self.name);
        ctx.insert("Version", &self.version);
        if let Some(os) = &self.os {
            ctx.insert("OS", os);
        }
        if let Some(variant) = &self.variant {
            ctx.insert("Variant", variant);
        }
        ctx
    }
}

impl TagPattern {
    pub fn new<I, S>(patterns: I, only: &[TagFilter]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            only: only.iter().copied().collect(),
        }
    }

    /// Whether this pattern applies to a target with the given properties
    ///
    /// Targets without an OS or variant should pass `true` for the matching
    /// primary flag.
    pub fn applies(&self, is_latest: bool, is_primary_os: bool, is_primary_variant: bool) -> bool {
        if self.only.contains(&TagFilter::All) {
            return true;
        }
        (!self.only.contains(&TagFilter::Latest) || is_latest)
            && (!self.only.contains(&TagFilter::PrimaryOs) || is_primary_os)
            && (!self.only.contains(&TagFilter::PrimaryVariant) || is_primary_variant)
    }

    /// Render every pattern string, skipping ones that reference absent tokens
    pub fn render(&self, tokens: &TagTokens) -> Vec<String> {
        let ctx = tokens.to_context();
        self.patterns
            .iter()
            .filter_map(|pattern| match Tera::one_off(pattern, &ctx, false) {
                Ok(rendered) => {
                    let tag = sanitize_tag(&rendered);
                    (!tag.is_empty()).then_some(tag)
                }
                Err(e) => {
                    debug!("Skipping tag pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect()
    }
}

/// Built-in patterns used when neither a variant nor its image declares any
pub fn default_tag_patterns() -> Vec<TagPattern> {
    use TagFilter::*;
    vec![
        TagPattern::new(["{{ Version }}-{{ OS }}-{{ Variant }}"], &[All]),
        TagPattern::new(["{{ Version }}-{{ OS }}"], &[PrimaryVariant]),
        TagPattern::new(["{{ Version }}-{{ Variant }}"], &[PrimaryOs]),
        TagPattern::new(["{{ Version }}"], &[PrimaryOs, PrimaryVariant]),
        TagPattern::new(["{{ OS }}-{{ Variant }}"], &[Latest]),
        TagPattern::new(["{{ OS }}"], &[Latest, PrimaryVariant]),
        TagPattern::new(["{{ Variant }}"], &[Latest, PrimaryOs]),
        TagPattern::new(["latest"], &[Latest, PrimaryOs, PrimaryVariant]),
    ]
}
