//! Structural validation shared by every configuration node
//!
//! Nodes implement [`Validate`] by calling the helpers below in a fixed order:
//! 1. empty-collection warnings
//! 2. soft de-duplication (warn, drop extras)
//! 3. hard duplicate detection
//! 4. single-primary auto-promotion
//! 5. multi-primary failure
//!
//! Hard problems are collected into a [`ValidationReport`] rather than
//! returned immediately so a user sees every problem in one pass.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::hash::Hash;
use tracing::warn;

/// Problems collected while validating a configuration tree
#[derive(Debug, Default)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hard error
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Record and log a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Record a failed result as a hard error
    pub fn check(&mut self, context: &str, result: Result<()>) {
        if let Err(e) = result {
            self.error(format!("{}: {}", context, e));
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Convert into a grouped error if any hard errors were recorded
    pub fn into_result(self, context: impl Into<String>) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(context, self.errors))
        }
    }
}

/// A configuration node that can check and normalize itself
pub trait Validate {
    /// Apply defaults and record problems; `context` names the node in messages
    fn validate(&mut self, context: &str, report: &mut ValidationReport);
}

/// Items that may be flagged as the primary entry of a list
pub trait Primary {
    fn name(&self) -> &str;
    fn is_primary(&self) -> bool;
    fn set_primary(&mut self, primary: bool);
}

/// Step 1: warn when a collection is empty
pub fn warn_if_empty<T>(items: &[T], what: &str, context: &str, report: &mut ValidationReport) {
    if items.is_empty() {
        report.warn(format!("No {} defined for {}", what, context));
    }
}

/// Step 2: drop repeated items, keeping the first occurrence
pub fn dedup_with_warning<T, F>(
    items: &mut Vec<T>,
    describe: F,
    what: &str,
    context: &str,
    report: &mut ValidationReport,
) where
    T: Eq + Hash + Clone,
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    let mut dropped = Vec::new();
    items.retain(|item| {
        if seen.insert(item.clone()) {
            true
        } else {
            dropped.push(describe(item));
            false
        }
    });
    for item in dropped {
        report.warn(format!(
            "Duplicate {} '{}' in {} will be ignored",
            what, item, context
        ));
    }
}

/// Step 3: fail when two items share a key
pub fn require_unique<T, K, F>(
    items: &[T],
    key: F,
    what: &str,
    context: &str,
    report: &mut ValidationReport,
) where
    K: Eq + Hash + std::fmt::Display,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for item in items {
        let k = key(item);
        let label = k.to_string();
        if !seen.insert(k) && reported.insert(label.clone()) {
            report.error(format!(
                "Duplicate {} '{}' found in {}",
                what, label, context
            ));
        }
    }
}

/// Step 4: a lone item is always primary
pub fn promote_single_primary<T: Primary>(items: &mut [T]) {
    if let [only] = items {
        only.set_primary(true);
    }
}

/// Step 5: at most one item may be primary
pub fn require_single_primary<T: Primary>(
    items: &[T],
    what: &str,
    context: &str,
    report: &mut ValidationReport,
) {
    let primaries: Vec<&str> = items
        .iter()
        .filter(|i| i.is_primary())
        .map(|i| i.name())
        .collect();

    match primaries.len() {
        0 if items.len() > 1 => report.warn(format!(
            "No primary {} marked in {}; tags requiring a primary {} will not apply",
            what, context, what
        )),
        0 | 1 => {}
        _ => report.error(format!(
            "Only one {} may be marked primary in {}, found: {}",
            what,
            context,
            primaries.join(", ")
        )),
    }
}
