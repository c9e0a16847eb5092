//! Assertion helpers for resolved targets

#![allow(dead_code)]

use bakery_core::{Error, ImageTarget};
use std::collections::HashSet;

/// Assert that every target uid is distinct
pub fn assert_unique_uids(targets: &[ImageTarget<'_>]) {
    let uids: HashSet<String> = targets.iter().map(|t| t.uid()).collect();
    assert_eq!(
        uids.len(),
        targets.len(),
        "Duplicate uids in {:?}",
        targets.iter().map(|t| t.uid()).collect::<Vec<_>>()
    );
}

/// Find a target by uid or fail with the available uids
pub fn target<'t, 'a>(targets: &'t [ImageTarget<'a>], uid: &str) -> &'t ImageTarget<'a> {
    targets.iter().find(|t| t.uid() == uid).unwrap_or_else(|| {
        panic!(
            "No target {} in {:?}",
            uid,
            targets.iter().map(|t| t.uid()).collect::<Vec<_>>()
        )
    })
}

/// Assert that a grouped validation error mentions `phrase`
pub fn assert_validation_error_contains(err: &Error, phrase: &str) {
    match err {
        Error::Validation { errors, .. } => assert!(
            errors.iter().any(|e| e.contains(phrase)),
            "No validation error contains '{}': {:?}",
            phrase,
            errors
        ),
        other => panic!("Expected a validation error, got {:?}", other),
    }
}
