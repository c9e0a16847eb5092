//! Common test infrastructure for bakery-tools tests
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;

pub use fixtures::*;
