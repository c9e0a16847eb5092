//! Common test utilities for bakery-core
//!
//! Provides shared test infrastructure including:
//! - Build context fixtures on disk
//! - Mock version sources
//! - Target assertions

pub mod assertions;
pub mod fixtures;
pub mod mocks;

pub use assertions::*;
pub use fixtures::*;
pub use mocks::*;
