//! Common test infrastructure for bakery-versions tests
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! - `constants`: Upstream response bodies
//! - `fake_http`: In-memory `HttpFetch` keyed by URL
//! - `mock_server`: Wiremock setup helpers

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod fake_http;
pub mod mock_server;

pub use constants::*;
pub use fake_http::*;
pub use mock_server::*;
