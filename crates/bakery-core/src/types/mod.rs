//! Configuration model types
//!
//! The tree is owned top-down: a [`BakeryConfigFile`] owns images, an
//! [`Image`] owns variants and versions, a version owns its operating
//! systems. Children never point back at their parents; operations needing
//! parent data take it as an explicit argument.

mod config_types;
mod dev;
mod image;
mod matrix;
mod version;

pub use config_types::{BakeryConfigFile, Repository, DEFAULT_LABEL_PREFIX};
pub use dev::{DevVersion, DevVersionSource};
pub use image::{Image, ImageVariant};
pub use matrix::ImageMatrix;
pub use version::{ImageVersion, ImageVersionOs};
