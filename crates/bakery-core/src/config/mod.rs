//! Configuration loading and management

mod loader;
mod settings;

pub use loader::BakeryConfig;
pub use settings::RuntimeSettings;
