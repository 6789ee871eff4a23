//! Server configuration.

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{load_config, ConfigLoader};
pub use types::*;
pub use validation::{validate_config, ConfigError};
