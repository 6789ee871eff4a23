//! Payload sanitization: size cap, body parsing, operator stripping and
//! markup escaping.

pub mod clean;
pub mod layer;

pub use clean::{clean_path_value, clean_value, escape_markup, is_operator_key};
pub use layer::SanitizeLayer;
