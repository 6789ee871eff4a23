//! Role-based authorization gate.

pub mod layer;
pub mod types;

pub use layer::{AuthzLayer, AuthzMiddleware};
pub use types::RoleSet;
