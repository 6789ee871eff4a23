//! Admission pipeline middleware.

pub mod auth;
pub mod authz;
pub mod context;
pub mod logging;
pub mod params;
pub mod rate_limit;
pub mod sanitize;
pub mod security_headers;

pub use auth::{Auth, AuthLayer, Identity, TokenIssuer};
pub use authz::{AuthzLayer, RoleSet};
pub use context::{RequestTime, RequestTimeLayer};
pub use logging::LoggingLayer;
pub use params::{ParamGuardLayer, ParamValue, QueryParams};
pub use rate_limit::{InMemoryStore, RateLimitLayer, RateLimitPolicy, RateLimitStore};
pub use sanitize::SanitizeLayer;
pub use security_headers::{SecurityHeaders, SecurityHeadersLayer};
