//! Rate limiting middleware.

pub mod layer;
pub mod store;
pub mod types;

pub use layer::{RateLimitLayer, RateLimitMiddleware};
pub use store::{InMemoryStore, RateLimitResult, RateLimitStore};
pub use types::{KeyStrategy, RateLimitPolicy, RateLimitState};
