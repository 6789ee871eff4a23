//! Error handling for the Natours API server.

pub mod boundary;
pub mod context;
pub mod response;
pub mod types;

pub use boundary::{panic_response, ErrorBoundaryLayer};
pub use context::ErrorContext;
pub use response::ErrorReport;
pub use types::{ApiError, ApiResult, FieldErrors};
