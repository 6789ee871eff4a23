//! Authentication gate.

pub mod extractor;
pub mod jwt;
pub mod layer;
pub mod password;
pub mod types;

pub use extractor::Auth;
pub use jwt::TokenIssuer;
pub use layer::{authenticate, extract_token, AuthLayer, AuthMiddleware, LOGGED_OUT, SESSION_COOKIE};
pub use password::{hash_password, verify_password};
pub use types::{Claims, Identity};
