//! Resource records.

pub mod review;
pub mod tour;
pub mod user;

pub use review::Review;
pub use tour::{slugify, Difficulty, Tour};
pub use user::{PublicUser, Role, User};
