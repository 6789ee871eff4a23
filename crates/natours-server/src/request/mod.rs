//! Request data transfer objects and extractors.

pub mod extract;

use crate::models::{Difficulty, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub use extract::{CleanPath, ValidJson};

/// Route parameter `:id`.
#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: Uuid,
}

/// Route parameter `:tourId` of the tour routes. Shares its name with the
/// prefix of the nested review router.
#[derive(Debug, Deserialize)]
pub struct TourIdPath {
    #[serde(rename = "tourId")]
    pub id: Uuid,
}

/// Route parameter `:slug` of the tour page.
#[derive(Debug, Deserialize)]
pub struct SlugPath {
    pub slug: String,
}

/// Route parameters of the review router, which may be nested under a tour.
#[derive(Debug, Deserialize)]
pub struct ReviewScope {
    #[serde(rename = "tourId")]
    pub tour_id: Option<Uuid>,
}

/// Route parameters of `/tours/:tourId/reviews/:id`.
#[derive(Debug, Deserialize)]
pub struct ScopedIdPath {
    #[serde(rename = "tourId")]
    pub tour_id: Option<Uuid>,
    pub id: Uuid,
}

/// Tour creation request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourRequest {
    #[validate(length(min = 10, max = 40, message = "A tour name must have between 10 and 40 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "A tour must have a duration"))]
    pub duration: u32,
    #[validate(range(min = 1, message = "A tour must have a group size"))]
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
}

/// Tour update request. Only present fields change.
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourRequest {
    #[validate(length(min = 10, max = 40, message = "A tour name must have between 10 and 40 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[validate(range(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_group_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 1.0, max = 5.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_average: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Review creation request. `tour` and `user` may be filled from the route
/// and the caller.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "Review can not be empty!"))]
    pub review: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    pub tour: Option<Uuid>,
    pub user: Option<Uuid>,
}

/// Review update request.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, message = "Review can not be empty!"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Please tell us your name!"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords are not the same!"))]
    pub password_confirm: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Please provide your current password"))]
    pub password_current: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords are not the same!"))]
    pub password_confirm: String,
}

/// Self-service profile update. Only `name` and `email` are applied.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub password: Option<serde_json::Value>,
    pub password_confirm: Option<serde_json::Value>,
}

/// Admin user creation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(nested)]
    #[serde(flatten)]
    pub account: SignupRequest,
    pub role: Option<Role>,
}

/// Admin user update. Passwords are not changed here.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_password_confirmation() {
        let request: SignupRequest = serde_json::from_value(serde_json::json!({
            "name": "Ann",
            "email": "ann@example.com",
            "password": "pass1234",
            "passwordConfirm": "pass12345"
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password_confirm"));
    }

    #[test]
    fn test_review_rating_range() {
        let request = CreateReviewRequest {
            review: "Great".into(),
            rating: 6,
            tour: None,
            user: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let request = UpdateTourRequest {
            name: None,
            duration: None,
            max_group_size: Some(12),
            difficulty: None,
            ratings_average: None,
            price: Some(499.0),
            summary: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"maxGroupSize": 12, "price": 499.0})
        );
    }
}
