//! Authentication and authorization gates on the real route table.

mod common;

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
};
use chrono::Utc;
use common::*;
use natours_server::middleware::auth::Claims;
use serde_json::json;

fn new_tour() -> serde_json::Value {
    json!({
        "name": "The Desert Crossing",
        "duration": 7,
        "maxGroupSize": 8,
        "difficulty": "difficult",
        "price": 1999
    })
}

#[tokio::test]
async fn test_missing_credential_is_401_before_authz() {
    let app = spawn_app().await;
    let response = app.send_json(Method::POST, "/api/v1/tours", None, new_tour()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "You are not logged in! Please log in to get access.");
}

#[tokio::test]
async fn test_wrong_role_is_403() {
    let app = spawn_app().await;
    let response = app
        .send_json(Method::POST, "/api/v1/tours", Some(&app.user), new_tour())
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "You do not have permission to perform this action");
}

#[tokio::test]
async fn test_staff_can_manage_tours() {
    let app = spawn_app().await;

    let response = app
        .send_json(Method::POST, "/api/v1/tours", Some(&app.lead_guide), new_tour())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["data"]["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["data"]["slug"], "the-desert-crossing");

    let response = app
        .send_json(
            Method::PATCH,
            &format!("/api/v1/tours/{id}"),
            Some(&app.admin),
            json!({"name": "The Desert Traverse", "price": 1500}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["data"]["slug"], "the-desert-traverse");
    assert_eq!(body["data"]["data"]["price"], 1500.0);

    let response = app
        .send(
            request(Method::DELETE, &format!("/api/v1/tours/{id}"))
                .header(header::AUTHORIZATION, format!("Bearer {}", app.token_for(&app.admin)))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.get(&format!("/api/v1/tours/{id}")).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_and_expired_tokens() {
    let app = spawn_app().await;

    let response = app
        .send(
            request(Method::GET, "/api/v1/users/me")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid token. Please log in again!");

    let mut claims = Claims::new(app.user.id, 60);
    claims.iat -= 3600;
    claims.exp = Utc::now().timestamp() - 60;
    let expired = app.state.tokens.encode(&claims).unwrap();
    let response = app
        .send(
            request(Method::GET, "/api/v1/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {expired}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "Your token has expired! Please log in again."
    );
}

#[tokio::test]
async fn test_session_cookie_authenticates_until_logout() {
    let app = spawn_app().await;
    let token = app.token_for(&app.user);

    let response = app
        .send(
            request(Method::GET, "/api/v1/users/me")
                .header(header::COOKIE, format!("jwt={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["data"]["email"], "ann@natours.io");

    let response = app.get("/api/v1/users/logout").await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("jwt=loggedout"));

    let response = app
        .send(
            request(Method::GET, "/api/v1/users/me")
                .header(header::COOKIE, "jwt=loggedout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_then_login() {
    let app = spawn_app().await;
    let response = app
        .send_json(
            Method::POST,
            "/api/v1/users/signup",
            None,
            json!({
                "name": "Bob",
                "email": "Bob@Natours.io",
                "password": "hunter2hunter2",
                "passwordConfirm": "hunter2hunter2"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.contains("HttpOnly"));
    let body = body_json(response).await;
    assert!(body["token"].is_string());
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let response = app
        .send_json(
            Method::POST,
            "/api/v1/users/login",
            None,
            json!({"email": "bob@natours.io", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Incorrect email or password");

    let response = app
        .send_json(
            Method::POST,
            "/api/v1/users/login",
            None,
            json!({"email": "bob@natours.io", "password": "hunter2hunter2"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = spawn_app().await;
    let response = app
        .send_json(Method::POST, "/api/v1/users/login", None, json!({"email": "ann@natours.io"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Please provide email and password!");
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = spawn_app().await;
    let response = app
        .send_json(
            Method::POST,
            "/api/v1/users/signup",
            None,
            json!({
                "name": "Ann Again",
                "email": "ann@natours.io",
                "password": PASSWORD,
                "passwordConfirm": PASSWORD
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_old_token_rejected_after_password_change() {
    let app = spawn_app().await;
    let mut claims = Claims::new(app.user.id, 3600);
    claims.iat -= 60;
    let old_token = app.state.tokens.encode(&claims).unwrap();

    let response = app
        .send_json(
            Method::PATCH,
            "/api/v1/users/updateMyPassword",
            Some(&app.user),
            json!({
                "passwordCurrent": PASSWORD,
                "password": "brand-new-pass",
                "passwordConfirm": "brand-new-pass"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let new_token = body_json(response).await["token"].as_str().unwrap().to_string();

    let response = app
        .send(
            request(Method::GET, "/api/v1/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {old_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "User recently changed password! Please log in again."
    );

    let response = app
        .send(
            request(Method::GET, "/api/v1/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {new_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_current_password() {
    let app = spawn_app().await;
    let response = app
        .send_json(
            Method::PATCH,
            "/api/v1/users/updateMyPassword",
            Some(&app.user),
            json!({
                "passwordCurrent": "not-my-password",
                "password": "brand-new-pass",
                "passwordConfirm": "brand-new-pass"
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Your current password is wrong.");
}

#[tokio::test]
async fn test_update_me_refuses_passwords_and_applies_profile() {
    let app = spawn_app().await;

    let response = app
        .send_json(
            Method::PATCH,
            "/api/v1/users/updateMe",
            Some(&app.user),
            json!({"password": "sneaky-change"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "This route is not for password updates. Please use /updateMyPassword."
    );

    let response = app
        .send_json(
            Method::PATCH,
            "/api/v1/users/updateMe",
            Some(&app.user),
            json!({"name": "Ann Smith", "role": "admin"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["data"]["name"], "Ann Smith");
    assert_eq!(body["data"]["data"]["role"], "user");
}

#[tokio::test]
async fn test_deleted_account_can_no_longer_authenticate() {
    let app = spawn_app().await;
    let token = app.token_for(&app.user);

    let response = app
        .send(
            request(Method::DELETE, "/api/v1/users/deleteMe")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get_as("/api/v1/users/me", &app.user).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "The user belonging to this token does no longer exist."
    );
}

#[tokio::test]
async fn test_user_admin_routes() {
    let app = spawn_app().await;

    assert_eq!(app.get_as("/api/v1/users", &app.user).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/v1/users").await.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(app.get_as("/api/v1/users", &app.admin).await).await;
    assert_eq!(body["results"], 3);

    let response = app
        .send_json(
            Method::POST,
            "/api/v1/users",
            Some(&app.admin),
            json!({
                "name": "Gina",
                "email": "gina@natours.io",
                "password": PASSWORD,
                "passwordConfirm": PASSWORD,
                "role": "guide"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["data"]["role"], "guide");

    let uri = format!("/api/v1/users/{}", app.lead_guide.id);
    let response = app
        .send_json(Method::PATCH, &uri, Some(&app.admin), json!({"role": "admin"}))
        .await;
    assert_eq!(body_json(response).await["data"]["data"]["role"], "admin");
}

#[tokio::test]
async fn test_nested_review_takes_tour_from_route() {
    let app = spawn_app().await;
    let tour_id = app.tours[0].id;
    let uri = format!("/api/v1/tours/{tour_id}/reviews");

    let response = app
        .send_json(
            Method::POST,
            &uri,
            Some(&app.user),
            json!({"review": "Loved it", "rating": 5}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["data"]["tour"], tour_id.to_string());
    assert_eq!(body["data"]["data"]["user"], app.user.id.to_string());

    let listed = body_json(app.get_as(&uri, &app.admin).await).await;
    assert_eq!(listed["results"], 1);

    let other = format!("/api/v1/tours/{}/reviews", app.tours[1].id);
    let listed = body_json(app.get_as(&other, &app.admin).await).await;
    assert_eq!(listed["results"], 0);

    let all = body_json(app.get_as("/api/v1/reviews", &app.user).await).await;
    assert_eq!(all["results"], 1);
}

#[tokio::test]
async fn test_review_routes_require_login_and_role() {
    let app = spawn_app().await;
    let uri = format!("/api/v1/tours/{}/reviews", app.tours[0].id);

    assert_eq!(app.get(&uri).await.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send_json(
            Method::POST,
            &uri,
            Some(&app.lead_guide),
            json!({"review": "Guides cannot review", "rating": 4}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_review_on_missing_tour_is_404() {
    let app = spawn_app().await;
    let uri = format!("/api/v1/tours/{}/reviews", uuid::Uuid::new_v4());

    let response = app
        .send_json(Method::POST, &uri, Some(&app.user), json!({"review": "Ghost", "rating": 3}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "No tour found with that ID");
}

#[tokio::test]
async fn test_account_view_requires_login() {
    let app = spawn_app().await;

    assert_eq!(app.get("/me").await.status(), StatusCode::UNAUTHORIZED);

    let response = app.get_as("/me", &app.user).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("ann@natours.io"));

    let slug = &app.tours[0].slug;
    let response = app.get(&format!("/tour/{slug}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("The Forest Hiker"));
}
