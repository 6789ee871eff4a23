//! API v1 routes.

use crate::{
    handlers::{auth, reviews, tours, users},
    middleware::{AuthLayer, AuthzLayer},
    models::Role,
    state::AppState,
};
use axum::{
    middleware::map_request,
    routing::{delete, get, patch, post},
    Router,
};
use tower::layer::util::Stack;

/// Authentication followed by a role check.
type Gate = Stack<AuthzLayer, AuthLayer>;

fn gate(state: &AppState, roles: &[Role]) -> Gate {
    Stack::new(AuthzLayer::restrict_to(roles), state.auth_layer())
}

pub fn tours_router(state: &AppState) -> Router<AppState> {
    let staff = gate(state, &[Role::Admin, Role::LeadGuide]);

    Router::new()
        .route(
            "/top-5-cheap",
            get(tours::list_tours).route_layer(map_request(tours::alias_top_tours)),
        )
        .route(
            "/",
            get(tours::list_tours).merge(post(tours::create_tour).route_layer(staff.clone())),
        )
        .route(
            "/:tourId",
            get(tours::get_tour).merge(
                patch(tours::update_tour)
                    .delete(tours::delete_tour)
                    .route_layer(staff),
            ),
        )
        .nest("/:tourId/reviews", reviews_router(state))
}

/// Every review route requires a login. Mounted standalone and per tour.
pub fn reviews_router(state: &AppState) -> Router<AppState> {
    let authors = AuthzLayer::restrict_to(&[Role::User]);
    let owners = AuthzLayer::restrict_to(&[Role::User, Role::Admin]);

    Router::new()
        .route(
            "/",
            get(reviews::list_reviews).merge(post(reviews::create_review).route_layer(authors)),
        )
        .route(
            "/:id",
            get(reviews::get_review).merge(
                patch(reviews::update_review)
                    .delete(reviews::delete_review)
                    .route_layer(owners),
            ),
        )
        .route_layer(state.auth_layer())
}

pub fn users_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout));

    let admin = AuthzLayer::restrict_to(&[Role::Admin]);
    let protected = Router::new()
        .route("/updateMyPassword", patch(auth::update_password))
        .route("/me", get(users::get_me))
        .route("/updateMe", patch(users::update_me))
        .route("/deleteMe", delete(users::delete_me))
        .route(
            "/",
            get(users::list_users)
                .post(users::create_user)
                .route_layer(admin.clone()),
        )
        .route(
            "/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user)
                .route_layer(admin),
        )
        .route_layer(state.auth_layer());

    public.merge(protected)
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/tours", tours_router(state))
        .nest("/users", users_router(state))
        .nest("/reviews", reviews_router(state))
}
