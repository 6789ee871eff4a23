//! Shared fixtures for the integration tests: a fully layered router over
//! seeded in-memory repositories.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, Response},
    Router,
};
use chrono::{Duration, Utc};
use natours_server::{
    config::{Environment, ServerConfig},
    middleware::auth::hash_password,
    models::{Difficulty, Review, Role, Tour, User},
    repository::InMemoryRepository,
    routes::create_router,
    AppState,
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "test1234";
pub const SECRET: &str = "integration-test-secret-of-at-least-32-chars";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub admin: User,
    pub lead_guide: User,
    pub user: User,
    pub tours: Vec<Tour>,
}

pub fn test_config() -> ServerConfig {
    ServerConfig::with_secret(SECRET)
}

pub fn tour(name: &str, price: f64, ratings_average: f64, age_days: i64) -> Tour {
    Tour {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: natours_server::models::slugify(name),
        duration: 5,
        max_group_size: 10,
        difficulty: Difficulty::Easy,
        ratings_average,
        ratings_quantity: 3,
        price,
        summary: Some(format!("{name} summary")),
        created_at: Utc::now() - Duration::days(age_days),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: ServerConfig) -> TestApp {
    let hash = hash_password(PASSWORD.to_string()).await.unwrap();
    let admin = User::new("Admin", "admin@natours.io", Role::Admin, hash.clone());
    let lead_guide = User::new("Lead", "lead@natours.io", Role::LeadGuide, hash.clone());
    let user = User::new("Ann", "ann@natours.io", Role::User, hash);

    let tours = vec![
        tour("The Forest Hiker", 397.0, 4.7, 1),
        tour("The Sea Explorer", 100.0, 4.8, 2),
        tour("The Snow Adventurer", 200.0, 4.5, 3),
        tour("The City Wanderer", 1197.0, 4.6, 4),
        tour("The Park Camper", 1497.0, 4.9, 5),
        tour("The Sports Lover", 2997.0, 4.3, 6),
        tour("The Wine Taster", 100.0, 4.4, 7),
    ];

    let state = AppState::with_repositories(
        config,
        Arc::new(InMemoryRepository::with_records(tours.clone())),
        Arc::new(InMemoryRepository::with_records(vec![
            admin.clone(),
            lead_guide.clone(),
            user.clone(),
        ])),
        Arc::new(InMemoryRepository::<Review>::new()),
    );
    let router = create_router(state.clone()).unwrap();

    TestApp {
        router,
        state,
        admin,
        lead_guide,
        user,
        tours,
    }
}

impl TestApp {
    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.issue(user.id).unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(request(Method::GET, uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_as(&self, uri: &str, user: &User) -> Response<Body> {
        let req = request(Method::GET, uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user)))
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Value,
    ) -> Response<Body> {
        let mut builder = request(method, uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user)));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }
}

/// Request builder from a fixed client address.
pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    request_from(method, uri, [10, 0, 0, 1])
}

pub fn request_from(method: Method, uri: &str, ip: [u8; 4]) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from((ip, 51000))))
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn production_config() -> ServerConfig {
    let mut config = test_config();
    config.server.environment = Environment::Production;
    config
}
