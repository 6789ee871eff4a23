//! Shared application state.

use crate::{
    config::ServerConfig,
    middleware::{auth::AuthLayer, InMemoryStore, TokenIssuer},
    models::{Review, Tour, User},
    repository::{InMemoryRepository, Repository},
    views::{HtmlRenderer, ViewRenderer},
};
use std::{sync::Arc, time::Duration};

/// Collaborators every handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tours: Arc<dyn Repository<Tour>>,
    pub users: Arc<dyn Repository<User>>,
    pub reviews: Arc<dyn Repository<Review>>,
    pub tokens: Arc<TokenIssuer>,
    pub views: Arc<dyn ViewRenderer>,
    pub rate_limits: Arc<InMemoryStore>,
}

impl AppState {
    /// State backed by empty in-memory repositories.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_repositories(
            config,
            Arc::new(InMemoryRepository::<Tour>::new()),
            Arc::new(InMemoryRepository::<User>::new()),
            Arc::new(InMemoryRepository::<Review>::new()),
        )
    }

    pub fn with_repositories(
        config: ServerConfig,
        tours: Arc<dyn Repository<Tour>>,
        users: Arc<dyn Repository<User>>,
        reviews: Arc<dyn Repository<Review>>,
    ) -> Self {
        let tokens = TokenIssuer::new(
            &config.auth.jwt_secret,
            Duration::from_secs(config.auth.jwt_expires_in_secs),
        );

        Self {
            config: Arc::new(config),
            tours,
            users,
            reviews,
            tokens: Arc::new(tokens),
            views: Arc::new(HtmlRenderer),
            rate_limits: Arc::new(InMemoryStore::new()),
        }
    }

    pub fn with_views(mut self, views: Arc<dyn ViewRenderer>) -> Self {
        self.views = views;
        self
    }

    /// Authentication gate bound to this state's token issuer and users.
    pub fn auth_layer(&self) -> AuthLayer {
        AuthLayer::new(self.tokens.clone(), self.users.clone())
    }
}
