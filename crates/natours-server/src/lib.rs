//! Natours API server
//!
//! HTTP server for the Natours tour-booking API. Every request passes an
//! admission pipeline of tower layers before reaching its handler:
//!
//! - **Security headers**: CSP and hardening headers on every response
//! - **Rate limiting**: fixed window per client IP on `/api`
//! - **Sanitization**: body size cap, operator-key stripping, markup escaping
//! - **Parameter guard**: repeated query keys collapse unless allow-listed
//! - **Authentication / authorization**: per-route gates
//! - **Error boundary**: uniform error bodies, detailed in development

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod request;
pub mod response;
pub mod routes;
pub mod state;
pub mod views;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use anyhow::Context;
use axum::Router;
use middleware::RateLimitStore;
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Server builder for constructing and running the API server.
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server backed by in-memory repositories.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let state = AppState::new(config.clone());
        Ok(Self { config, state })
    }

    /// Create a server around prepared state.
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.as_ref().clone(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> anyhow::Result<Router> {
        routes::create_router(self.state.clone())
    }

    /// Run the server until Ctrl-C or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self
            .config
            .server
            .socket_addr()
            .context("invalid bind address")?;
        let router = self.router()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        self.spawn_rate_limit_sweeper();

        info!(
            %addr,
            environment = ?self.config.server.environment,
            "Server listening"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }

    /// Drop elapsed rate-limit windows so idle clients do not accumulate.
    fn spawn_rate_limit_sweeper(&self) {
        if !self.config.rate_limit.enabled {
            return;
        }

        let store = self.state.rate_limits.clone();
        let window = Duration::from_secs(self.config.rate_limit.window_secs);
        let every = Duration::from_secs(self.config.rate_limit.sweep_interval_secs.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired(window).await;
                if purged > 0 {
                    debug!(purged, "Expired rate limit windows removed");
                }
            }
        });
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
