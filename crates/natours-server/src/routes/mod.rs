//! Route configuration for the Natours server.
//!
//! Global stages are applied with one `Router::layer` call each, so every
//! stage wraps the full route table including the fallback. Requests pass
//! them outermost first: security headers, error boundary, panic catcher,
//! request timeout, request logger, rate limiter, body sanitizer, parameter
//! guard, request clock. A verb a known path does not serve is answered as
//! an unknown route.

mod v1;
mod views;

use crate::{
    error::{panic_response, ErrorBoundaryLayer},
    handlers,
    middleware::{
        LoggingLayer, ParamGuardLayer, RateLimitLayer, RateLimitPolicy, RequestTimeLayer,
        SanitizeLayer, SecurityHeaders, SecurityHeadersLayer,
    },
    state::AppState,
};
use anyhow::Context;
use axum::{error_handling::HandleErrorLayer, middleware::from_fn, Router};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use v1::{reviews_router, tours_router, users_router};

/// Create the main application router.
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let config = state.config.clone();
    let security = SecurityHeaders::from_config(&config.security)
        .context("invalid security header configuration")?;

    let mut router = Router::new()
        .nest("/api/v1", v1::router(&state))
        .merge(views::router(&state))
        .fallback(handlers::fallback)
        .with_state(state.clone())
        .layer(from_fn(handlers::unmatched_method))
        .layer(RequestTimeLayer)
        .layer(ParamGuardLayer::new(config.params.whitelist.clone()))
        .layer(SanitizeLayer::new(config.body.limit_bytes));

    if config.rate_limit.enabled {
        router = router.layer(
            RateLimitLayer::new(RateLimitPolicy::from_config(&config.rate_limit))
                .with_store(state.rate_limits.clone()),
        );
    }

    let common_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id());

    let request_timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handlers::timeout_error))
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    Ok(router
        .layer(
            LoggingLayer::new(config.server.environment.is_development())
                .exclude(config.logging.exclude_paths.clone()),
        )
        .layer(request_timeout)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(ErrorBoundaryLayer::new(config.server.environment))
        .layer(SecurityHeadersLayer::new(security))
        .layer(common_middleware))
}
