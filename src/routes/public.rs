use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that are **unauthenticated** and accessible to any client. The
/// menu listing here only ever exposes the short drink representation;
/// ingredient names are reserved for the gated detail route.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /drinks
        // The public menu: all drinks in their short representation.
        .route("/drinks", get(handlers::get_drinks))
}
