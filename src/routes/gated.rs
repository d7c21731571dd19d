use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Gated Router Module
///
/// Every handler here receives a `BearerClaims` extractor, so a request
/// without a valid token is rejected with 401 before the handler body runs.
/// The handler then applies its own permission requirement (403 on a valid
/// token lacking the permission):
///
/// - GET  /drinks-detail  requires `get:drinks-detail`
/// - POST /drinks         requires `post:drinks`
/// - PATCH /drinks/{id}   requires `post:drinks` (shared with create)
/// - DELETE /drinks/{id}  requires `delete:drinks`
pub fn gated_routes() -> Router<AppState> {
    Router::new()
        // GET /drinks-detail
        // The full menu with ingredient names, for staff-facing clients.
        .route("/drinks-detail", get(handlers::get_drinks_detail))
        // POST /drinks
        // Creates a new drink. Duplicate titles are rejected with 409.
        .route("/drinks", post(handlers::create_drink))
        // PATCH/DELETE /drinks/{id}
        // Partial update and removal of a single drink; both 404 when the id
        // is absent.
        .route(
            "/drinks/{id}",
            axum::routing::patch(handlers::update_drink).delete(handlers::delete_drink),
        )
}
