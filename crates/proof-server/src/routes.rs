//! API route definitions for registration, proving and voting.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::SharedState;

/// Create API routes
pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Voter identity and registration
        .route("/api/identity/generate", post(handlers::generate_identity))
        .route("/api/voters", post(handlers::add_voter))
        // Accumulator queries
        .route("/api/tree", get(handlers::tree_info))
        .route("/api/tree/path/:index", get(handlers::tree_path))
        // Proving and voting
        .route("/api/prove/vote", post(handlers::prove_vote))
        .route("/api/vote", post(handlers::vote))
        .route("/api/proposals", get(handlers::proposals))
}

/// Full application: routes, CORS and request tracing
pub fn app(state: SharedState) -> Router {
    Router::new()
        .merge(api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
