//! HTTP application wiring.
//!
//! - `state.rs`: shared state and the per-request session service factory
//! - `routes/`: handlers, one file per area
//! - `errors.rs`: JSON error responses

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};
use tower::ServiceBuilder;

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod state;

pub use state::{AppState, CookieSettings};

/// Build the full HTTP router (public entrypoint used by `main.rs` and the black-box tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_router())
        .merge(routes::pages::router())
        .fallback(routes::system::not_found)
        // Outermost first: security headers also cover guard redirects.
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::security_headers))
                .layer(from_fn_with_state(state.clone(), middleware::route_guard)),
        )
        .with_state(state)
}
