use axum::{Router, routing::get};

use crate::app::AppState;

pub mod auth;
pub mod pages;
pub mod system;

/// JSON endpoints under `/api`; the route guard does not apply to them.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .nest("/auth", auth::router())
}
