//! Kick chat loyalty points.
//!
//! Ingests the live chat stream, credits viewers per message (subscribers and
//! everyone else at separately configured rates), and exposes a small REST API
//! over the points ledger.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod stream;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::ledger::{PgPointsLedger, PointsLedger};

use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router (points, health). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static(middleware::HEADER_API_KEY),
        ]);

    axum::Router::new()
        .route("/points", get(handlers::list_points))
        .route("/points/add", post(handlers::add_points))
        .route("/points/remove", post(handlers::remove_points))
        .route("/points/:username", get(handlers::get_points))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
