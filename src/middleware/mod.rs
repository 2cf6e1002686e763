//! Middleware: API-key auth for the points REST routes.

pub mod auth;

pub use auth::{require_api_key, HEADER_API_KEY};
