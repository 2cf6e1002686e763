//! HTTP handlers: points read/adjust and health.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    AddPointsResponse, PointsChangeRequest, PointsResponse, RemovePointsResponse, UsersResponse,
};
use crate::services::PointsLedger;

/// Shared application state for the REST surface.
#[derive(Clone)]
pub struct AppState {
    pub api_key: String,
    pub ledger: Arc<dyn PointsLedger>,
}

impl AppState {
    pub fn new(api_key: impl Into<String>, ledger: Arc<dyn PointsLedger>) -> Self {
        Self {
            api_key: api_key.into(),
            ledger,
        }
    }

    pub fn ledger(&self) -> &dyn PointsLedger {
        self.ledger.as_ref()
    }
}

/// GET /points — every user with a balance.
pub async fn list_points(State(state): State<AppState>) -> Result<Json<UsersResponse>, AppError> {
    let users = state.ledger().all_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// GET /points/:username
pub async fn get_points(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PointsResponse>, AppError> {
    let points = state.ledger().get_points(&username).await?;
    Ok(Json(PointsResponse { points }))
}

/// POST /points/add
pub async fn add_points(
    State(state): State<AppState>,
    body: Result<Json<PointsChangeRequest>, JsonRejection>,
) -> Result<Json<AddPointsResponse>, AppError> {
    let Json(body) = body?;
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let new_amount = state.ledger().add_points(&body.username, body.points).await?;
    info!(username = %body.username, points = body.points, new_amount, "points added via api");
    Ok(Json(AddPointsResponse { new_amount }))
}

/// POST /points/remove — `success: false` when the balance is too small.
pub async fn remove_points(
    State(state): State<AppState>,
    body: Result<Json<PointsChangeRequest>, JsonRejection>,
) -> Result<Json<RemovePointsResponse>, AppError> {
    let Json(body) = body?;
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let outcome = state
        .ledger()
        .remove_points(&body.username, body.points)
        .await?;
    info!(username = %body.username, points = body.points, ?outcome, "points removal via api");
    Ok(Json(outcome.into()))
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "kick-points" })),
    )
}
