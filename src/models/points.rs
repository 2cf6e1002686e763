//! Points ledger records and REST request/response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One row of the points ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub points: i32,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Result of a guarded decrement. The ledger never goes below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed { new_total: i32 },
    Insufficient,
}

/// Body of `POST /points/add` and `POST /points/remove`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PointsChangeRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(range(min = 1))]
    pub points: i32,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub points: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPointsResponse {
    pub new_amount: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePointsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_amount: Option<i32>,
}

impl From<RemovalOutcome> for RemovePointsResponse {
    fn from(outcome: RemovalOutcome) -> Self {
        match outcome {
            RemovalOutcome::Removed { new_total } => Self {
                success: true,
                new_amount: Some(new_total),
            },
            RemovalOutcome::Insufficient => Self {
                success: false,
                new_amount: None,
            },
        }
    }
}
