//! Points ledger: the only owner of per-user balances.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{RemovalOutcome, UserRecord};

/// Balance store shared by the REST handlers and the stream loop.
///
/// Implementations must make each call atomic per user; callers hold no locks.
#[async_trait]
pub trait PointsLedger: Send + Sync {
    /// Credit `points` to `username`, creating the entry if needed. Returns the new total.
    async fn add_points(&self, username: &str, points: i32) -> AppResult<i32>;

    /// Debit `points`, refusing (not erroring) when the balance is too small.
    async fn remove_points(&self, username: &str, points: i32) -> AppResult<RemovalOutcome>;

    async fn get_points(&self, username: &str) -> AppResult<i32>;

    async fn all_users(&self) -> AppResult<Vec<UserRecord>>;
}

/// Postgres-backed ledger.
#[derive(Clone)]
pub struct PgPointsLedger {
    pool: DbPool,
}

impl PgPointsLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PointsLedger for PgPointsLedger {
    #[instrument(skip(self))]
    async fn add_points(&self, username: &str, points: i32) -> AppResult<i32> {
        let total = db::points_add(&self.pool, username, points).await?;
        debug!(username = %username, points, total, "points added");
        Ok(total)
    }

    #[instrument(skip(self))]
    async fn remove_points(&self, username: &str, points: i32) -> AppResult<RemovalOutcome> {
        let outcome = match db::points_remove(&self.pool, username, points).await? {
            Some(new_total) => RemovalOutcome::Removed { new_total },
            None => RemovalOutcome::Insufficient,
        };
        debug!(username = %username, points, ?outcome, "points removal");
        Ok(outcome)
    }

    async fn get_points(&self, username: &str) -> AppResult<i32> {
        db::points_get(&self.pool, username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no points recorded for {}", username)))
    }

    async fn all_users(&self) -> AppResult<Vec<UserRecord>> {
        db::users_list(&self.pool).await
    }
}
