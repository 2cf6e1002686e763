//! Points repository over the `users` table.

use crate::error::AppResult;
use crate::models::UserRecord;

use super::DbPool;

/// Atomic upsert: creates the user on first credit, otherwise adds to the balance.
/// Returns the new total.
pub async fn points_add(pool: &DbPool, username: &str, points: i32) -> AppResult<i32> {
    let row: (i32,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, points, updated_at)
        VALUES ($1, $2, CURRENT_TIMESTAMP)
        ON CONFLICT (username)
        DO UPDATE SET points = users.points + EXCLUDED.points, updated_at = CURRENT_TIMESTAMP
        RETURNING points
        "#,
    )
    .bind(username)
    .bind(points)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Guarded decrement. `None` when the user is unknown or holds fewer than `points`.
pub async fn points_remove(pool: &DbPool, username: &str, points: i32) -> AppResult<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET points = points - $2, updated_at = CURRENT_TIMESTAMP
        WHERE username = $1 AND points >= $2
        RETURNING points
        "#,
    )
    .bind(username)
    .bind(points)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}

pub async fn points_get(pool: &DbPool, username: &str) -> AppResult<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT points FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.0))
}

pub async fn users_list(pool: &DbPool) -> AppResult<Vec<UserRecord>> {
    let rows = sqlx::query_as::<_, UserRecord>(
        "SELECT id, username, points, updated_at, created_at FROM users ORDER BY points DESC, username ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
