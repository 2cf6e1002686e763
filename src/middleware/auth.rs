//! Static API-key guard for the points routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::AppError;
use crate::handlers::http::AppState;

pub const HEADER_API_KEY: &str = "api-key";

/// Middleware: require the `api-key` header to equal the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = request
        .headers()
        .get(HEADER_API_KEY)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if key.is_empty() || !keys_match(key.as_bytes(), state.api_key.as_bytes()) {
        debug!(path = %request.uri().path(), "rejected request: invalid or missing api-key");
        return Err(AppError::Auth("invalid or missing api-key".to_string()));
    }

    Ok(next.run(request).await)
}

/// Byte comparison whose timing does not depend on where the keys differ.
fn keys_match(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_only_on_identical_bytes() {
        assert!(keys_match(b"secret", b"secret"));
        assert!(!keys_match(b"secret", b"secreT"));
        assert!(!keys_match(b"secret", b"secret-longer"));
        assert!(!keys_match(b"", b"secret"));
    }
}
