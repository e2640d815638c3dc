//! Admin bearer-token authentication.
//!
//! The admin surface (retry, pool status, restock) is protected by a single
//! shared bearer token from configuration. There are no admin sessions; the
//! token travels on every request.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Middleware that rejects requests without a valid admin bearer token.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the `Authorization` header is missing,
/// malformed, or carries the wrong token.
pub async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_owned()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("expected bearer token".to_owned()))?;

    if !constant_time_eq(token.as_bytes(), state.config().admin_token.expose_secret().as_bytes()) {
        return Err(AppError::Unauthorized("invalid admin token".to_owned()));
    }

    Ok(next.run(request).await)
}

/// Compare two byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"same-token", b"same-token"));
        assert!(!constant_time_eq(b"same-token", b"diff-token"));
        assert!(!constant_time_eq(b"short", b"longer-token"));
        assert!(constant_time_eq(b"", b""));
    }
}
