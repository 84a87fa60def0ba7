//! Session authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the session token from the Authorization header
//! 2. Hash it and look up a live session for an active user
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use crate::{
    error::AppError,
    models::user::{SessionUser, UserRole},
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map. Handlers read it through the
/// [`Tenant`](crate::middleware::tenant::Tenant) extractor.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session_id: Uuid,
    pub user_id: Uuid,
    /// Organization the user belongs to. Every business query is scoped by it.
    pub organization_id: Uuid,
    pub role: UserRole,
    pub email: String,
}

impl From<SessionUser> for AuthContext {
    fn from(row: SessionUser) -> Self {
        Self {
            session_id: row.session_id,
            user_id: row.user_id,
            organization_id: row.organization_id,
            role: row.role,
            email: row.email,
        }
    }
}

/// SHA-256 of a session token, hex encoded. Only this is stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(value: Option<&str>) -> Result<&str, AppError> {
    value
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}

/// Session authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the token using SHA-256
/// 3. Join `sessions` and `users` on the hash, requiring an unexpired
///    session and an active user
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header)?;
    let token_hash = hash_token(token);

    let session = sqlx::query_as::<_, SessionUser>(
        r#"
        SELECT s.id AS session_id, u.id AS user_id, u.organization_id, u.role, u.email
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1
          AND s.expires_at > NOW()
          AND u.is_active = true
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    tracing::debug!(user_id = %session.user_id, "session authenticated");

    request.extensions_mut().insert(AuthContext::from(session));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc123")).unwrap(), "abc123");
        assert!(bearer_token(Some("Basic abc123")).is_err());
        assert!(bearer_token(Some("Bearer ")).is_err());
        assert!(bearer_token(None).is_err());
    }

    #[test]
    fn test_hash_token_is_sha256_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
