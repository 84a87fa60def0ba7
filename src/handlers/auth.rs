//! Registration, sessions and user management.
//!
//! - POST /api/v1/auth/register - Create an organization and its first admin
//! - POST /api/v1/auth/login - Exchange credentials for a session token
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/me - Current user and organization
//! - GET/POST /api/v1/users, PATCH /api/v1/users/{id} - Manage users

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Duration;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::{auth::AuthContext, tenant::Tenant},
    models::user::{
        CreateUserRequest, LoginRequest, MeResponse, RegisterRequest, SessionResponse,
        UpdateUserRequest, UserResponse,
    },
    services::auth_service,
    state::AppState,
};

fn session_ttl(state: &AppState) -> Duration {
    Duration::hours(state.config.session_ttl_hours)
}

/// Create an organization together with its first ADMIN user.
///
/// Body: [`RegisterRequest`].
///
/// # Response
///
/// - **201 Created**: session token for the new admin
/// - **409 Conflict**: slug or email already taken
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = auth_service::register(&state.pool, request, session_ttl(&state)).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Unknown emails and wrong passwords both answer 401.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = auth_service::login(&state.pool, request, session_ttl(&state)).await?;
    Ok(Json(session))
}

pub async fn logout(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&pool, auth.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(pool): State<DbPool>, tenant: Tenant) -> Result<Json<MeResponse>, AppError> {
    Ok(Json(auth_service::me(&pool, &tenant).await?))
}

pub async fn list_users(
    State(pool): State<DbPool>,
    tenant: Tenant,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    Ok(Json(auth_service::list_users(&pool, &tenant).await?))
}

/// ADMIN only.
pub async fn create_user(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = auth_service::create_user(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Change a user's name, role or active flag. ADMIN only; admins cannot
/// deactivate or demote themselves.
pub async fn update_user(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(auth_service::update_user(&pool, &tenant, id, request).await?))
}
