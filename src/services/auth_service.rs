//! Organizations, users and sessions.
//!
//! Passwords are stored as argon2 PHC strings. Session tokens are 32 random
//! bytes, hex encoded, handed to the client once; the database only keeps
//! their SHA-256 (see [`hash_token`]).

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::validation,
    error::AppError,
    middleware::{auth::hash_token, tenant::Tenant},
    models::user::{
        CreateUserRequest, LoginRequest, MeResponse, Organization, RegisterRequest,
        SessionResponse, UpdateUserRequest, User, UserResponse, UserRole,
    },
};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AppError::InvalidRequest("password could not be processed".to_string())
        })
}

/// False for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// 64 hex characters (32 random bytes).
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

async fn create_session(
    tx: &mut Transaction<'_, Postgres>,
    user: User,
    ttl: Duration,
) -> Result<SessionResponse, AppError> {
    let token = generate_token();
    let expires_at = Utc::now() + ttl;

    sqlx::query("INSERT INTO sessions (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(&mut **tx)
        .await?;

    Ok(SessionResponse {
        token,
        expires_at,
        user: user.into(),
    })
}

/// Create an organization and its first admin, and log the admin in.
///
/// # Errors
///
/// - `InvalidRequest`: blank names, malformed slug/email, short password
/// - `Conflict`: slug or email already taken
pub async fn register(
    pool: &DbPool,
    request: RegisterRequest,
    session_ttl: Duration,
) -> Result<SessionResponse, AppError> {
    let organization_name = validation::required_name("organization_name", &request.organization_name)?;
    let slug = validation::slug(&request.organization_slug)?;
    let name = validation::required_name("name", &request.name)?;
    let email = validation::email(&request.email)?;
    validation::password(&request.password)?;
    let password_hash = hash_password(&request.password)?;

    let mut tx = pool.begin().await?;

    let organization = sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (name, slug) VALUES ($1, $2) RETURNING *",
    )
    .bind(&organization_name)
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_db(e, "organization slug is already taken", ""))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (organization_id, email, name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(organization.id)
    .bind(&email)
    .bind(&name)
    .bind(&password_hash)
    .bind(UserRole::Admin)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_db(e, "email is already registered", ""))?;

    let session = create_session(&mut tx, user, session_ttl).await?;
    tx.commit().await?;

    tracing::info!(organization_id = %organization.id, slug = %slug, "organization registered");
    Ok(session)
}

/// Exchange email and password for a session token.
///
/// Unknown email, inactive user and wrong password all return
/// `Unauthorized` so the response does not reveal which one failed.
pub async fn login(
    pool: &DbPool,
    request: LoginRequest,
    session_ttl: Duration,
) -> Result<SessionResponse, AppError> {
    let email = request.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND is_active = true")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(user) if verify_password(&request.password, &user.password_hash) => user,
        _ => {
            tracing::warn!(email = %email, "failed login attempt");
            return Err(AppError::Unauthorized);
        }
    };

    let mut tx = pool.begin().await?;
    let user_id = user.id;
    let session = create_session(&mut tx, user, session_ttl).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user_id, "user logged in");
    Ok(session)
}

pub async fn logout(pool: &DbPool, session_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn me(pool: &DbPool, tenant: &Tenant) -> Result<MeResponse, AppError> {
    let user = find_user(pool, tenant, tenant.user_id).await?;
    let organization = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
        .bind(tenant.organization_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Organization"))?;

    Ok(MeResponse {
        user: user.into(),
        organization,
    })
}

async fn find_user(pool: &DbPool, tenant: &Tenant, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND organization_id = $2")
        .bind(user_id)
        .bind(tenant.organization_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User"))
}

pub async fn list_users(pool: &DbPool, tenant: &Tenant) -> Result<Vec<UserResponse>, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE organization_id = $1 ORDER BY name",
    )
    .bind(tenant.organization_id)
    .fetch_all(pool)
    .await?;

    Ok(users.into_iter().map(UserResponse::from).collect())
}

/// Add a user to the caller's organization. Admin only.
pub async fn create_user(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateUserRequest,
) -> Result<UserResponse, AppError> {
    tenant.require_admin()?;

    let name = validation::required_name("name", &request.name)?;
    let email = validation::email(&request.email)?;
    validation::password(&request.password)?;
    let password_hash = hash_password(&request.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (organization_id, email, name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(tenant.organization_id)
    .bind(&email)
    .bind(&name)
    .bind(&password_hash)
    .bind(request.role)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, "email is already registered", ""))?;

    tracing::info!(organization_id = %tenant.organization_id, user_id = %user.id, role = ?user.role, "user created");
    Ok(user.into())
}

/// Change name, role or active flag. Admin only.
///
/// Deactivating a user also ends their sessions. Admins cannot deactivate
/// or demote themselves, which keeps at least one admin in place.
pub async fn update_user(
    pool: &DbPool,
    tenant: &Tenant,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> Result<UserResponse, AppError> {
    tenant.require_admin()?;

    if user_id == tenant.user_id {
        if request.is_active == Some(false) {
            return Err(AppError::InvalidRequest(
                "you cannot deactivate your own user".to_string(),
            ));
        }
        if request.role.is_some_and(|r| r != UserRole::Admin) {
            return Err(AppError::InvalidRequest(
                "you cannot remove your own admin role".to_string(),
            ));
        }
    }

    let current = find_user(pool, tenant, user_id).await?;
    let name = match request.name {
        Some(name) => validation::required_name("name", &name)?,
        None => current.name,
    };
    let role = request.role.unwrap_or(current.role);
    let is_active = request.is_active.unwrap_or(current.is_active);

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = $1, role = $2, is_active = $3, updated_at = NOW()
        WHERE id = $4 AND organization_id = $5
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(role)
    .bind(is_active)
    .bind(user_id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await?;

    if !is_active {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(organization_id = %tenant.organization_id, user_id = %user_id, "user updated");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_tokens_are_random_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
