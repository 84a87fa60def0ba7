//! Tenant extractor.
//!
//! Handlers never take an organization id from the request body or path.
//! They extract a `Tenant`, which only exists when the auth middleware has
//! run, and pass it to the services. Services scope every query with
//! `tenant.organization_id`.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::AuthContext, models::user::UserRole};

#[derive(Debug, Clone)]
pub struct Tenant {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Tenant {
    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(&[UserRole::Admin])
    }

    /// Admins and managers.
    pub fn require_manager(&self) -> Result<(), AppError> {
        self.require_role(&[UserRole::Admin, UserRole::Manager])
    }
}

impl From<&AuthContext> for Tenant {
    fn from(auth: &AuthContext) -> Self {
        Self {
            organization_id: auth.organization_id,
            user_id: auth.user_id,
            role: auth.role,
        }
    }
}

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .map(Tenant::from)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(role: UserRole) -> Tenant {
        Tenant {
            organization_id: Uuid::nil(),
            user_id: Uuid::nil(),
            role,
        }
    }

    #[test]
    fn test_role_checks() {
        assert!(tenant(UserRole::Admin).require_admin().is_ok());
        assert!(matches!(
            tenant(UserRole::Seller).require_admin(),
            Err(AppError::Forbidden)
        ));
        assert!(tenant(UserRole::Manager).require_manager().is_ok());
        assert!(tenant(UserRole::Cashier).require_manager().is_err());
    }

    #[tokio::test]
    async fn test_missing_context_is_unauthorized() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let result = Tenant::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_context_is_extracted() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let org = Uuid::new_v4();
        parts.extensions.insert(AuthContext {
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            organization_id: org,
            role: UserRole::Seller,
            email: "seller@example.com".into(),
        });
        let tenant = Tenant::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(tenant.organization_id, org);
        assert_eq!(tenant.role, UserRole::Seller);
    }
}
