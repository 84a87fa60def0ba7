//! HTTP middleware components.

/// Session authentication middleware
pub mod auth;
/// Tenant extractor built from the authenticated session
pub mod tenant;
