//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and complex operations.
//! Every tenant-facing function takes the caller's [`Tenant`] and scopes
//! its queries with `tenant.organization_id`.
//!
//! [`Tenant`]: crate::middleware::tenant::Tenant

pub mod auth_service;
pub mod branch_service;
pub mod catalog_service;
pub mod current_account_service;
pub mod mercadopago_service;
pub mod motorcycle_service;
pub mod notification_service;
pub mod ordering;
pub mod party_service;
pub mod petty_cash_service;
pub mod report_service;
pub mod sale_service;
