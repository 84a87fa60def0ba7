//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Extracts the caller's [`Tenant`](crate::middleware::tenant::Tenant)
//!    and the request data (JSON body, path, query string)
//! 2. Calls the matching service function
//! 3. Returns the HTTP response (JSON, status code)
//!
//! Handlers never read an organization id from the request itself.

pub mod auth;
pub mod branches;
pub mod catalog;
pub mod current_accounts;
pub mod files;
pub mod health;
pub mod mercadopago;
pub mod motorcycles;
pub mod parties;
pub mod petty_cash;
pub mod reports;
pub mod sales;
pub mod webhooks;
