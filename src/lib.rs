//! Multi-tenant back office for motorcycle dealerships.
//!
//! Inventory, sales with installment financing, petty cash, suppliers and
//! reports, plus MercadoPago collections and S3 file storage. Every
//! business query is scoped by the organization of the authenticated user.

pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod reports;
pub mod routes;
pub mod services;
pub mod state;
