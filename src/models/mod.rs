//! Data models representing database entities and API bodies.

pub mod branch;
pub mod catalog;
pub mod common;
pub mod current_account;
pub mod file;
pub mod mercadopago;
pub mod motorcycle;
pub mod party;
pub mod petty_cash;
pub mod report;
pub mod sale;
pub mod user;
