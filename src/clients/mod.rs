//! Clients for external services.

pub mod mercadopago;
pub mod storage;
