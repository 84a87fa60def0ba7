//! Shared application state handed to every handler.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    clients::{mercadopago::MercadoPagoClient, storage::FileStorage},
    config::Config,
    db::DbPool,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub mercadopago: MercadoPagoClient,
    /// `None` when no bucket is configured.
    pub storage: Option<FileStorage>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: Config,
        mercadopago: MercadoPagoClient,
        storage: Option<FileStorage>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            mercadopago,
            storage,
        }
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
