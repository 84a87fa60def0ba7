//! HTTP router.
//!
//! Public routes: health, registration, login and the MercadoPago webhook.
//! Everything else runs behind the session middleware.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, middleware::auth::auth_middleware, state::AppState};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let authenticated_routes = Router::new()
        // Session and users
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/me", get(handlers::auth::me))
        .route(
            "/api/v1/users",
            get(handlers::auth::list_users).post(handlers::auth::create_user),
        )
        .route("/api/v1/users/{id}", patch(handlers::auth::update_user))
        // Branches
        .route(
            "/api/v1/branches",
            get(handlers::branches::list_branches).post(handlers::branches::create_branch),
        )
        .route("/api/v1/branches/order", put(handlers::branches::reorder_branches))
        .route(
            "/api/v1/branches/{id}",
            get(handlers::branches::get_branch)
                .patch(handlers::branches::update_branch)
                .delete(handlers::branches::delete_branch),
        )
        // Catalog
        .route(
            "/api/v1/brands",
            get(handlers::catalog::list_brands).post(handlers::catalog::create_brand),
        )
        .route("/api/v1/brands/order", put(handlers::catalog::reorder_brands))
        .route(
            "/api/v1/brands/{id}",
            get(handlers::catalog::get_brand)
                .patch(handlers::catalog::update_brand)
                .delete(handlers::catalog::delete_brand),
        )
        .route(
            "/api/v1/brands/{id}/models",
            get(handlers::catalog::list_models).post(handlers::catalog::create_model),
        )
        .route(
            "/api/v1/models/{id}",
            get(handlers::catalog::get_model)
                .patch(handlers::catalog::update_model)
                .delete(handlers::catalog::delete_model),
        )
        // Inventory
        .route(
            "/api/v1/motorcycles",
            get(handlers::motorcycles::list_motorcycles)
                .post(handlers::motorcycles::create_motorcycle),
        )
        .route("/api/v1/motorcycles/batch", post(handlers::motorcycles::create_batch))
        .route(
            "/api/v1/motorcycles/{id}",
            get(handlers::motorcycles::get_motorcycle)
                .patch(handlers::motorcycles::update_motorcycle)
                .delete(handlers::motorcycles::delete_motorcycle),
        )
        .route("/api/v1/motorcycles/{id}/state", post(handlers::motorcycles::change_state))
        .route(
            "/api/v1/motorcycles/{id}/reservation",
            post(handlers::motorcycles::reserve).delete(handlers::motorcycles::cancel_reservation),
        )
        .route("/api/v1/motorcycles/{id}/transfer", post(handlers::motorcycles::transfer))
        // Clients and suppliers
        .route(
            "/api/v1/clients",
            get(handlers::parties::list_clients).post(handlers::parties::create_client),
        )
        .route(
            "/api/v1/clients/{id}",
            get(handlers::parties::get_client)
                .patch(handlers::parties::update_client)
                .delete(handlers::parties::delete_client),
        )
        .route(
            "/api/v1/suppliers",
            get(handlers::parties::list_suppliers).post(handlers::parties::create_supplier),
        )
        .route(
            "/api/v1/suppliers/{id}",
            get(handlers::parties::get_supplier)
                .patch(handlers::parties::update_supplier)
                .delete(handlers::parties::delete_supplier),
        )
        // Sales and financing
        .route(
            "/api/v1/sales",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route(
            "/api/v1/current-accounts",
            get(handlers::current_accounts::list_accounts)
                .post(handlers::current_accounts::create_account),
        )
        .route(
            "/api/v1/current-accounts/preview",
            post(handlers::current_accounts::preview_schedule),
        )
        .route(
            "/api/v1/current-accounts/{id}",
            get(handlers::current_accounts::get_account),
        )
        .route(
            "/api/v1/current-accounts/{id}/payments",
            post(handlers::current_accounts::register_payment),
        )
        .route(
            "/api/v1/current-accounts/{id}/payments/{payment_id}/annul",
            post(handlers::current_accounts::annul_payment),
        )
        .route(
            "/api/v1/current-accounts/{id}/cancel",
            post(handlers::current_accounts::cancel_account),
        )
        // Petty cash
        .route(
            "/api/v1/petty-cash/deposits",
            get(handlers::petty_cash::list_deposits).post(handlers::petty_cash::create_deposit),
        )
        .route("/api/v1/petty-cash/deposits/{id}", get(handlers::petty_cash::get_deposit))
        .route(
            "/api/v1/petty-cash/deposits/{id}/close",
            post(handlers::petty_cash::close_deposit),
        )
        .route(
            "/api/v1/petty-cash/deposits/{id}/withdrawals",
            post(handlers::petty_cash::create_withdrawal),
        )
        .route(
            "/api/v1/petty-cash/withdrawals/{id}/spends",
            post(handlers::petty_cash::create_spend),
        )
        .route("/api/v1/petty-cash/spends/{id}", delete(handlers::petty_cash::delete_spend))
        .route("/api/v1/petty-cash/balance", get(handlers::petty_cash::balances))
        // Reports
        .route("/api/v1/reports/inventory", get(handlers::reports::inventory))
        .route("/api/v1/reports/sales", get(handlers::reports::sales))
        .route(
            "/api/v1/reports/current-accounts",
            get(handlers::reports::current_accounts),
        )
        .route("/api/v1/reports/petty-cash", get(handlers::reports::petty_cash))
        // MercadoPago
        .route("/api/v1/mercadopago/oauth/url", get(handlers::mercadopago::oauth_url))
        .route(
            "/api/v1/mercadopago/oauth/callback",
            post(handlers::mercadopago::oauth_callback),
        )
        .route(
            "/api/v1/mercadopago/oauth",
            get(handlers::mercadopago::oauth_status).delete(handlers::mercadopago::disconnect),
        )
        .route(
            "/api/v1/mercadopago/preferences",
            post(handlers::mercadopago::create_preference),
        )
        .route(
            "/api/v1/mercadopago/point/devices",
            get(handlers::mercadopago::list_devices),
        )
        .route(
            "/api/v1/mercadopago/point/devices/{device_id}/intents",
            post(handlers::mercadopago::create_intent),
        )
        .route(
            "/api/v1/mercadopago/point/devices/{device_id}/intents/{intent_id}",
            delete(handlers::mercadopago::cancel_intent),
        )
        .route(
            "/api/v1/mercadopago/point/intents/{intent_id}",
            get(handlers::mercadopago::get_intent),
        )
        // Files
        .route(
            "/api/v1/files",
            post(handlers::files::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/files/url", get(handlers::files::download_url))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route(
            "/api/v1/webhooks/mercadopago",
            post(handlers::webhooks::mercadopago_notification),
        )
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
