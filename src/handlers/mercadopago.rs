//! MercadoPago endpoints: account linking, checkout preferences and Point
//! terminals.
//!
//! - GET /api/v1/mercadopago/oauth/url
//! - POST /api/v1/mercadopago/oauth/callback
//! - GET/DELETE /api/v1/mercadopago/oauth
//! - POST /api/v1/mercadopago/preferences
//! - GET /api/v1/mercadopago/point/devices
//! - POST /api/v1/mercadopago/point/devices/{device_id}/intents
//! - DELETE /api/v1/mercadopago/point/devices/{device_id}/intents/{intent_id}
//! - GET /api/v1/mercadopago/point/intents/{intent_id}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    clients::mercadopago::{PaymentIntent, PointDevice},
    db::DbPool,
    error::AppError,
    middleware::tenant::Tenant,
    models::mercadopago::{
        AuthorizationUrlResponse, CreatePaymentIntentRequest, CreatePreferenceRequest,
        IntentStatusQuery, IntentStatusResponse, OAuthCallbackRequest, OAuthStatusResponse,
        PreferenceResponse,
    },
    services::mercadopago_service,
    state::AppState,
};

/// URL the admin opens to authorize this organization on MercadoPago.
/// A fresh `state` value is stored and checked on callback.
pub async fn oauth_url(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<AuthorizationUrlResponse>, AppError> {
    Ok(Json(mercadopago_service::oauth_url(&state, &tenant).await?))
}

/// Exchange the authorization code for tokens.
///
/// # Request Body
///
/// ```json
/// { "code": "TG-...", "state": "9f2c..." }
/// ```
///
/// # Response
///
/// - **200 OK**: connection status (tokens are never returned)
/// - **400**: `state` does not match the pending authorization
/// - **502**: MercadoPago rejected the code
pub async fn oauth_callback(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(request): Json<OAuthCallbackRequest>,
) -> Result<Json<OAuthStatusResponse>, AppError> {
    Ok(Json(
        mercadopago_service::oauth_callback(&state, &tenant, request).await?,
    ))
}

pub async fn oauth_status(
    State(pool): State<DbPool>,
    tenant: Tenant,
) -> Result<Json<OAuthStatusResponse>, AppError> {
    Ok(Json(mercadopago_service::status(&pool, &tenant).await?))
}

pub async fn disconnect(
    State(pool): State<DbPool>,
    tenant: Tenant,
) -> Result<StatusCode, AppError> {
    mercadopago_service::disconnect(&pool, &tenant).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a checkout preference for an installment or an arbitrary amount.
///
/// The preference's `external_reference` identifies the installment, so the
/// payment notification can be matched back to the account.
pub async fn create_preference(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(request): Json<CreatePreferenceRequest>,
) -> Result<(StatusCode, Json<PreferenceResponse>), AppError> {
    let preference = mercadopago_service::create_preference(&state, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(preference)))
}

pub async fn list_devices(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<Vec<PointDevice>>, AppError> {
    Ok(Json(mercadopago_service::list_devices(&state, &tenant).await?))
}

pub async fn create_intent(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(device_id): Path<String>,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<(StatusCode, Json<PaymentIntent>), AppError> {
    let intent = mercadopago_service::create_intent(&state, &tenant, &device_id, request).await?;
    Ok((StatusCode::CREATED, Json(intent)))
}

/// Current state of a payment intent.
///
/// With `wait_seconds` the request is held until the intent reaches a
/// final state or the wait runs out (max 60 seconds). A FINISHED intent
/// for an installment is registered on its account and reported in
/// `settlement`.
pub async fn get_intent(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(intent_id): Path<String>,
    Query(query): Query<IntentStatusQuery>,
) -> Result<Json<IntentStatusResponse>, AppError> {
    Ok(Json(
        mercadopago_service::get_intent(&state, &tenant, &intent_id, query).await?,
    ))
}

pub async fn cancel_intent(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((device_id, intent_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    mercadopago_service::cancel_intent(&state, &tenant, &device_id, &intent_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
