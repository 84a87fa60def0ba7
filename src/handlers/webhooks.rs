//! Inbound MercadoPago notifications.
//!
//! - POST /api/v1/webhooks/mercadopago?org={organization_id}
//!
//! Public route: MercadoPago cannot send our session tokens. Requests are
//! authenticated with the `x-signature` HMAC instead.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde_json::Value;

use crate::{
    error::AppError,
    models::mercadopago::{NotificationAck, WebhookQuery},
    services::notification_service::{self, InboundNotification},
    state::AppState,
};

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Receive a payment notification.
///
/// # Response
///
/// - **200 OK**: stored (and settled when it is an approved payment for an
///   installment), or a duplicate of an already processed notification
/// - **401**: missing or invalid `x-signature`
/// - **5xx**: database or gateway failure; MercadoPago will retry
///
/// Notifications that fail for any other reason are stored with the error
/// and still acknowledged, so they are not redelivered forever.
pub async fn mercadopago_notification(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<NotificationAck>, AppError> {
    let inbound = InboundNotification {
        query,
        signature: header_value(&headers, "x-signature"),
        request_id: header_value(&headers, "x-request-id"),
        payload,
    };
    Ok(Json(notification_service::receive(&state, inbound).await?))
}
