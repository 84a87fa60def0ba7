//! MercadoPago integration models.
//!
//! These are the rows and request/response bodies of *our* API. The wire
//! types exchanged with MercadoPago live in `clients::mercadopago`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clients::mercadopago::PaymentIntent;

/// Per-organization OAuth credentials.
///
/// Tokens are never serialized back to clients; see `OAuthStatusResponse`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MercadoPagoOAuth {
    pub organization_id: Uuid,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub public_key: Option<String>,
    pub mp_user_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    /// CSRF `state` of an authorization in progress.
    pub pending_state: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl MercadoPagoOAuth {
    pub fn is_connected(&self) -> bool {
        self.access_token.is_some()
    }

    /// True when the token expires within `margin`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - now <= margin,
            None => false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OAuthStatusResponse {
    pub connected: bool,
    pub mp_user_id: Option<i64>,
    pub public_key: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl From<Option<MercadoPagoOAuth>> for OAuthStatusResponse {
    fn from(row: Option<MercadoPagoOAuth>) -> Self {
        match row {
            Some(row) => Self {
                connected: row.is_connected(),
                mp_user_id: row.mp_user_id,
                public_key: row.public_key,
                expires_at: row.expires_at,
                connected_at: row.connected_at,
            },
            None => Self {
                connected: false,
                mp_user_id: None,
                public_key: None,
                expires_at: None,
                connected_at: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorizationUrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackRequest {
    pub code: String,
    pub state: String,
}

/// Request body for `POST /api/v1/mercadopago/preferences`.
///
/// Either `installment_id` (amount = what the installment still owes) or
/// `amount_cents` + `title` for an arbitrary charge.
#[derive(Debug, Deserialize)]
pub struct CreatePreferenceRequest {
    pub installment_id: Option<Uuid>,
    pub amount_cents: Option<i64>,
    pub title: Option<String>,
    pub payer_email: Option<String>,
    pub back_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    pub preference_id: String,
    pub init_point: String,
    pub sandbox_init_point: Option<String>,
    pub external_reference: String,
    pub amount_cents: i64,
}

/// Request body for `POST /api/v1/mercadopago/point/devices/{device_id}/intents`.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub installment_id: Option<Uuid>,
    pub amount_cents: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub print_on_terminal: bool,
}

/// Query string of the payment intent status endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct IntentStatusQuery {
    /// Long-poll up to this many seconds (max 60) for a final state.
    pub wait_seconds: Option<u64>,
}

/// What happened when a gateway payment was matched against our accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Settlement {
    /// Payment recorded on the installment's account.
    Registered { payment_id: Uuid },
    /// Same gateway payment was recorded before.
    AlreadyRecorded,
    /// Not approved (yet); nothing recorded.
    NotApproved { status: String },
    /// External reference does not point at an installment.
    Unrelated,
}

#[derive(Debug, Serialize)]
pub struct IntentStatusResponse {
    #[serde(flatten)]
    pub intent: PaymentIntent,
    /// Present once a finished intent has been matched to an installment.
    pub settlement: Option<Settlement>,
}

/// Inbound notification, stored verbatim.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PaymentNotification {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub topic: String,
    pub action: Option<String>,
    pub provider_id: String,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub processing_error: Option<String>,
    pub payment_id: Option<Uuid>,
    pub received_at: DateTime<Utc>,
}

/// Query string on the webhook URL. `org` is ours; MercadoPago appends
/// `data.id` and `type` itself.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub org: Uuid,
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
    #[serde(rename = "type")]
    pub topic: Option<String>,
}

/// Response to MercadoPago for an accepted notification.
#[derive(Debug, Serialize)]
pub struct NotificationAck {
    pub notification_id: Option<Uuid>,
    /// A notification for the same resource was already processed.
    pub duplicate: bool,
    pub settlement: Option<Settlement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(expires_in_hours: Option<i64>) -> MercadoPagoOAuth {
        let now = Utc::now();
        MercadoPagoOAuth {
            organization_id: Uuid::nil(),
            access_token: Some("APP_USR-token".into()),
            refresh_token: Some("TG-refresh".into()),
            public_key: Some("APP_USR-public".into()),
            mp_user_id: Some(42),
            expires_at: expires_in_hours.map(|h| now + Duration::hours(h)),
            pending_state: None,
            connected_at: Some(now),
            updated_at: now,
        }
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();
        assert!(row(Some(2)).expires_within(now, Duration::days(1)));
        assert!(!row(Some(72)).expires_within(now, Duration::days(1)));
        assert!(!row(None).expires_within(now, Duration::days(1)));
    }

    #[test]
    fn test_status_never_exposes_tokens() {
        let status = OAuthStatusResponse::from(Some(row(Some(10))));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["connected"], true);
        assert!(json.get("access_token").is_none());
        assert!(json.get("refresh_token").is_none());

        let empty = OAuthStatusResponse::from(None);
        assert!(!empty.connected);
    }
}
