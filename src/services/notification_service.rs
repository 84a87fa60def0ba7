//! MercadoPago webhook intake.
//!
//! # Process
//!
//! 1. Verify the `x-signature` header against the webhook secret
//! 2. Skip resources whose notification was already processed
//! 3. Store the notification verbatim
//! 4. For payments, fetch the payment and settle it on its installment
//! 5. Mark the row processed, or keep the error on it
//!
//! # Signature
//!
//! `x-signature: ts=<unix>,v1=<hex hmac>`. The HMAC-SHA256 is computed over
//! the manifest `id:<data.id>;request-id:<x-request-id>;ts:<ts>;`, leaving
//! out the parts whose value is absent.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        current_account::PaymentMethod,
        mercadopago::{NotificationAck, Settlement, WebhookQuery},
    },
    services::mercadopago_service,
    state::AppState,
};

type HmacSha256 = Hmac<Sha256>;

const PAYMENT_TOPIC: &str = "payment";

/// Parsed `x-signature` header.
#[derive(Debug, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
    pub ts: &'a str,
    pub v1: &'a str,
}

pub fn parse_signature(header: &str) -> Option<SignatureHeader<'_>> {
    let mut ts = None;
    let mut v1 = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = Some(value.trim()),
            Some(("v1", value)) => v1 = Some(value.trim()),
            _ => {}
        }
    }
    Some(SignatureHeader {
        ts: ts.filter(|v| !v.is_empty())?,
        v1: v1.filter(|v| !v.is_empty())?,
    })
}

pub fn signature_manifest(data_id: Option<&str>, request_id: Option<&str>, ts: &str) -> String {
    let mut manifest = String::new();
    if let Some(id) = data_id {
        // Alphanumeric ids are signed lowercased.
        manifest.push_str(&format!("id:{};", id.to_lowercase()));
    }
    if let Some(request_id) = request_id {
        manifest.push_str(&format!("request-id:{request_id};"));
    }
    manifest.push_str(&format!("ts:{ts};"));
    manifest
}

/// Check `x-signature` in constant time.
pub fn verify_signature(
    secret: &str,
    header: Option<&str>,
    request_id: Option<&str>,
    data_id: Option<&str>,
) -> Result<(), AppError> {
    let signature = header.and_then(parse_signature).ok_or(AppError::InvalidSignature)?;
    let expected = hex::decode(signature.v1).map_err(|_| AppError::InvalidSignature)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AppError::InvalidSignature)?;
    mac.update(signature_manifest(data_id, request_id, signature.ts).as_bytes());
    mac.verify_slice(&expected).map_err(|_| AppError::InvalidSignature)
}

/// `data.id` may arrive as a string or a number.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Notification as received, plus the headers needed to verify it.
#[derive(Debug)]
pub struct InboundNotification {
    pub query: WebhookQuery,
    pub signature: Option<String>,
    pub request_id: Option<String>,
    pub payload: Value,
}

impl InboundNotification {
    fn data_id(&self) -> Option<String> {
        self.query
            .data_id
            .clone()
            .or_else(|| self.payload.pointer("/data/id").and_then(json_id))
    }

    fn topic(&self) -> Option<String> {
        self.payload
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.query.topic.clone())
    }

    fn action(&self) -> Option<String> {
        self.payload
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Errors worth a retry by MercadoPago. Everything else is recorded on the
/// notification and acknowledged.
fn is_transient(err: &AppError) -> bool {
    matches!(err, AppError::Database(_) | AppError::PaymentGateway(_))
}

pub async fn receive(state: &AppState, inbound: InboundNotification) -> Result<NotificationAck, AppError> {
    let secret = state
        .config
        .mercadopago_webhook_secret
        .as_deref()
        .ok_or(AppError::IntegrationDisabled("MercadoPago webhooks"))?;

    let data_id = inbound.data_id();
    verify_signature(
        secret,
        inbound.signature.as_deref(),
        inbound.request_id.as_deref(),
        data_id.as_deref(),
    )?;

    let organization_id = inbound.query.org;
    let (Some(topic), Some(provider_id)) = (inbound.topic(), data_id) else {
        return Err(AppError::InvalidRequest(
            "notification has no type or data.id".to_string(),
        ));
    };

    let org_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM organizations WHERE id = $1)")
            .bind(organization_id)
            .fetch_one(&state.pool)
            .await?;
    if !org_exists {
        return Err(AppError::NotFound("Organization"));
    }

    let already: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM payment_notifications
        WHERE organization_id = $1 AND topic = $2 AND provider_id = $3 AND processed = true
        LIMIT 1
        "#,
    )
    .bind(organization_id)
    .bind(&topic)
    .bind(&provider_id)
    .fetch_optional(&state.pool)
    .await?;
    if let Some(notification_id) = already {
        tracing::info!(
            organization_id = %organization_id,
            topic = %topic,
            provider_id = %provider_id,
            "duplicate MercadoPago notification"
        );
        return Ok(NotificationAck {
            notification_id: Some(notification_id),
            duplicate: true,
            settlement: None,
        });
    }

    let notification_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO payment_notifications (organization_id, topic, action, provider_id, payload)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(organization_id)
    .bind(&topic)
    .bind(inbound.action())
    .bind(&provider_id)
    .bind(&inbound.payload)
    .fetch_one(&state.pool)
    .await?;

    if topic != PAYMENT_TOPIC {
        mark_processed(state, notification_id, None).await?;
        return Ok(NotificationAck {
            notification_id: Some(notification_id),
            duplicate: false,
            settlement: None,
        });
    }

    let outcome = match mercadopago_service::access_token(state, organization_id).await {
        Ok(token) => {
            mercadopago_service::settle_payment(
                state,
                organization_id,
                &token,
                &provider_id,
                PaymentMethod::Mercadopago,
            )
            .await
        }
        Err(err) => Err(err),
    };

    match outcome {
        Ok(settlement) => {
            let payment_id = match &settlement {
                Settlement::Registered { payment_id } => Some(*payment_id),
                _ => None,
            };
            mark_processed(state, notification_id, payment_id).await?;
            tracing::info!(
                organization_id = %organization_id,
                notification_id = %notification_id,
                provider_id = %provider_id,
                settlement = ?settlement,
                "MercadoPago notification processed"
            );
            Ok(NotificationAck {
                notification_id: Some(notification_id),
                duplicate: false,
                settlement: Some(settlement),
            })
        }
        Err(err) => {
            tracing::warn!(
                organization_id = %organization_id,
                notification_id = %notification_id,
                provider_id = %provider_id,
                error = %err,
                "MercadoPago notification failed"
            );
            sqlx::query("UPDATE payment_notifications SET processing_error = $1 WHERE id = $2")
                .bind(err.to_string())
                .bind(notification_id)
                .execute(&state.pool)
                .await?;
            if is_transient(&err) {
                Err(err)
            } else {
                Ok(NotificationAck {
                    notification_id: Some(notification_id),
                    duplicate: false,
                    settlement: None,
                })
            }
        }
    }
}

async fn mark_processed(state: &AppState, id: Uuid, payment_id: Option<Uuid>) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE payment_notifications SET processed = true, processing_error = NULL, payment_id = $1 WHERE id = $2",
    )
    .bind(payment_id)
    .bind(id)
    .execute(&state.pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec-test";

    fn sign(manifest: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(manifest.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_parse_signature() {
        assert_eq!(
            parse_signature("ts=1704908010,v1=abc123"),
            Some(SignatureHeader {
                ts: "1704908010",
                v1: "abc123"
            })
        );
        assert_eq!(
            parse_signature(" v1=ff , ts=1 "),
            Some(SignatureHeader { ts: "1", v1: "ff" })
        );
        assert_eq!(parse_signature("ts=1"), None);
        assert_eq!(parse_signature("v1=,ts=1"), None);
        assert_eq!(parse_signature(""), None);
    }

    #[test]
    fn test_manifest_skips_missing_parts() {
        assert_eq!(
            signature_manifest(Some("123"), Some("req-1"), "99"),
            "id:123;request-id:req-1;ts:99;"
        );
        assert_eq!(signature_manifest(Some("ABC"), None, "99"), "id:abc;ts:99;");
        assert_eq!(signature_manifest(None, None, "99"), "ts:99;");
    }

    #[test]
    fn test_valid_signature_is_accepted() {
        let v1 = sign("id:123;request-id:req-1;ts:1704908010;");
        let header = format!("ts=1704908010,v1={v1}");
        assert!(verify_signature(SECRET, Some(&header), Some("req-1"), Some("123")).is_ok());
    }

    #[test]
    fn test_tampered_notification_is_rejected() {
        let v1 = sign("id:123;request-id:req-1;ts:1704908010;");
        let header = format!("ts=1704908010,v1={v1}");

        for (request_id, data_id) in [(Some("req-1"), Some("124")), (Some("req-2"), Some("123"))] {
            assert!(matches!(
                verify_signature(SECRET, Some(&header), request_id, data_id),
                Err(AppError::InvalidSignature)
            ));
        }
        assert!(matches!(
            verify_signature("other-secret", Some(&header), Some("req-1"), Some("123")),
            Err(AppError::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature(SECRET, None, Some("req-1"), Some("123")),
            Err(AppError::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature(SECRET, Some("ts=1,v1=not-hex"), None, None),
            Err(AppError::InvalidSignature)
        ));
    }

    #[test]
    fn test_data_id_and_topic_from_body_or_query() {
        let inbound = InboundNotification {
            query: WebhookQuery {
                org: Uuid::nil(),
                data_id: None,
                topic: Some("payment".into()),
            },
            signature: None,
            request_id: None,
            payload: serde_json::json!({ "action": "payment.created", "data": { "id": 987654321 } }),
        };
        assert_eq!(inbound.data_id().as_deref(), Some("987654321"));
        assert_eq!(inbound.topic().as_deref(), Some("payment"));
        assert_eq!(inbound.action().as_deref(), Some("payment.created"));
    }

    #[test]
    fn test_transient_errors() {
        assert!(is_transient(&AppError::PaymentGateway("502".into())));
        assert!(!is_transient(&AppError::NotFound("Installment")));
    }
}
