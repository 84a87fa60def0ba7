//! MercadoPago: per-organization OAuth, checkout preferences and Point
//! Smart terminals.
//!
//! Each organization connects its own MercadoPago account. Calls made on
//! its behalf use the stored access token, refreshed when it is within a
//! day of expiring.
//!
//! Gateway payments land on current accounts through [`settle_payment`],
//! whether they arrive by webhook or by polling a finished Point intent.
//! The stored reference is the MercadoPago payment id. A unique index over
//! (organization, reference) for both gateway methods keeps a payment id
//! from being recorded twice, even when the webhook and a Point poll settle
//! it at the same time.

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use crate::{
    clients::mercadopago::{
        BackUrls, IntentAdditionalInfo, PaymentIntent, PaymentIntentBody, PointDevice,
        PreferenceBody, PreferenceItem, PreferencePayer, TokenResponse, cents_to_decimal,
    },
    db::DbPool,
    domain::validation,
    error::AppError,
    middleware::tenant::Tenant,
    models::{
        current_account::PaymentMethod,
        mercadopago::{
            AuthorizationUrlResponse, CreatePaymentIntentRequest, CreatePreferenceRequest,
            IntentStatusQuery, IntentStatusResponse, MercadoPagoOAuth, OAuthCallbackRequest,
            OAuthStatusResponse, PreferenceResponse, Settlement,
        },
    },
    services::current_account_service::{
        self, COLLECTORS, IncomingPayment, installment_reference, parse_installment_reference,
        today,
    },
    state::AppState,
};

/// Refresh tokens this close to expiry.
const REFRESH_MARGIN_DAYS: i64 = 1;
const MAX_WAIT_SECONDS: u64 = 60;
const POLL_INTERVAL: StdDuration = StdDuration::from_secs(2);
const DEFAULT_CURRENCY: &str = "ARS";

/// What is being charged, online or on a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Charge {
    amount_cents: i64,
    title: String,
    external_reference: String,
    currency: String,
}

fn not_connected() -> AppError {
    AppError::InvalidStateTransition(
        "organization has not connected a MercadoPago account".to_string(),
    )
}

async fn load_oauth(pool: &DbPool, organization_id: Uuid) -> Result<Option<MercadoPagoOAuth>, AppError> {
    let row = sqlx::query_as::<_, MercadoPagoOAuth>(
        "SELECT * FROM mercadopago_oauth WHERE organization_id = $1",
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Persist a token response. `connected` marks a fresh authorization.
async fn store_tokens(
    pool: &DbPool,
    organization_id: Uuid,
    tokens: &TokenResponse,
    connected: bool,
) -> Result<MercadoPagoOAuth, AppError> {
    let expires_at = tokens
        .expires_in
        .map(|seconds| Utc::now() + Duration::seconds(seconds));

    let row = sqlx::query_as::<_, MercadoPagoOAuth>(
        r#"
        UPDATE mercadopago_oauth
        SET access_token = $2,
            refresh_token = COALESCE($3, refresh_token),
            public_key = COALESCE($4, public_key),
            mp_user_id = COALESCE($5, mp_user_id),
            expires_at = $6,
            pending_state = NULL,
            connected_at = CASE WHEN $7 THEN NOW() ELSE connected_at END,
            updated_at = NOW()
        WHERE organization_id = $1
        RETURNING *
        "#,
    )
    .bind(organization_id)
    .bind(&tokens.access_token)
    .bind(&tokens.refresh_token)
    .bind(&tokens.public_key)
    .bind(tokens.user_id)
    .bind(expires_at)
    .bind(connected)
    .fetch_optional(pool)
    .await?
    .ok_or_else(not_connected)?;
    Ok(row)
}

/// Access token of the organization, refreshed when close to expiry.
///
/// A failed refresh falls back to the current token while it is still
/// valid.
pub async fn access_token(state: &AppState, organization_id: Uuid) -> Result<String, AppError> {
    let row = load_oauth(&state.pool, organization_id)
        .await?
        .filter(MercadoPagoOAuth::is_connected)
        .ok_or_else(not_connected)?;

    let now = Utc::now();
    if row.expires_within(now, Duration::days(REFRESH_MARGIN_DAYS)) {
        if let Some(refresh_token) = row.refresh_token.as_deref() {
            match state.mercadopago.refresh_token(refresh_token).await {
                Ok(tokens) => {
                    store_tokens(&state.pool, organization_id, &tokens, false).await?;
                    tracing::info!(organization_id = %organization_id, "MercadoPago token refreshed");
                    return Ok(tokens.access_token);
                }
                Err(err) if row.expires_within(now, Duration::zero()) => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        organization_id = %organization_id,
                        error = %err,
                        "MercadoPago token refresh failed, using current token"
                    );
                }
            }
        }
    }

    row.access_token.ok_or_else(not_connected)
}

/// Start an authorization: store a fresh `state` and return the URL.
pub async fn oauth_url(state: &AppState, tenant: &Tenant) -> Result<AuthorizationUrlResponse, AppError> {
    tenant.require_admin()?;

    let oauth_state = hex::encode(rand::random::<[u8; 16]>());
    let url = state.mercadopago.authorization_url(&oauth_state)?;

    sqlx::query(
        r#"
        INSERT INTO mercadopago_oauth (organization_id, pending_state)
        VALUES ($1, $2)
        ON CONFLICT (organization_id)
        DO UPDATE SET pending_state = EXCLUDED.pending_state, updated_at = NOW()
        "#,
    )
    .bind(tenant.organization_id)
    .bind(&oauth_state)
    .execute(&state.pool)
    .await?;

    tracing::info!(organization_id = %tenant.organization_id, "MercadoPago authorization started");
    Ok(AuthorizationUrlResponse { url })
}

/// Finish an authorization started by [`oauth_url`].
pub async fn oauth_callback(
    state: &AppState,
    tenant: &Tenant,
    request: OAuthCallbackRequest,
) -> Result<OAuthStatusResponse, AppError> {
    tenant.require_admin()?;

    let pending = load_oauth(&state.pool, tenant.organization_id)
        .await?
        .and_then(|row| row.pending_state);
    if pending.as_deref() != Some(request.state.as_str()) {
        return Err(AppError::InvalidRequest(
            "unknown or expired authorization state".to_string(),
        ));
    }

    let code = validation::required_name("code", &request.code)?;
    let tokens = state.mercadopago.exchange_code(&code).await?;
    let row = store_tokens(&state.pool, tenant.organization_id, &tokens, true).await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        mp_user_id = ?row.mp_user_id,
        "MercadoPago account connected"
    );
    Ok(OAuthStatusResponse::from(Some(row)))
}

pub async fn status(pool: &DbPool, tenant: &Tenant) -> Result<OAuthStatusResponse, AppError> {
    Ok(OAuthStatusResponse::from(load_oauth(pool, tenant.organization_id).await?))
}

pub async fn disconnect(pool: &DbPool, tenant: &Tenant) -> Result<(), AppError> {
    tenant.require_admin()?;

    let result = sqlx::query("DELETE FROM mercadopago_oauth WHERE organization_id = $1")
        .bind(tenant.organization_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_connected());
    }

    tracing::info!(organization_id = %tenant.organization_id, "MercadoPago account disconnected");
    Ok(())
}

/// Resolve what to charge: an installment's remaining balance, or an
/// explicit amount with a title.
async fn resolve_charge(
    pool: &DbPool,
    tenant: &Tenant,
    installment_id: Option<Uuid>,
    amount_cents: Option<i64>,
    title: Option<String>,
) -> Result<Charge, AppError> {
    match (installment_id, amount_cents) {
        (Some(installment_id), None) => {
            let (installment, account) =
                current_account_service::installment_for_charge(pool, tenant.organization_id, installment_id)
                    .await?;
            let title = match title {
                Some(title) => validation::required_name("title", &title)?,
                None => format!(
                    "Installment {} of {}",
                    installment.number, account.number_of_installments
                ),
            };
            Ok(Charge {
                amount_cents: installment.amount_cents - installment.paid_cents,
                title,
                external_reference: installment_reference(installment.id),
                currency: account.currency,
            })
        }
        (None, Some(amount_cents)) => {
            let amount_cents = validation::positive_cents("amount_cents", amount_cents)?;
            let title = validation::required_name("title", title.as_deref().unwrap_or_default())?;
            Ok(Charge {
                amount_cents,
                title,
                external_reference: format!("charge:{}", Uuid::new_v4()),
                currency: DEFAULT_CURRENCY.to_string(),
            })
        }
        _ => Err(AppError::InvalidRequest(
            "provide either installment_id or amount_cents".to_string(),
        )),
    }
}

fn preference_body(
    charge: &Charge,
    notification_url: String,
    payer_email: Option<String>,
    back_url: Option<String>,
) -> PreferenceBody {
    PreferenceBody {
        items: vec![PreferenceItem {
            id: charge.external_reference.clone(),
            title: charge.title.clone(),
            quantity: 1,
            unit_price: cents_to_decimal(charge.amount_cents),
            currency_id: charge.currency.clone(),
        }],
        external_reference: charge.external_reference.clone(),
        notification_url,
        payer: payer_email.map(|email| PreferencePayer { email }),
        auto_return: back_url.as_ref().map(|_| "approved".to_string()),
        back_urls: back_url.map(|url| BackUrls {
            success: url.clone(),
            failure: url.clone(),
            pending: url,
        }),
    }
}

/// Create a checkout preference whose notifications come back tagged with
/// the organization.
pub async fn create_preference(
    state: &AppState,
    tenant: &Tenant,
    request: CreatePreferenceRequest,
) -> Result<PreferenceResponse, AppError> {
    tenant.require_role(COLLECTORS)?;

    let payer_email = validation::optional_email(request.payer_email)?;
    let back_url = validation::optional_text("back_url", request.back_url)?;
    let charge = resolve_charge(
        &state.pool,
        tenant,
        request.installment_id,
        request.amount_cents,
        request.title,
    )
    .await?;

    let token = access_token(state, tenant.organization_id).await?;
    let body = preference_body(
        &charge,
        state.config.mercadopago_notification_url(tenant.organization_id),
        payer_email,
        back_url,
    );
    let created = state.mercadopago.create_preference(&token, &body).await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        preference_id = %created.id,
        external_reference = %charge.external_reference,
        amount_cents = charge.amount_cents,
        "MercadoPago preference created"
    );

    Ok(PreferenceResponse {
        preference_id: created.id,
        init_point: created.init_point,
        sandbox_init_point: created.sandbox_init_point,
        external_reference: charge.external_reference,
        amount_cents: charge.amount_cents,
    })
}

pub async fn list_devices(state: &AppState, tenant: &Tenant) -> Result<Vec<PointDevice>, AppError> {
    tenant.require_role(COLLECTORS)?;
    let token = access_token(state, tenant.organization_id).await?;
    state.mercadopago.list_devices(&token).await
}

/// Send a charge to a Point terminal.
pub async fn create_intent(
    state: &AppState,
    tenant: &Tenant,
    device_id: &str,
    request: CreatePaymentIntentRequest,
) -> Result<PaymentIntent, AppError> {
    tenant.require_role(COLLECTORS)?;

    let description = validation::optional_text("description", request.description)?;
    let charge = resolve_charge(
        &state.pool,
        tenant,
        request.installment_id,
        request.amount_cents,
        description.clone(),
    )
    .await?;

    let token = access_token(state, tenant.organization_id).await?;
    let body = PaymentIntentBody {
        amount: charge.amount_cents,
        description: Some(description.unwrap_or(charge.title)),
        additional_info: IntentAdditionalInfo {
            external_reference: charge.external_reference.clone(),
            print_on_terminal: request.print_on_terminal,
        },
    };
    let intent = state
        .mercadopago
        .create_payment_intent(&token, device_id, &body)
        .await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        device_id = %device_id,
        intent_id = %intent.id,
        amount_cents = charge.amount_cents,
        "Point payment intent created"
    );
    Ok(intent)
}

/// Intent status, optionally waiting for a final state. A finished intent
/// is settled against its installment.
pub async fn get_intent(
    state: &AppState,
    tenant: &Tenant,
    intent_id: &str,
    query: IntentStatusQuery,
) -> Result<IntentStatusResponse, AppError> {
    tenant.require_role(COLLECTORS)?;

    let token = access_token(state, tenant.organization_id).await?;
    let wait = StdDuration::from_secs(query.wait_seconds.unwrap_or(0).min(MAX_WAIT_SECONDS));
    let deadline = Instant::now() + wait;

    let intent = loop {
        let intent = state.mercadopago.get_payment_intent(&token, intent_id).await?;
        if intent.is_final() || Instant::now() + POLL_INTERVAL > deadline {
            break intent;
        }
        sleep(POLL_INTERVAL).await;
    };

    let payment_id = intent
        .payment
        .as_ref()
        .and_then(|p| p.id)
        .filter(|_| intent.state.as_deref() == Some("FINISHED"));
    let settlement = match payment_id {
        Some(payment_id) => Some(
            settle_payment(
                state,
                tenant.organization_id,
                &token,
                &payment_id.to_string(),
                PaymentMethod::Point,
            )
            .await?,
        ),
        None => None,
    };

    Ok(IntentStatusResponse { intent, settlement })
}

pub async fn cancel_intent(
    state: &AppState,
    tenant: &Tenant,
    device_id: &str,
    intent_id: &str,
) -> Result<(), AppError> {
    tenant.require_role(COLLECTORS)?;
    let token = access_token(state, tenant.organization_id).await?;
    state
        .mercadopago
        .cancel_payment_intent(&token, device_id, intent_id)
        .await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        device_id = %device_id,
        intent_id = %intent_id,
        "Point payment intent cancelled"
    );
    Ok(())
}

/// Record an approved gateway payment on the installment named by its
/// external reference.
pub async fn settle_payment(
    state: &AppState,
    organization_id: Uuid,
    access_token: &str,
    mp_payment_id: &str,
    method: PaymentMethod,
) -> Result<Settlement, AppError> {
    let payment = state.mercadopago.get_payment(access_token, mp_payment_id).await?;
    if !payment.is_approved() {
        return Ok(Settlement::NotApproved {
            status: payment.status,
        });
    }
    let Some(installment_id) = payment
        .external_reference
        .as_deref()
        .and_then(parse_installment_reference)
    else {
        return Ok(Settlement::Unrelated);
    };

    record_gateway_payment(
        &state.pool,
        organization_id,
        GatewayPayment {
            installment_id,
            reference: payment.id.to_string(),
            amount_cents: payment.amount_cents(),
            method,
        },
    )
    .await
}

/// Approved gateway payment matched to an installment.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub installment_id: Uuid,
    /// MercadoPago payment id.
    pub reference: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
}

/// Apply a gateway payment once per organization and payment id.
///
/// The `EXISTS` lookup only skips the common replay. Concurrent deliveries
/// race past it and are stopped by `uq_payments_gateway_reference`, whose
/// violation is reported as [`Settlement::AlreadyRecorded`].
pub async fn record_gateway_payment(
    pool: &DbPool,
    organization_id: Uuid,
    payment: GatewayPayment,
) -> Result<Settlement, AppError> {
    let recorded: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM payments
            WHERE organization_id = $1 AND reference = $2
              AND method IN ('MERCADOPAGO', 'POINT') AND status = 'COMPLETED'
        )
        "#,
    )
    .bind(organization_id)
    .bind(&payment.reference)
    .fetch_one(pool)
    .await?;
    if recorded {
        return Ok(Settlement::AlreadyRecorded);
    }

    let (account_id, number, owes): (Uuid, i32, bool) = sqlx::query_as(
        r#"
        SELECT i.current_account_id, i.number, i.paid_cents < i.amount_cents
        FROM installments i
        JOIN current_accounts a ON a.id = i.current_account_id
        WHERE i.id = $1 AND a.organization_id = $2
        "#,
    )
    .bind(payment.installment_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Installment"))?;

    // Paid meanwhile through another channel: the money still goes to the
    // oldest unpaid installment.
    let incoming = IncomingPayment {
        amount_cents: payment.amount_cents,
        method: payment.method,
        installment_number: owes.then_some(number),
        payment_date: today(),
        notes: Some(format!("MercadoPago payment {}", payment.reference)),
        reference: Some(payment.reference),
        recorded_by: None,
    };

    match current_account_service::apply_payment(pool, organization_id, account_id, incoming).await {
        Ok(receipt) => Ok(Settlement::Registered {
            payment_id: receipt.payment.id,
        }),
        Err(AppError::Conflict(_)) => Ok(Settlement::AlreadyRecorded),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge() -> Charge {
        Charge {
            amount_cents: 1_500_050,
            title: "Installment 3 of 12".into(),
            external_reference: installment_reference(Uuid::nil()),
            currency: "ARS".into(),
        }
    }

    #[test]
    fn test_preference_body_without_back_url() {
        let body = preference_body(
            &charge(),
            "https://api.example.com/api/v1/webhooks/mercadopago?org=x".into(),
            None,
            None,
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["items"][0]["unit_price"], 15000.5);
        assert_eq!(json["items"][0]["quantity"], 1);
        assert_eq!(
            json["external_reference"],
            "installment:00000000-0000-0000-0000-000000000000"
        );
        assert!(json.get("back_urls").is_none());
        assert!(json.get("auto_return").is_none());
        assert!(json.get("payer").is_none());
    }

    #[test]
    fn test_preference_body_with_back_url_auto_returns() {
        let body = preference_body(
            &charge(),
            "https://api.example.com/hook".into(),
            Some("buyer@example.com".into()),
            Some("https://shop.example.com/done".into()),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["auto_return"], "approved");
        assert_eq!(json["back_urls"]["pending"], "https://shop.example.com/done");
        assert_eq!(json["payer"]["email"], "buyer@example.com");
    }
}
