//! MercadoPago REST client.
//!
//! Thin wrapper over the public REST API: OAuth token exchange, checkout
//! preferences, payment lookup and the Point Smart integration API. Every
//! call that acts on behalf of an organization takes that organization's
//! access token explicitly.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::config::{Config, MercadoPagoApp};
use crate::error::AppError;

/// Timeout for every call to MercadoPago.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct MercadoPagoClient {
    http: Client,
    api_base: String,
    auth_base: String,
    app: Option<MercadoPagoApp>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub public_key: Option<String>,
    pub user_id: Option<i64>,
    /// Seconds until `access_token` expires.
    pub expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    /// Decimal amount in currency units (not cents), as the API expects.
    pub unit_price: f64,
    pub currency_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferencePayer {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceBody {
    pub items: Vec<PreferenceItem>,
    pub external_reference: String,
    pub notification_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<PreferencePayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_urls: Option<BackUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_return: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceCreated {
    pub id: String,
    pub init_point: String,
    pub sandbox_init_point: Option<String>,
}

/// Subset of `GET /v1/payments/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MpPayment {
    pub id: i64,
    pub status: String,
    pub status_detail: Option<String>,
    pub transaction_amount: f64,
    pub currency_id: Option<String>,
    pub external_reference: Option<String>,
    pub date_approved: Option<String>,
}

impl MpPayment {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }

    pub fn amount_cents(&self) -> i64 {
        (self.transaction_amount * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointDevice {
    pub id: String,
    pub pos_id: Option<i64>,
    pub store_id: Option<String>,
    pub external_pos_id: Option<String>,
    pub operating_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    devices: Vec<PointDevice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentAdditionalInfo {
    pub external_reference: String,
    pub print_on_terminal: bool,
}

/// Body of a Point payment intent. `amount` is in cents: 1500 = $15,00.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentBody {
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub additional_info: IntentAdditionalInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentPayment {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub payment_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub device_id: Option<String>,
    pub amount: Option<i64>,
    /// `OPEN`, `ON_TERMINAL`, `PROCESSING`, `PROCESSED`, `FINISHED`,
    /// `CANCELED`, `ERROR` or `ABANDONED`.
    pub state: Option<String>,
    pub payment: Option<IntentPayment>,
}

impl PaymentIntent {
    /// The terminal will not change this intent any further.
    pub fn is_final(&self) -> bool {
        matches!(
            self.state.as_deref(),
            Some("FINISHED" | "CANCELED" | "ERROR" | "ABANDONED")
        )
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl MercadoPagoClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: config.mercadopago_api_base.trim_end_matches('/').to_string(),
            auth_base: config.mercadopago_auth_base.trim_end_matches('/').to_string(),
            app: config.mercadopago_app(),
        })
    }

    fn app(&self) -> Result<&MercadoPagoApp, AppError> {
        self.app
            .as_ref()
            .ok_or(AppError::IntegrationDisabled("MercadoPago"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Authorization URL the admin is redirected to.
    pub fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        let app = self.app()?;
        let url = url::Url::parse_with_params(
            &format!("{}/authorization", self.auth_base),
            &[
                ("client_id", app.client_id.as_str()),
                ("response_type", "code"),
                ("platform_id", "mp"),
                ("state", state),
                ("redirect_uri", app.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| AppError::PaymentGateway(format!("invalid authorization URL: {e}")))?;
        Ok(url.into())
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let app = self.app()?;
        let body = TokenRequest {
            client_id: &app.client_id,
            client_secret: &app.client_secret,
            grant_type: "authorization_code",
            code: Some(code),
            redirect_uri: Some(&app.redirect_uri),
            refresh_token: None,
        };
        self.send(self.http.post(self.url("/oauth/token")).json(&body))
            .await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let app = self.app()?;
        let body = TokenRequest {
            client_id: &app.client_id,
            client_secret: &app.client_secret,
            grant_type: "refresh_token",
            code: None,
            redirect_uri: None,
            refresh_token: Some(refresh_token),
        };
        self.send(self.http.post(self.url("/oauth/token")).json(&body))
            .await
    }

    pub async fn create_preference(
        &self,
        access_token: &str,
        body: &PreferenceBody,
    ) -> Result<PreferenceCreated, AppError> {
        self.send(
            self.http
                .post(self.url("/checkout/preferences"))
                .bearer_auth(access_token)
                .json(body),
        )
        .await
    }

    pub async fn get_payment(&self, access_token: &str, payment_id: &str) -> Result<MpPayment, AppError> {
        self.send(
            self.http
                .get(self.url(&format!("/v1/payments/{payment_id}")))
                .bearer_auth(access_token),
        )
        .await
    }

    pub async fn list_devices(&self, access_token: &str) -> Result<Vec<PointDevice>, AppError> {
        let list: DeviceList = self
            .send(
                self.http
                    .get(self.url("/point/integration-api/devices"))
                    .bearer_auth(access_token),
            )
            .await?;
        Ok(list.devices)
    }

    pub async fn create_payment_intent(
        &self,
        access_token: &str,
        device_id: &str,
        body: &PaymentIntentBody,
    ) -> Result<PaymentIntent, AppError> {
        self.send(
            self.http
                .post(self.url(&format!(
                    "/point/integration-api/devices/{device_id}/payment-intents"
                )))
                .bearer_auth(access_token)
                .json(body),
        )
        .await
    }

    pub async fn get_payment_intent(
        &self,
        access_token: &str,
        intent_id: &str,
    ) -> Result<PaymentIntent, AppError> {
        self.send(
            self.http
                .get(self.url(&format!(
                    "/point/integration-api/payment-intents/{intent_id}"
                )))
                .bearer_auth(access_token),
        )
        .await
    }

    pub async fn cancel_payment_intent(
        &self,
        access_token: &str,
        device_id: &str,
        intent_id: &str,
    ) -> Result<(), AppError> {
        let response = self
            .http
            .delete(self.url(&format!(
                "/point/integration-api/devices/{device_id}/payment-intents/{intent_id}"
            )))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(api_error(status, &body))
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "unexpected MercadoPago response body");
            AppError::PaymentGateway(format!("unexpected response: {e}"))
        })
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    tracing::error!(error = %err, "MercadoPago request failed");
    AppError::PaymentGateway(format!("request failed: {err}"))
}

/// Turn a non-2xx response into a gateway error, keeping MercadoPago's own
/// message when the body has one.
fn api_error(status: StatusCode, body: &str) -> AppError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.chars().take(200).collect());
    tracing::warn!(status = %status, detail = %detail, "MercadoPago returned an error");
    AppError::PaymentGateway(format!("{} {}", status.as_u16(), detail))
}

/// Decimal unit price for preferences: 150050 cents → 1500.5.
pub fn cents_to_decimal(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let mut all = vec![("DATABASE_URL".to_string(), "postgres://x".to_string())];
        all.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Config::from_pairs(all).unwrap()
    }

    #[test]
    fn test_authorization_url_requires_app() {
        let client = MercadoPagoClient::new(&config(&[])).unwrap();
        assert!(matches!(
            client.authorization_url("abc"),
            Err(AppError::IntegrationDisabled("MercadoPago"))
        ));
    }

    #[test]
    fn test_authorization_url_parameters() {
        let client = MercadoPagoClient::new(&config(&[
            ("MERCADOPAGO_CLIENT_ID", "1234"),
            ("MERCADOPAGO_CLIENT_SECRET", "secret"),
            ("MERCADOPAGO_REDIRECT_URI", "https://app.example.com/mp/callback"),
        ]))
        .unwrap();

        let url = url::Url::parse(&client.authorization_url("st4te").unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("auth.mercadopago.com"));
        assert_eq!(url.path(), "/authorization");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "1234");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "st4te");
        assert_eq!(params["redirect_uri"], "https://app.example.com/mp/callback");
    }

    #[test]
    fn test_api_error_prefers_message_field() {
        let err = api_error(StatusCode::BAD_REQUEST, r#"{"message":"invalid token","status":400}"#);
        assert_eq!(err.to_string(), "Payment gateway error: 400 invalid token");

        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "Payment gateway error: 502 upstream down");
    }

    #[test]
    fn test_payment_parsing() {
        let payment: MpPayment = serde_json::from_str(
            r#"{"id": 123456789, "status": "approved", "status_detail": "accredited",
                "transaction_amount": 1500.5, "currency_id": "ARS",
                "external_reference": "installment:00000000-0000-0000-0000-000000000001",
                "payer": {"email": "x@example.com"}}"#,
        )
        .unwrap();
        assert!(payment.is_approved());
        assert_eq!(payment.amount_cents(), 150_050);
    }

    #[test]
    fn test_intent_final_states() {
        let intent = |state: &str| PaymentIntent {
            id: "i".into(),
            device_id: None,
            amount: Some(100),
            state: Some(state.into()),
            payment: None,
        };
        assert!(intent("FINISHED").is_final());
        assert!(intent("CANCELED").is_final());
        assert!(!intent("ON_TERMINAL").is_final());
        assert!(!intent("OPEN").is_final());
    }

    #[test]
    fn test_cents_to_decimal() {
        assert_eq!(cents_to_decimal(150_050), 1500.5);
        assert_eq!(cents_to_decimal(1), 0.01);
    }
}
