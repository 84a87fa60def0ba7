//! Application configuration management.
//!
//! Configuration is read from environment variables with the `envy` crate.
//! A `.env` file is loaded first when present.
//!
//! MercadoPago and S3 settings are optional. When they are missing the
//! server still starts, and the corresponding endpoints answer with
//! `503 integration_disabled`.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `SESSION_TTL_HOURS` (optional): session lifetime, defaults to one week
/// - `PUBLIC_BASE_URL` (optional): externally reachable base URL, used to
///   build MercadoPago notification URLs
/// - `MERCADOPAGO_*` (optional): OAuth application and webhook settings
/// - `AWS_S3_BUCKET`, `AWS_REGION`, `AWS_ENDPOINT_URL` (optional): file storage
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    pub mercadopago_client_id: Option<String>,
    pub mercadopago_client_secret: Option<String>,
    pub mercadopago_redirect_uri: Option<String>,
    pub mercadopago_webhook_secret: Option<String>,

    #[serde(default = "default_mercadopago_api_base")]
    pub mercadopago_api_base: String,

    #[serde(default = "default_mercadopago_auth_base")]
    pub mercadopago_auth_base: String,

    pub aws_s3_bucket: Option<String>,
    pub aws_region: Option<String>,
    pub aws_endpoint_url: Option<String>,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_mercadopago_api_base() -> String {
    "https://api.mercadopago.com".to_string()
}

fn default_mercadopago_auth_base() -> String {
    "https://auth.mercadopago.com".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// OAuth application credentials, present only when all three are set.
#[derive(Debug, Clone)]
pub struct MercadoPagoApp {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
    }

    /// Build a config from an explicit list of `(KEY, value)` pairs.
    ///
    /// Used by tests and tooling that must not depend on the process
    /// environment.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs)
    }

    pub fn mercadopago_app(&self) -> Option<MercadoPagoApp> {
        match (
            &self.mercadopago_client_id,
            &self.mercadopago_client_secret,
            &self.mercadopago_redirect_uri,
        ) {
            (Some(id), Some(secret), Some(redirect)) => Some(MercadoPagoApp {
                client_id: id.clone(),
                client_secret: secret.clone(),
                redirect_uri: redirect.clone(),
            }),
            _ => None,
        }
    }

    /// Notification URL MercadoPago should call for this organization.
    pub fn mercadopago_notification_url(&self, organization_id: uuid::Uuid) -> String {
        format!(
            "{}/api/v1/webhooks/mercadopago?org={}",
            self.public_base_url.trim_end_matches('/'),
            organization_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut v = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/moto".to_string(),
        )];
        v.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        v
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_pairs(pairs(&[])).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.mercadopago_api_base, "https://api.mercadopago.com");
        assert!(config.aws_s3_bucket.is_none());
        assert!(config.mercadopago_app().is_none());
    }

    #[test]
    fn test_missing_database_url_fails() {
        assert!(Config::from_pairs(Vec::new()).is_err());
    }

    #[test]
    fn test_mercadopago_app_requires_all_fields() {
        let partial = Config::from_pairs(pairs(&[("MERCADOPAGO_CLIENT_ID", "123")])).unwrap();
        assert!(partial.mercadopago_app().is_none());

        let full = Config::from_pairs(pairs(&[
            ("MERCADOPAGO_CLIENT_ID", "123"),
            ("MERCADOPAGO_CLIENT_SECRET", "shh"),
            ("MERCADOPAGO_REDIRECT_URI", "https://app.example.com/mp/callback"),
        ]))
        .unwrap();
        let app = full.mercadopago_app().unwrap();
        assert_eq!(app.client_id, "123");
    }

    #[test]
    fn test_notification_url_strips_trailing_slash() {
        let config =
            Config::from_pairs(pairs(&[("PUBLIC_BASE_URL", "https://moto.example.com/")])).unwrap();
        let org = uuid::Uuid::nil();
        assert_eq!(
            config.mercadopago_notification_url(org),
            format!("https://moto.example.com/api/v1/webhooks/mercadopago?org={org}")
        );
    }
}
