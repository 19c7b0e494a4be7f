//! Service configuration

use crate::stripe::StripeSettings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Billing hooks configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL, or `memory://` for the in-process store
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Stripe credentials and redirect URLs
    pub stripe: StripeSettings,
    /// HS256 secret the backend platform signs auth tokens with
    pub auth_token_secret: String,
}

impl Config {
    /// Require a secret: must be set and non-empty in non-development environments.
    fn require_secret(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match lookup(name) {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let http_port = lookup("HTTP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8090);
        let local = format!("http://localhost:{http_port}");
        let defaults = StripeSettings::default();

        let stripe = StripeSettings {
            secret_key: Self::require_secret(&lookup, "STRIPE_SECRET_KEY", &environment)?,
            webhook_secret: Self::require_secret(&lookup, "STRIPE_WEBHOOK_SECRET", &environment)?,
            webhook_tolerance_secs: lookup("STRIPE_WEBHOOK_TOLERANCE_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.webhook_tolerance_secs),
            api_base: lookup("STRIPE_API_BASE").unwrap_or(defaults.api_base),
            timeout_ms: lookup("STRIPE_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            success_url: lookup("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|| format!("{local}/account")),
            cancel_url: lookup("CHECKOUT_CANCEL_URL").unwrap_or_else(|| format!("{local}/")),
            portal_return_url: lookup("PORTAL_RETURN_URL")
                .unwrap_or_else(|| format!("{local}/account")),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            http_port,
            auth_token_secret: Self::require_secret(&lookup, "AUTH_TOKEN_SECRET", &environment)?,
            environment,
            stripe,
        })
    }
}
