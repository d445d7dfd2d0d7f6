//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:3000`);
//!   an `https://` URL turns on secure session cookies
//! - `STOREFRONT_CURRENCY` - ISO 4217 code prices are shown in (default: MYR)
//! - `STOREFRONT_PAYMENT_DELAY_MS` - Simulated payment latency (default: 2000)
//! - `STOREFRONT_REDIRECT_DELAY_SECS` - Delay before the confirmation page
//!   returns to the menu (default: 2)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use brew_and_bites_core::CurrencyCode;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PAYMENT_DELAY_MS: u64 = 2000;
const DEFAULT_REDIRECT_DELAY_SECS: u32 = 2;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Currency prices are displayed in
    pub currency: CurrencyCode,
    /// Checkout timing
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Simulated checkout timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// How long the simulated payment takes
    pub payment_delay: Duration,
    /// Seconds the confirmation page waits before returning to the menu
    pub redirect_delay_secs: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            payment_delay: Duration::from_millis(DEFAULT_PAYMENT_DELAY_MS),
            redirect_delay_secs: DEFAULT_REDIRECT_DELAY_SECS,
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            base_url: format!("http://localhost:{DEFAULT_PORT}"),
            currency: CurrencyCode::default(),
            checkout: CheckoutConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = parse_or("STOREFRONT_HOST", &lookup, defaults.host)?;
        let port = parse_or("STOREFRONT_PORT", &lookup, defaults.port)?;
        let base_url = lookup("STOREFRONT_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        let currency = parse_or("STOREFRONT_CURRENCY", &lookup, defaults.currency)?;

        let payment_delay_ms = parse_or(
            "STOREFRONT_PAYMENT_DELAY_MS",
            &lookup,
            DEFAULT_PAYMENT_DELAY_MS,
        )?;
        let redirect_delay_secs = parse_or(
            "STOREFRONT_REDIRECT_DELAY_SECS",
            &lookup,
            DEFAULT_REDIRECT_DELAY_SECS,
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            currency,
            checkout: CheckoutConfig {
                payment_delay: Duration::from_millis(payment_delay_ms),
                redirect_delay_secs,
            },
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T>(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
