//! Configuration module for the shelter backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::donation::AmountBounds;
use crate::errors::AppError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes
    pub admin_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Stripe secret key; payment intents are refused while unset
    pub stripe_secret_key: Option<String>,
    /// Base URL of the Stripe REST API
    pub stripe_api_base: String,
    /// Currency used when a request does not name one
    pub currency: String,
    /// Accepted donation range in cents
    pub donation_bounds: AmountBounds,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let admin_psk = env::var("SHELTER_ADMIN_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("SHELTER_DB_PATH")
            .unwrap_or_else(|_| "./data/shelter.sqlite".to_string())
            .into();

        let bind_addr = env::var("SHELTER_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|_| AppError::Config("Invalid SHELTER_BIND_ADDR format".to_string()))?;

        let log_level = env::var("SHELTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("SHELTER_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(other) => {
                return Err(AppError::Config(format!(
                    "Invalid SHELTER_LOG_FORMAT: {other}"
                )))
            }
        };

        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").ok().filter(|k| !k.is_empty());

        let stripe_api_base = env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let currency = env::var("SHELTER_CURRENCY")
            .unwrap_or_else(|_| "usd".to_string())
            .to_lowercase();

        let defaults = AmountBounds::default();
        let donation_bounds = AmountBounds {
            min_cents: parse_cents("SHELTER_MIN_DONATION_CENTS", defaults.min_cents)?,
            max_cents: parse_cents("SHELTER_MAX_DONATION_CENTS", defaults.max_cents)?,
        };
        if donation_bounds.min_cents > donation_bounds.max_cents {
            return Err(AppError::Config(
                "SHELTER_MIN_DONATION_CENTS exceeds SHELTER_MAX_DONATION_CENTS".to_string(),
            ));
        }

        Ok(Self {
            admin_psk,
            db_path,
            bind_addr,
            log_level,
            log_format,
            stripe_secret_key,
            stripe_api_base,
            currency,
            donation_bounds,
        })
    }
}

fn parse_cents(key: &str, default: i64) -> Result<i64, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}
