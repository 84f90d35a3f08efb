use std::env;

use crate::token::DEFAULT_TOKEN_TTL_DAYS;

/// Signing secret used when running locally without `JWT_SECRET`.
pub const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

// bcrypt's accepted work-factor range.
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded
/// and shared read-only by every request through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which settings are mandatory.
    pub env: Env,
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // Secret key used to sign and verify session credentials.
    pub jwt_secret: String,
    // Credential validity window, in days.
    pub token_ttl_days: i64,
    pub bind_addr: String,
    pub bcrypt_cost: u32,
    // Optional administrator created at startup if missing.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

/// Env
///
/// The runtime context: local development or production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests: local mode, in-memory store,
    /// a fixed secret and the cheapest bcrypt cost.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            bind_addr: "127.0.0.1:0".to_string(),
            bcrypt_cost: MIN_BCRYPT_COST,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics if a setting required for the current environment is missing or
    /// malformed (`JWT_SECRET` and `DATABASE_URL` in production, any
    /// unparsable number). The server must not start half-configured.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };
        assert!(
            !jwt_secret.trim().is_empty(),
            "FATAL: JWT_SECRET must not be empty."
        );

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
            ),
            Env::Local => env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
        };

        let token_ttl_days = match env::var("TOKEN_TTL_DAYS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .expect("FATAL: TOKEN_TTL_DAYS must be a positive integer"),
            Err(_) => DEFAULT_TOKEN_TTL_DAYS,
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|cost| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(cost))
                .expect("FATAL: BCRYPT_COST must be between 4 and 31"),
            Err(_) => 10,
        };

        Self {
            env,
            db_url,
            jwt_secret,
            token_ttl_days,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            bcrypt_cost,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }
}
