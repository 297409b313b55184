/// Configuration for a suite run
///
/// This module loads configuration from environment variables (and a `.env`
/// file when present) into a type-safe struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_CONNECT_TIMEOUT_SECONDS`, `DATABASE_STATEMENT_TIMEOUT_SECONDS`:
///   see [`ConnectionConfig`]
/// - `SKARB_BASE_URL`: home page of the application under test
///   (default: http://localhost:3000)
/// - `SKARB_NGO_LOGIN` / `SKARB_NGO_PASSWORD`: pre-provisioned NGO account
///   (optional, both or neither)
/// - `VERIFY_RETRY_ATTEMPTS`: attempts for `wait_for_*` checks (default: 1)
/// - `VERIFY_RETRY_BACKOFF_MS`: first backoff between attempts (default: 250)
/// - `PROBE_LIMIT`: rows listed by `skarb-probe` (default: 5)
/// - `RUST_LOG`: log filter
///
/// # Example
///
/// ```no_run
/// use skarb_suite::config::SuiteConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = SuiteConfig::from_env()?;
/// println!("Testing {}", config.base_url);
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use skarb_verify::verify::retry::RetryPolicy;
use skarb_verify::ConnectionConfig;
use std::env;
use std::time::Duration;

/// Complete suite configuration
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Database the application writes to
    pub database: ConnectionConfig,

    /// Home page of the application under test
    pub base_url: String,

    /// Account used by scenarios that start signed in as an NGO
    pub ngo: Option<Credentials>,

    /// Retry configuration for eventually-consistent checks
    pub retry: RetryConfig,

    /// Rows listed by the probe binary
    pub probe_limit: i64,
}

/// Login and password of an existing account
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,

    /// Never serialized
    #[serde(skip_serializing)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub attempts: u32,

    /// First backoff in milliseconds; doubles per attempt
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff_ms: 250,
        }
    }
}

impl RetryConfig {
    /// The verifier policy this configuration describes
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.backoff_ms))
    }
}

impl SuiteConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A numeric variable does not parse
    /// - Only one of `SKARB_NGO_LOGIN` / `SKARB_NGO_PASSWORD` is set
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = ConnectionConfig::from_vars(&lookup)?;

        let base_url = lookup("SKARB_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let ngo = match (lookup("SKARB_NGO_LOGIN"), lookup("SKARB_NGO_PASSWORD")) {
            (Some(login), Some(password)) => Some(Credentials { login, password }),
            (None, None) => None,
            _ => anyhow::bail!("SKARB_NGO_LOGIN and SKARB_NGO_PASSWORD must be set together"),
        };

        let attempts = lookup("VERIFY_RETRY_ATTEMPTS")
            .unwrap_or_else(|| "1".to_string())
            .parse::<u32>()
            .context("VERIFY_RETRY_ATTEMPTS must be a positive integer")?;

        if attempts == 0 {
            anyhow::bail!("VERIFY_RETRY_ATTEMPTS must be at least 1");
        }

        let backoff_ms = lookup("VERIFY_RETRY_BACKOFF_MS")
            .unwrap_or_else(|| "250".to_string())
            .parse::<u64>()
            .context("VERIFY_RETRY_BACKOFF_MS must be an integer")?;

        let probe_limit = lookup("PROBE_LIMIT")
            .unwrap_or_else(|| "5".to_string())
            .parse::<i64>()
            .context("PROBE_LIMIT must be an integer")?;

        if probe_limit < 1 {
            anyhow::bail!("PROBE_LIMIT must be at least 1");
        }

        Ok(Self {
            database,
            base_url,
            ngo,
            retry: RetryConfig {
                attempts,
                backoff_ms,
            },
            probe_limit,
        })
    }
}
