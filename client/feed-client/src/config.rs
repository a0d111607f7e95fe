/// Configuration management for the feed client
///
/// Loads configuration from environment variables.
use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Display formatting
    pub display: DisplayConfig,
    /// Backend sync settings
    pub sync: SyncConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

/// How timestamps are rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// strftime pattern for dates older than a week
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Offset of the viewer's local zone from UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Backend sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Publish intents for the sync worker
    pub enabled: bool,
    /// Attempts per intent before it is rolled back
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay added per failed attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Upper bound on the delay between attempts
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Deadline for a single backend call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    pub filter: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

// Default values
fn default_date_format() -> String {
    "%-m/%-d/%Y".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_timeout_ms() -> u64 {
    5_000
}

/// Largest accepted value for any sync delay or deadline (10 minutes)
const MAX_SYNC_DELAY_MS: u64 = 600_000;

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            utc_offset_minutes: 0,
        }
    }
}

impl DisplayConfig {
    /// The viewer's zone as a chrono offset.
    pub fn offset(&self) -> FixedOffset {
        // Validated in Config::from_lookup; fall back to UTC for hand-built values.
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                env: "development".to_string(),
            },
            display: DisplayConfig::default(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig {
            env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
        };

        let display = DisplayConfig {
            date_format: lookup("FEED_DATE_FORMAT").unwrap_or_else(default_date_format),
            utc_offset_minutes: parse_var(&lookup, "FEED_UTC_OFFSET_MINUTES", 0)?,
        };
        if !crate::formatting::is_valid_date_format(&display.date_format) {
            return Err(anyhow!(
                "FEED_DATE_FORMAT is not a valid strftime pattern: {:?}",
                display.date_format
            ));
        }
        if display
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .is_none()
        {
            return Err(anyhow!(
                "FEED_UTC_OFFSET_MINUTES out of range: {}",
                display.utc_offset_minutes
            ));
        }

        let sync = SyncConfig {
            enabled: parse_var(&lookup, "FEED_SYNC_ENABLED", true)?,
            max_attempts: parse_var(&lookup, "FEED_SYNC_MAX_ATTEMPTS", default_max_attempts())?,
            retry_backoff_ms: parse_var(
                &lookup,
                "FEED_SYNC_RETRY_BACKOFF_MS",
                default_retry_backoff_ms(),
            )?,
            max_backoff_ms: parse_var(
                &lookup,
                "FEED_SYNC_MAX_BACKOFF_MS",
                default_max_backoff_ms(),
            )?,
            timeout_ms: parse_var(&lookup, "FEED_SYNC_TIMEOUT_MS", default_timeout_ms())?,
        };
        if sync.max_attempts == 0 {
            return Err(anyhow!("FEED_SYNC_MAX_ATTEMPTS must be at least 1"));
        }
        if sync.timeout_ms == 0 {
            return Err(anyhow!("FEED_SYNC_TIMEOUT_MS must be at least 1"));
        }
        for (key, value) in [
            ("FEED_SYNC_RETRY_BACKOFF_MS", sync.retry_backoff_ms),
            ("FEED_SYNC_MAX_BACKOFF_MS", sync.max_backoff_ms),
            ("FEED_SYNC_TIMEOUT_MS", sync.timeout_ms),
        ] {
            if value > MAX_SYNC_DELAY_MS {
                return Err(anyhow!(
                    "{} must be at most {}ms, got {}",
                    key,
                    MAX_SYNC_DELAY_MS,
                    value
                ));
            }
        }

        let logging = LoggingConfig {
            filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            json: parse_var(&lookup, "FEED_LOG_JSON", false)?,
        };

        Ok(Config {
            app,
            display,
            sync,
            logging,
        })
    }
}
