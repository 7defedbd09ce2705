//! Ledger policy settings loaded from a TOML file.
//!
//! Everything here is optional: a missing file yields [`Settings::default`], which keeps
//! the historical behaviour (ten-minute tokens, first admin collects recipient-less bills).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "WALLET_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "wallet.toml";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 10;
/// Longest validity window a token may be configured with: one day
pub const MAX_TOKEN_TTL_MINUTES: i64 = 24 * 60;

/// Top-level settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Payment token policy
    #[serde(default)]
    pub tokens: TokenSettings,
}

/// Payment token policy
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSettings {
    /// Validity window of a freshly issued token
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
    /// Who collects a bill that was issued without an explicit recipient
    #[serde(default)]
    pub fallback_recipient: FallbackRecipient,
}

const fn default_ttl_minutes() -> i64 {
    DEFAULT_TOKEN_TTL_MINUTES
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            fallback_recipient: FallbackRecipient::default(),
        }
    }
}

impl TokenSettings {
    /// Token validity window as a duration.
    ///
    /// # Errors
    /// Returns [`Error::Config`] unless `ttl_minutes` lies in
    /// `1..=`[`MAX_TOKEN_TTL_MINUTES`].
    pub fn ttl(&self) -> Result<chrono::Duration> {
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.ttl_minutes) {
            return Err(Error::Config {
                message: format!(
                    "tokens.ttl_minutes must be between 1 and {MAX_TOKEN_TTL_MINUTES}, got {}",
                    self.ttl_minutes
                ),
            });
        }
        chrono::Duration::try_minutes(self.ttl_minutes).ok_or_else(|| Error::Config {
            message: format!("tokens.ttl_minutes out of range: {}", self.ttl_minutes),
        })
    }
}

/// Collector used when a redeemed token names no recipient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FallbackRecipient {
    /// The admin user with the lowest id
    #[default]
    FirstAdmin,
    /// A fixed user, e.g. a campus treasury account
    User {
        /// Collecting user
        user_id: i64,
    },
    /// Reject recipient-less redemptions
    Disabled,
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read, the TOML is invalid, or the
/// token TTL is outside one minute to one day.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Loading settings from {path_ref:?}");
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {path_ref:?}: {e}"),
    })?;
    parse_settings(&contents)
}

fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;

    settings.tokens.ttl()?;
    Ok(settings)
}

/// Loads settings from `$WALLET_CONFIG` (default `./wallet.toml`), or returns the
/// defaults when that file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        info!("No settings file at {path}, using defaults");
        Ok(Settings::default())
    }
}
