//! Provider configuration.
//!
//! The engine passes the provider block as JSON to `configure`. `url` and
//! `token` may be left out of it and supplied through the `ZAMMAD_URL` and
//! `ZAMMAD_TOKEN` environment variables instead.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Environment variable consulted when `url` is not configured.
pub const URL_ENV: &str = "ZAMMAD_URL";

/// Environment variable consulted when `token` is not configured.
pub const TOKEN_ENV: &str = "ZAMMAD_TOKEN";

/// Request timeout used when `timeout_secs` is not configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings needed to talk to a Zammad instance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Zammad instance, e.g. `https://support.example.com`.
    pub url: String,
    /// API access token.
    pub token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Create a configuration with the default timeout.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build the configuration from the provider block, falling back to the
    /// process environment for `url` and `token`.
    pub fn from_value(config: serde_json::Value) -> Result<Self, ProviderError> {
        Self::from_value_with_env(config, |key| std::env::var(key).ok())
    }

    /// Like [`ProviderConfig::from_value`] with an explicit environment lookup.
    pub fn from_value_with_env(
        config: serde_json::Value,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProviderError> {
        let raw: RawConfig = if config.is_null() {
            RawConfig::default()
        } else {
            serde_json::from_value(config)?
        };

        let url = raw
            .url
            .filter(|u| !u.is_empty())
            .or_else(|| env(URL_ENV))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "missing Zammad URL: set `url` or the {} environment variable",
                    URL_ENV
                ))
            })?;
        let token = raw
            .token
            .filter(|t| !t.is_empty())
            .or_else(|| env(TOKEN_ENV))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "missing Zammad token: set `token` or the {} environment variable",
                    TOKEN_ENV
                ))
            })?;

        let config = Self {
            url,
            token,
            timeout_secs: raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ProviderError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ProviderError::Configuration(format!(
                "url must start with http:// or https://, got {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ProviderError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "url",
                Attribute::optional_string().with_description(format!(
                    "Base URL of the Zammad instance. Defaults to ${}.",
                    URL_ENV
                )),
            )
            .with_attribute(
                "token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("API access token. Defaults to ${}.", TOKEN_ENV)),
            )
            .with_attribute(
                "timeout_secs",
                Attribute::optional_int64().with_description("Per-request timeout in seconds."),
            )
    }
}
