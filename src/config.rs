//! Process configuration.
//!
//! A [`Config`] is loaded once at startup and shared read-only by the
//! extractor, the transport client and the webhook router.

use std::{env, fmt, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;

/// Default Graph API version
const DEFAULT_API_VERSION: &str = "23.0";
/// Default Graph API host
const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

const ACCOUNT_ID: &str = "ACCOUNT_ID";
const PHONE_NUMBER_ID: &str = "PHONE_NUMBER_ID";
const ACCESS_TOKEN: &str = "WHATSAPP_ACCESS_TOKEN";
const VERIFY_TOKEN: &str = "VERIFY_TOKEN";
const API_VERSION: &str = "WHATSAPP_API_VERSION";
const BASE_URL: &str = "WHATSAPP_API_BASE_URL";
const TIMEOUT_SECS: &str = "WHATSAPP_TIMEOUT_SECS";

/// Identity and credentials for one WhatsApp Business phone number.
///
/// `account_id` and `phone_number_id` filter inbound webhook traffic; the
/// access token authenticates outbound sends; the verify token answers the
/// webhook subscription handshake.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use whatsapp_cloud_bridge::Config;
///
/// let config = Config::new("WABA_ID", "PHONE_NUMBER_ID", "ACCESS_TOKEN", "VERIFY_TOKEN")
///     .api_version("v23.0")
///     .timeout(Duration::from_secs(10));
///
/// assert_eq!(config.api_version, "23.0");
/// ```
#[derive(Deserialize, Clone, PartialEq)]
pub struct Config {
    /// The WhatsApp Business Account id expected in `entry[].id`.
    pub account_id: String,
    /// The phone number id expected in `metadata.phone_number_id`; also the
    /// path segment of the messages endpoint.
    pub phone_number_id: String,
    pub access_token: String,
    pub verify_token: String,
    /// Graph API version without the leading `v` (e.g. `23.0`).
    #[serde(default = "default_api_version", deserialize_with = "deserialize_version")]
    pub api_version: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, rename = "timeout_secs", deserialize_with = "deserialize_secs")]
    pub timeout: Option<Duration>,
}

impl Config {
    /// Creates a configuration with the default API version and host.
    pub fn new(
        account_id: impl Into<String>,
        phone_number_id: impl Into<String>,
        access_token: impl Into<String>,
        verify_token: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            phone_number_id: phone_number_id.into(),
            access_token: access_token.into(),
            verify_token: verify_token.into(),
            api_version: default_api_version(),
            base_url: default_base_url(),
            timeout: None,
        }
    }

    /// Loads the configuration from the process environment.
    ///
    /// Required: `ACCOUNT_ID`, `PHONE_NUMBER_ID`, `WHATSAPP_ACCESS_TOKEN`,
    /// `VERIFY_TOKEN`. Optional: `WHATSAPP_API_VERSION`, `WHATSAPP_API_BASE_URL`,
    /// `WHATSAPP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            required(ACCOUNT_ID)?,
            required(PHONE_NUMBER_ID)?,
            required(ACCESS_TOKEN)?,
            required(VERIFY_TOKEN)?,
        );

        if let Some(version) = optional(API_VERSION) {
            config = config.api_version(version);
        }

        if let Some(base_url) = optional(BASE_URL) {
            config = config.base_url(base_url);
        }

        if let Some(secs) = optional(TIMEOUT_SECS) {
            let secs = secs.parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                name: TIMEOUT_SECS,
                value: secs.clone(),
            })?;
            config = config.timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the Graph API version. A leading `v` is accepted and stripped.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = normalize_version(version.into());
        self
    }

    /// Overrides the Graph API host (useful for tests and proxies).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout used by the transport client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The full messages endpoint for the configured phone number.
    pub fn messages_endpoint(&self) -> String {
        format!(
            "{}/v{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            self.phone_number_id
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("account_id", &self.account_id)
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &"<redacted>")
            .field("verify_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_owned()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn normalize_version(version: String) -> String {
    match version.strip_prefix('v') {
        Some(stripped) => stripped.to_owned(),
        None => version,
    }
}

fn deserialize_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(normalize_version)
}

fn deserialize_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(<Option<u64>>::deserialize(deserializer)?.map(Duration::from_secs))
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
