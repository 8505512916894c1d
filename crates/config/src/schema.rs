use crate::error::{ConfigError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::{collections::BTreeMap, time::Duration};

/// Every environment variable the relay reads.
pub const ENV_VARS: &[&str] = &[
    "PORT",
    "LISTEN_HOST",
    "API_KEY",
    "PROSPECT_TOKEN_API_URL",
    "PROSPECT_CLIENT_ID",
    "PROSPECT_CLIENT_SECRET",
    "PROSPECT_GRANT_TYPE",
    "PROSPECT_USERNAME",
    "PROSPECT_PASSWORD",
    "PROSPECT_LEAD_API_URL",
    "TOKEN_REFRESH_MARGIN",
    "UPSTREAM_TIMEOUT_SECS",
];

const DEFAULTS: &[(&str, &str)] = &[
    ("port", "3000"),
    ("listen_host", "0.0.0.0"),
    ("upstream_timeout_secs", "30"),
];

/// Resource-owner password grant credentials for the identity provider.
///
/// Only ever used to build the token request body.
#[derive(Debug)]
pub struct Credentials {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub username: String,
    pub password: SecretString,
}

/// The identity provider and lead-intake endpoints.
#[derive(Debug)]
pub struct ProspectConfig {
    /// Token endpoint (`PROSPECT_TOKEN_API_URL`).
    pub token_url: String,
    /// Lead-intake endpoint (`PROSPECT_LEAD_API_URL`).
    pub lead_url: String,
    pub credentials: Credentials,
}

/// Top-level application configuration.
#[derive(Debug)]
pub struct Config {
    /// Listen port (defaults to 3000).
    pub port: u16,
    /// Listen address (defaults to `0.0.0.0`).
    pub host: String,
    /// Static key callers must send in `x-api-key`.
    pub api_key: SecretString,
    pub prospect: ProspectConfig,
    /// Seconds before expiry at which a cached token is treated as stale.
    pub token_refresh_margin: u64,
    /// Timeout applied to every outbound request (defaults to 30 s).
    pub upstream_timeout: Duration,
}

/// Values exactly as they arrived, before any parsing.
///
/// Everything is a string so that secrets made only of digits keep their
/// leading zeros.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    port: Option<String>,
    listen_host: Option<String>,
    api_key: Option<String>,
    prospect_token_api_url: Option<String>,
    prospect_client_id: Option<String>,
    prospect_client_secret: Option<String>,
    prospect_grant_type: Option<String>,
    prospect_username: Option<String>,
    prospect_password: Option<String>,
    prospect_lead_api_url: Option<String>,
    token_refresh_margin: Option<String>,
    upstream_timeout_secs: Option<String>,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first variable that is missing or malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Loads configuration from `(NAME, value)` pairs, merged over defaults.
    ///
    /// Names that are not in [`ENV_VARS`] are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first variable that is missing or malformed.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        use figment::{Figment, providers::Serialized};

        let supplied: BTreeMap<String, String> = vars
            .into_iter()
            .filter(|(k, _)| ENV_VARS.contains(&k.as_ref()))
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            // Blank values fall back to the default, or count as missing.
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        let defaults: BTreeMap<&str, &str> = DEFAULTS.iter().copied().collect();

        let raw: RawConfig = Figment::from(Serialized::defaults(defaults))
            .merge(Serialized::defaults(supplied))
            .extract()
            .map_err(Box::new)?;
        raw.try_into()
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let port = parse_number::<u16>("PORT", required("PORT", raw.port)?)?;
        let token_refresh_margin = parse_number::<u64>(
            "TOKEN_REFRESH_MARGIN",
            required("TOKEN_REFRESH_MARGIN", raw.token_refresh_margin)?,
        )?;
        let timeout_secs = parse_number::<u64>(
            "UPSTREAM_TIMEOUT_SECS",
            required("UPSTREAM_TIMEOUT_SECS", raw.upstream_timeout_secs)?,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "UPSTREAM_TIMEOUT_SECS",
                reason: "must be at least 1 second".into(),
            });
        }

        let token_url = http_url(
            "PROSPECT_TOKEN_API_URL",
            required("PROSPECT_TOKEN_API_URL", raw.prospect_token_api_url)?,
        )?;
        let lead_url = http_url(
            "PROSPECT_LEAD_API_URL",
            required("PROSPECT_LEAD_API_URL", raw.prospect_lead_api_url)?,
        )?;

        let credentials = Credentials {
            grant_type: required("PROSPECT_GRANT_TYPE", raw.prospect_grant_type)?,
            client_id: required("PROSPECT_CLIENT_ID", raw.prospect_client_id)?,
            client_secret: required("PROSPECT_CLIENT_SECRET", raw.prospect_client_secret)?
                .into(),
            username: required("PROSPECT_USERNAME", raw.prospect_username)?,
            password: required("PROSPECT_PASSWORD", raw.prospect_password)?.into(),
        };

        Ok(Self {
            port,
            host: required("LISTEN_HOST", raw.listen_host)?,
            api_key: required("API_KEY", raw.api_key)?.into(),
            prospect: ProspectConfig {
                token_url,
                lead_url,
                credentials,
            },
            token_refresh_margin,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Empty values count as missing.
fn required(var: &'static str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn parse_number<T>(var: &'static str, value: String) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("expected an unsigned integer, got {value:?} ({e})"),
    })
}

fn http_url(var: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::Invalid {
            var,
            reason: format!("expected an http(s) URL, got {trimmed:?}"),
        })
    }
}
