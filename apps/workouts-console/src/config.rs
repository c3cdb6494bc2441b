//! Environment-backed runtime configuration for `workouts-console`.

use std::{env, error::Error, fmt, time::Duration};

use client_http::HttpClientConfig;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://workouts.example.org/";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Runtime configuration used by the console app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// API root for every request and video link.
    pub base_url: Url,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Video to open; when `None` the first listed workout is used.
    pub video_id: Option<u32>,
    /// Whether content stays visible (loader hidden) once a request succeeds.
    pub show_content_on_success: bool,
}

impl ConsoleConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = match optional_trimmed_env("WORKOUTS_BASE_URL", &mut lookup) {
            Some(value) => Url::parse(&value).map_err(|err| ConfigError::InvalidValue {
                key: "WORKOUTS_BASE_URL",
                value,
                reason: err.to_string(),
            })?,
            None => Url::parse(DEFAULT_BASE_URL).map_err(|err| ConfigError::InvalidValue {
                key: "WORKOUTS_BASE_URL",
                value: DEFAULT_BASE_URL.to_owned(),
                reason: err.to_string(),
            })?,
        };

        let request_timeout_ms = parse_optional_u64(
            "WORKOUTS_REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT_MS,
            &mut lookup,
        )?;
        if request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "WORKOUTS_REQUEST_TIMEOUT_MS",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        let video_id = parse_optional_u32("WORKOUTS_VIDEO_ID", &mut lookup)?;
        let show_content_on_success =
            parse_optional_bool("WORKOUTS_SHOW_CONTENT_ON_SUCCESS", true, &mut lookup)?;

        Ok(Self {
            base_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
            video_id,
            show_content_on_success,
        })
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::new(self.base_url.clone()).with_request_timeout(self.request_timeout)
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}='{value}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_u32<F>(key: &'static str, lookup: &mut F) -> Result<Option<u32>, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(None);
    };
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_optional_u64<F>(
    key: &'static str,
    default: u64,
    lookup: &mut F,
) -> Result<u64, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(default);
    };
    value
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_optional_bool<F>(
    key: &'static str,
    default: bool,
    lookup: &mut F,
) -> Result<bool, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true or false".to_owned(),
        }),
    }
}
