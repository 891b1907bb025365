//! BaaS connection configuration
//!
//! Two values are required to talk to the hosted backend: its base URL and
//! the anonymous (public) API key. Both are validated at startup and the
//! service refuses to start if either is missing or malformed.

use crate::{ConfigError, RolodexResult};
use serde::{Deserialize, Serialize};

/// Environment variable holding the BaaS base URL.
pub const ENV_BAAS_URL: &str = "ROLODEX_BAAS_URL";

/// Environment variable holding the BaaS anonymous key.
pub const ENV_BAAS_ANON_KEY: &str = "ROLODEX_BAAS_ANON_KEY";

/// Connection settings for the hosted backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL without trailing slash, e.g. `https://abc.example.co`.
    pub url: String,
    /// Anonymous API key sent as `apikey` on every request.
    pub anon_key: String,
}

// The key is public but still kept out of logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

impl BackendConfig {
    /// Build and validate a configuration from explicit values.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> RolodexResult<Self> {
        let url = validate_url(ENV_BAAS_URL, &url.into())?;
        let anon_key = validate_key(ENV_BAAS_ANON_KEY, &anon_key.into())?;
        Ok(Self { url, anon_key })
    }

    /// Load from `ROLODEX_BAAS_URL` and `ROLODEX_BAAS_ANON_KEY`.
    pub fn from_env() -> RolodexResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> RolodexResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_BAAS_URL).ok_or_else(|| ConfigError::MissingRequired {
            field: ENV_BAAS_URL.to_string(),
        })?;
        let anon_key = lookup(ENV_BAAS_ANON_KEY).ok_or_else(|| ConfigError::MissingRequired {
            field: ENV_BAAS_ANON_KEY.to_string(),
        })?;
        Self::new(url, anon_key)
    }

    /// Join a path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

fn validate_url(field: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingRequired {
            field: field.to_string(),
        });
    }

    let invalid = |reason: &str| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("must be an absolute http(s) URL"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL has no host"));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

fn validate_key(field: &str, raw: &str) -> Result<String, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::MissingRequired {
            field: field.to_string(),
        });
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: "<redacted>".to_string(),
            reason: "key must not contain whitespace".to_string(),
        });
    }
    Ok(raw.to_string())
}
