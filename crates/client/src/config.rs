//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STAGEDOOR_API_BASE_URL` - Backend base URL (default: <http://localhost:3001/api>)
//! - `STAGEDOOR_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `STAGEDOOR_ADMIN_EMAIL_SUFFIX` - Email suffix treated as admin (default: @admin.com)
//! - `STAGEDOOR_SESSION_FILE` - Session storage file (default: .stagedoor/session.json)
//! - `TICKETMASTER_API_KEY` - Discovery API key (event listings are disabled without it)
//! - `STAGEDOOR_DISCOVERY_URL` - Discovery endpoint (default: Ticketmaster v2 events)
//! - `STAGEDOOR_DISCOVERY_PAGE_SIZE` - Events per page (default: 20)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";

/// Default upstream event discovery endpoint.
pub const DEFAULT_DISCOVERY_URL: &str = "https://app.ticketmaster.com/discovery/v2/events";

/// Default email suffix that marks an account as admin.
pub const DEFAULT_ADMIN_EMAIL_SUFFIX: &str = "@admin.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 200;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Email suffix that grants admin status regardless of stored role
    pub admin_email_suffix: String,
    /// Where the session is persisted between runs
    pub session_file: PathBuf,
    /// Upstream event discovery configuration
    pub discovery: DiscoveryConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every backend path is resolved against
    pub base_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl ApiConfig {
    /// Configuration for `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("STAGEDOOR_API_BASE_URL", base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// Event discovery configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DiscoveryConfig {
    /// Discovery endpoint URL
    pub endpoint: Url,
    /// API key sent as the `apikey` query parameter
    pub api_key: Option<SecretString>,
    /// Events per page
    pub page_size: u32,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl std::fmt::Debug for DiscoveryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid, or if the
    /// discovery API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let timeout = Duration::from_secs(get_parsed_env(
            "STAGEDOOR_REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "STAGEDOOR_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let api = ApiConfig {
            base_url: parse_base_url(
                "STAGEDOOR_API_BASE_URL",
                &get_env_or_default("STAGEDOOR_API_BASE_URL", DEFAULT_API_BASE_URL),
            )?,
            timeout,
        };

        let admin_email_suffix =
            get_env_or_default("STAGEDOOR_ADMIN_EMAIL_SUFFIX", DEFAULT_ADMIN_EMAIL_SUFFIX);
        if admin_email_suffix.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "STAGEDOOR_ADMIN_EMAIL_SUFFIX".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        let session_file = PathBuf::from(get_env_or_default(
            "STAGEDOOR_SESSION_FILE",
            ".stagedoor/session.json",
        ));

        let discovery = DiscoveryConfig::from_env(timeout)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api,
            admin_email_suffix,
            session_file,
            discovery,
            sentry_dsn,
        })
    }
}

impl DiscoveryConfig {
    fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(&get_env_or_default(
            "STAGEDOOR_DISCOVERY_URL",
            DEFAULT_DISCOVERY_URL,
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("STAGEDOOR_DISCOVERY_URL".to_string(), e.to_string()))?;

        let page_size = get_parsed_env("STAGEDOOR_DISCOVERY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "STAGEDOOR_DISCOVERY_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        let api_key = get_optional_env("TICKETMASTER_API_KEY")
            .map(|key| {
                validate_api_key(&key, "TICKETMASTER_API_KEY")?;
                Ok::<_, ConfigError>(SecretString::from(key))
            })
            .transpose()?;

        Ok(Self {
            endpoint,
            api_key,
            page_size,
            timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, appending a trailing slash so relative joins keep the path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get and parse an environment variable, falling back to `default` when unset.
fn get_parsed_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Reject API keys that are obviously copied from a sample `.env`.
fn validate_api_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = key.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("X", "http://localhost:3001/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/");
        assert_eq!(
            url.join("order/7").unwrap().as_str(),
            "http://localhost:3001/api/order/7"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_relative() {
        assert!(matches!(
            parse_base_url("X", "localhost/api"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_base_url("X", "mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_validate_api_key_placeholder() {
        let result = validate_api_key("your-api-key-here", "TICKETMASTER_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
        assert!(validate_api_key("CHANGEME", "TICKETMASTER_API_KEY").is_err());
    }

    #[test]
    fn test_validate_api_key_valid() {
        assert!(validate_api_key("Gx7kQ2mZp9LwB4vR8tYc1NhJ", "TICKETMASTER_API_KEY").is_ok());
    }

    #[test]
    fn test_api_config_defaults() {
        let api = ApiConfig::new(DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(api.timeout, Duration::from_secs(30));
        assert_eq!(api.base_url.as_str(), "http://localhost:3001/api/");
    }

    #[test]
    fn test_discovery_config_debug_redacts_key() {
        let config = DiscoveryConfig {
            endpoint: Url::parse(DEFAULT_DISCOVERY_URL).unwrap(),
            api_key: Some(SecretString::from("super_secret_discovery_key")),
            page_size: 20,
            timeout: Duration::from_secs(30),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("app.ticketmaster.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_discovery_key"));
    }
}
