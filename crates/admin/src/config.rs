//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL of this backend; `https://` enables `Secure` cookies
//! - `SITE_DOMAIN` - Domain the session cookies are scoped to
//! - `ADMIN_COOKIE_SECRET` - Key for signing the OAuth state cookie (min 64 chars, high entropy)
//! - `GOOGLE_CLIENT_ID` - Google OAuth2 client ID
//! - `GOOGLE_CLIENT_SECRET` - Google OAuth2 client secret
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_EMAILS` - Comma-separated allow-list of admin emails (default: empty, nobody)
//! - `ADMIN_HASH_COST` - bcrypt cost for session hashes (default: 14, range 4-31)
//! - `ADMIN_REQUEST_TIMEOUT_SECS` - Deadline for provider and store calls (default: 10)
//! - `GOOGLE_AUTH_URL`, `GOOGLE_TOKEN_URL`, `GOOGLE_USERINFO_URL` - Provider endpoints
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::models::CookieScope;
use crate::services::CredentialHasher;

/// `axum_extra`'s signing key needs at least 64 bytes of material.
const MIN_COOKIE_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const MIN_HASH_COST: u32 = 4;
const MAX_HASH_COST: u32 = 31;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const DEFAULT_GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin backend configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this backend
    pub base_url: Url,
    /// Domain attribute for session cookies
    pub site_domain: String,
    /// Signing key material for the OAuth state cookie
    pub cookie_secret: SecretString,
    /// Emails allowed to become admins
    pub admin_emails: Vec<String>,
    /// Google OAuth2 configuration
    pub google: GoogleConfig,
    /// bcrypt cost for session hashes
    pub hash_cost: u32,
    /// Deadline for each provider call and store query
    pub request_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Google OAuth2 client configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: SecretString,
    /// Where Google sends the browser back to (`{base_url}/auth/callback`)
    pub redirect_uri: Url,
    /// Consent screen endpoint
    pub auth_url: Url,
    /// Authorization-code exchange endpoint
    pub token_url: Url,
    /// Profile endpoint
    pub userinfo_url: Url,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("userinfo_url", &self.userinfo_url.as_str())
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`AdminConfig::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env
            .optional("ADMIN_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("ADMIN_DATABASE_URL".to_string()))?;
        let host = env.parsed_or("ADMIN_HOST", "127.0.0.1".parse::<IpAddr>())?;
        let port = env.parsed_or("ADMIN_PORT", Ok::<u16, std::num::ParseIntError>(3001))?;

        let base_url = env.url("ADMIN_BASE_URL", None)?;
        let site_domain = env.required("SITE_DOMAIN")?;
        let cookie_secret = env.validated_secret("ADMIN_COOKIE_SECRET")?;
        validate_cookie_secret(&cookie_secret, "ADMIN_COOKIE_SECRET")?;
        let admin_emails = parse_email_list(env.optional("ADMIN_EMAILS").as_deref());

        let google = GoogleConfig::from_env(&env, &base_url)?;

        let hash_cost = env.parsed_or(
            "ADMIN_HASH_COST",
            Ok::<u32, std::num::ParseIntError>(CredentialHasher::DEFAULT_COST),
        )?;
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&hash_cost) {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_HASH_COST".to_string(),
                format!("must be between {MIN_HASH_COST} and {MAX_HASH_COST}"),
            ));
        }
        let request_timeout = Duration::from_secs(env.parsed_or(
            "ADMIN_REQUEST_TIMEOUT_SECS",
            Ok::<u64, std::num::ParseIntError>(DEFAULT_REQUEST_TIMEOUT_SECS),
        )?);
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            site_domain,
            cookie_secret,
            admin_emails,
            google,
            hash_cost,
            request_timeout,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Cookie scope derived from the site domain and base URL scheme.
    #[must_use]
    pub fn cookie_scope(&self) -> CookieScope {
        CookieScope {
            domain: self.site_domain.clone(),
            secure: self.base_url.scheme() == "https",
        }
    }
}

impl GoogleConfig {
    fn from_env(env: &Env<'_>, base_url: &Url) -> Result<Self, ConfigError> {
        let redirect = format!("{}/auth/callback", base_url.as_str().trim_end_matches('/'));
        let redirect_uri = Url::parse(&redirect)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            client_id: env.required("GOOGLE_CLIENT_ID")?,
            client_secret: SecretString::from(env.required("GOOGLE_CLIENT_SECRET")?),
            redirect_uri,
            auth_url: env.url("GOOGLE_AUTH_URL", Some(DEFAULT_GOOGLE_AUTH_URL))?,
            token_url: env.url("GOOGLE_TOKEN_URL", Some(DEFAULT_GOOGLE_TOKEN_URL))?,
            userinfo_url: env.url("GOOGLE_USERINFO_URL", Some(DEFAULT_GOOGLE_USERINFO_URL))?,
        })
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Variable source shared by the loaders.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, or use `default` if unset.
    fn parsed_or<T, E>(&self, key: &str, default: Result<T, E>) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = E>,
        E: std::fmt::Display,
    {
        self.optional(key)
            .map_or(default, |v| v.trim().parse())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse an http(s) URL, falling back to `default` if given.
    fn url(&self, key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
        let raw = match (self.optional(key), default) {
            (Some(v), _) => v,
            (None, Some(d)) => d.to_string(),
            (None, None) => return Err(ConfigError::MissingEnvVar(key.to_string())),
        };
        let url = Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be an http or https URL".to_string(),
            ));
        }
        Ok(url)
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Split a comma-separated allow-list, dropping blanks. Case is preserved.
fn parse_email_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Validate that the cookie signing secret meets minimum length requirements.
fn validate_cookie_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_COOKIE_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_COOKIE_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
