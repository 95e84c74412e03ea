//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `FRONTEND_URL` - Browser client origin (CORS, password reset links)
//! - `JWT_SECRET` - Session token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `SELEMPANGKU_HOST` - Bind address (default: 127.0.0.1)
//! - `SELEMPANGKU_PORT` - Listen port (default: 5000)
//! - `SESSION_TOKEN_TTL_HOURS` - Session token lifetime (default: 168)
//! - `UPLOAD_DIR` - Root directory for uploaded images (default: uploads)
//! - `APP_ENV` - `development` or `production` (default: production)
//! - `TOKEN_SWEEP_INTERVAL_SECS` - Expired OTP/reset token purge interval (default: 300)
//! - `TRUST_PROXY_HEADERS` - Key the auth rate limiter on `X-Forwarded-For` /
//!   `X-Real-IP` instead of the socket peer; only set behind a proxy that
//!   overwrites them (default: false)
//! - `SMTP_HOST`, `SMTP_PORT` (587), `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` -
//!   outbound email; when `SMTP_HOST` is unset email delivery is disabled
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Deployment environment. Development responses carry internal error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    Development,
    #[default]
    Production,
}

impl AppEnv {
    /// Whether internal error detail may be returned to clients.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::str::FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other}")),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser client origin
    pub frontend_url: String,
    /// Session token signing secret
    pub jwt_secret: SecretString,
    /// Lifetime of every issued session token
    pub session_ttl: Duration,
    /// Root directory for uploaded images
    pub upload_dir: PathBuf,
    /// Deployment environment
    pub app_env: AppEnv,
    /// How often expired verification codes are purged
    pub token_sweep_interval: Duration,
    /// Whether client IP headers set by a reverse proxy are trusted
    pub trust_proxy_headers: bool,
    /// Outbound email, if configured
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// SMTP configuration for transactional email.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl ApiConfig {
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

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = parse_env("SELEMPANGKU_HOST", "127.0.0.1")?;
        let port = parse_env("SELEMPANGKU_PORT", "5000")?;
        let frontend_url = get_required_env("FRONTEND_URL")?;
        url::Url::parse(&frontend_url)
            .map_err(|e| ConfigError::InvalidEnvVar("FRONTEND_URL".to_string(), e.to_string()))?;

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let ttl_hours: u64 = parse_env("SESSION_TOKEN_TTL_HOURS", "168")?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_TOKEN_TTL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let sweep_secs: u64 = parse_env("TOKEN_SWEEP_INTERVAL_SECS", "300")?;

        Ok(Self {
            database_url,
            host,
            port,
            frontend_url,
            jwt_secret,
            session_ttl: Duration::from_secs(ttl_hours * 3600),
            upload_dir: PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads")),
            app_env: parse_env("APP_ENV", "production")?,
            token_sweep_interval: Duration::from_secs(sweep_secs.max(1)),
            trust_proxy_headers: parse_env("TRUST_PROXY_HEADERS", "false")?,
            email: EmailConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    /// `None` when `SMTP_HOST` is unset; otherwise the rest of the group is required.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
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
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
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

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_jwt_secret_placeholder_rejected() {
        let result = validate_secret_strength("your-jwt-key-goes-here-1234567890", "JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_jwt_secret_low_entropy_rejected() {
        let result = validate_secret_strength(&"ab".repeat(20), "JWT_SECRET");
        assert!(result.is_err());
    }

    #[test]
    fn test_jwt_secret_valid() {
        let result = validate_secret_strength("q8Vd2LmZr7Kx0PwN4tYb9HcJ6sUe1GfA", "JWT_SECRET");
        assert!(result.is_ok());
    }

    #[test]
    fn test_jwt_secret_too_short() {
        let secret = SecretString::from("q8Vd2LmZr7Kx");
        assert!(validate_secret_length(&secret, "JWT_SECRET").is_err());
    }

    #[test]
    fn test_app_env_parse() {
        assert_eq!("development".parse::<AppEnv>(), Ok(AppEnv::Development));
        assert_eq!("PRODUCTION".parse::<AppEnv>(), Ok(AppEnv::Production));
        assert!("staging".parse::<AppEnv>().is_err());
        assert!(AppEnv::Development.is_development());
        assert!(!AppEnv::default().is_development());
    }

    #[test]
    fn test_parse_env_default() {
        let port: u16 = parse_env("SELEMPANGKU_TEST_UNSET_PORT", "5000").unwrap();
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_proxy_headers_untrusted_by_default() {
        let trusted: bool = parse_env("SELEMPANGKU_TEST_UNSET_PROXY", "false").unwrap();
        assert!(!trusted);
    }

    #[test]
    fn test_parse_env_invalid_default() {
        let result = parse_env::<u16>("SELEMPANGKU_TEST_UNSET_PORT", "not-a-port");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}
