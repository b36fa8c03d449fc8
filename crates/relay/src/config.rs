//! Relay configuration loaded from environment variables.
//!
//! Configuration is read exactly once at startup and handed to every
//! component through [`crate::state::AppState`]. Nothing else reads the
//! environment.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ENV_PACHCA_URL` - Pachca API base URL (e.g. `https://api.pachca.com/api/shared/v1`)
//! - `ENV_PACHCA_KEY` - Pachca bot access token
//! - `ENV_PACHCA_INTERNAL_CHAT_ID` - Chat that receives release notifications
//!
//! ## Optional
//! - `ENV_PACHCA_SIGNING_SECRET` - Verify `Pachca-Signature` on incoming webhooks
//! - `ENV_GITLAB_WEBHOOK_TOKEN` - Require a matching `X-Gitlab-Token` on CI webhooks
//! - `RELAY_HOST` - Bind address (default: 0.0.0.0)
//! - `RELAY_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use release_relay_core::ChatId;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
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

/// Relay application configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Pachca API configuration
    pub pachca: PachcaConfig,
    /// Shared token expected in `X-Gitlab-Token` (optional)
    pub gitlab_webhook_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Pachca API configuration.
///
/// Implements `Debug` manually to redact the token and signing secret.
#[derive(Clone)]
pub struct PachcaConfig {
    /// API base URL
    pub base_url: Url,
    /// Bot access token
    pub api_key: SecretString,
    /// Chat that receives release notifications
    pub internal_chat_id: ChatId,
    /// Webhook signing secret (optional, enables signature checks)
    pub signing_secret: Option<SecretString>,
}

impl std::fmt::Debug for PachcaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PachcaConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("internal_chat_id", &self.internal_chat_id)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env
            .or_default("RELAY_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("RELAY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_PORT".to_string(), e.to_string()))?;

        let pachca = PachcaConfig::from_env(&env)?;
        let gitlab_webhook_token = env.optional("ENV_GITLAB_WEBHOOK_TOKEN").map(SecretString::from);

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            host,
            port,
            pachca,
            gitlab_webhook_token,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Check every configured secret for placeholders and low entropy.
    ///
    /// Weak secrets do not stop the relay. The caller logs these once
    /// logging is up.
    #[must_use]
    pub fn secret_warnings(&self) -> Vec<ConfigError> {
        let secrets = [
            ("ENV_PACHCA_KEY", Some(&self.pachca.api_key)),
            (
                "ENV_PACHCA_SIGNING_SECRET",
                self.pachca.signing_secret.as_ref(),
            ),
            ("ENV_GITLAB_WEBHOOK_TOKEN", self.gitlab_webhook_token.as_ref()),
        ];

        secrets
            .into_iter()
            .filter_map(|(name, secret)| {
                validate_secret_strength(secret?.expose_secret(), name).err()
            })
            .collect()
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PachcaConfig {
    fn from_env<F>(env: &Env<'_, F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = env.required("ENV_PACHCA_URL")?;
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ENV_PACHCA_URL".to_string(), e.to_string()))?;

        let api_key = env.required("ENV_PACHCA_KEY")?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ENV_PACHCA_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let internal_chat_id = env
            .required("ENV_PACHCA_INTERNAL_CHAT_ID")?
            .parse::<ChatId>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ENV_PACHCA_INTERNAL_CHAT_ID".to_string(), e.to_string())
            })?;

        let signing_secret = env
            .optional("ENV_PACHCA_SIGNING_SECRET")
            .map(SecretString::from);

        Ok(Self {
            base_url,
            api_key: SecretString::from(api_key),
            internal_chat_id,
            signing_secret,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Typed access over a key lookup.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a required variable. Empty values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Check that a secret is not a placeholder and has sufficient entropy.
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn required_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ENV_PACHCA_URL", "https://api.pachca.com/api/shared/v1"),
            ("ENV_PACHCA_KEY", "pK7vQ2mX9rT4wZ8nB3cF6hJ1"),
            ("ENV_PACHCA_INTERNAL_CHAT_ID", "198"),
        ]
    }

    #[test]
    fn test_loads_required_with_defaults() {
        let config = RelayConfig::from_lookup(lookup(&required_vars())).unwrap();

        assert_eq!(
            config.pachca.base_url.as_str(),
            "https://api.pachca.com/api/shared/v1"
        );
        assert_eq!(config.pachca.api_key.expose_secret(), "pK7vQ2mX9rT4wZ8nB3cF6hJ1");
        assert_eq!(config.pachca.internal_chat_id, ChatId::new(198));
        assert!(config.pachca.signing_secret.is_none());
        assert!(config.gitlab_webhook_token.is_none());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_required_vars_fail_fast() {
        for missing in ["ENV_PACHCA_URL", "ENV_PACHCA_KEY", "ENV_PACHCA_INTERNAL_CHAT_ID"] {
            let vars: Vec<_> = required_vars()
                .into_iter()
                .filter(|(k, _)| *k != missing)
                .collect();

            let err = RelayConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(&err, ConfigError::MissingEnvVar(key) if key == missing),
                "expected missing {missing}, got {err}"
            );
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars: Vec<_> = required_vars()
            .into_iter()
            .filter(|(k, _)| *k != "ENV_PACHCA_KEY")
            .collect();
        vars.push(("ENV_PACHCA_KEY", ""));

        assert!(matches!(
            RelayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::MissingEnvVar(key)) if key == "ENV_PACHCA_KEY"
        ));
    }

    #[test]
    fn test_invalid_chat_id() {
        let mut vars: Vec<_> = required_vars()
            .into_iter()
            .filter(|(k, _)| *k != "ENV_PACHCA_INTERNAL_CHAT_ID")
            .collect();
        vars.push(("ENV_PACHCA_INTERNAL_CHAT_ID", "general"));

        assert!(matches!(
            RelayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "ENV_PACHCA_INTERNAL_CHAT_ID"
        ));
    }

    #[test]
    fn test_invalid_url_and_port() {
        let mut vars: Vec<_> = required_vars()
            .into_iter()
            .filter(|(k, _)| *k != "ENV_PACHCA_URL")
            .collect();
        vars.push(("ENV_PACHCA_URL", "not a url"));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "ENV_PACHCA_URL"
        ));

        let mut vars = required_vars();
        vars.push(("RELAY_PORT", "70000"));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "RELAY_PORT"
        ));
    }

    #[test]
    fn test_optional_secrets_and_overrides() {
        let mut vars = required_vars();
        vars.extend([
            ("ENV_PACHCA_SIGNING_SECRET", "s1gn1ng-S3cr3t-qWeRtY"),
            ("ENV_GITLAB_WEBHOOK_TOKEN", "gl-T0k3n-zXcVbN"),
            ("RELAY_HOST", "127.0.0.1"),
            ("RELAY_PORT", "8080"),
            ("SENTRY_SAMPLE_RATE", "0.5"),
        ]);

        let config = RelayConfig::from_lookup(lookup(&vars)).unwrap();

        assert!(config.pachca.signing_secret.is_some());
        assert_eq!(
            config.gitlab_webhook_token.as_ref().unwrap().expose_secret(),
            "gl-T0k3n-zXcVbN"
        );
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert!((config.sentry_sample_rate - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pachca_config_debug_redacts_secrets() {
        let mut vars = required_vars();
        vars.push(("ENV_PACHCA_SIGNING_SECRET", "super_secret_signing_value"));
        let config = RelayConfig::from_lookup(lookup(&vars)).unwrap();

        let debug_output = format!("{:?}", config.pachca);

        assert!(debug_output.contains("api.pachca.com"));
        assert!(debug_output.contains("198"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("pK7vQ2mX9rT4wZ8nB3cF6hJ1"));
        assert!(!debug_output.contains("super_secret_signing_value"));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-api-key-here", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_secret_warnings_name_weak_secrets() {
        let config = RelayConfig::from_lookup(lookup(&required_vars())).unwrap();
        assert!(config.secret_warnings().is_empty());

        let mut vars = required_vars();
        vars.retain(|(k, _)| *k != "ENV_PACHCA_KEY");
        vars.extend([
            ("ENV_PACHCA_KEY", "your-pachca-token-here"),
            ("ENV_GITLAB_WEBHOOK_TOKEN", "aaaaaaaaaaaaaaaa"),
            ("ENV_PACHCA_SIGNING_SECRET", "sG4kL9pW2xV7qN3mR8tY5bH1"),
        ]);
        let config = RelayConfig::from_lookup(lookup(&vars)).unwrap();

        let warned: Vec<String> = config
            .secret_warnings()
            .into_iter()
            .map(|e| match e {
                ConfigError::InsecureSecret(name, _) => name,
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(warned, ["ENV_PACHCA_KEY", "ENV_GITLAB_WEBHOOK_TOKEN"]);
    }
}
