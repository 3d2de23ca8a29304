//! Configuration management with environment variable support.
//!
//! All settings are gathered once at startup into a [`Config`] and passed by
//! reference into the session, compiler and executor. Nothing below the
//! entry point reads the environment directly.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `API_ID` | Chat API id (positive integer) | required |
//! | `API_HASH` | Chat API hash | required |
//! | `PHONE_NUMBER` | Account phone number, `+` followed by digits | required |
//! | `TG_PASSWORD` | Two-factor authentication password | none |
//! | `TARGET_BOT` | Username of the bot to drive | required |
//! | `STEP_DELAY` | Delay between successful steps (seconds) | `1` |
//! | `MAX_ATTEMPTS` | Maximum passes through the scenario | `1` |
//! | `RESTART_DELAY` | Delay before restarting a failed attempt (seconds) | `1200` |
//! | `STEPS_FILE` | Path to the scenario YAML | `steps.yaml` |
//! | `GATEWAY_URL` | Session gateway base URL | `http://127.0.0.1:8081` |
//! | `GATEWAY_TIMEOUT` | Gateway request timeout (seconds) | `30` |
//!
//! # Example
//!
//! ```bash
//! export API_ID=123456
//! export API_HASH=0123456789abcdef
//! export PHONE_NUMBER=+79990001122
//! export TARGET_BOT=clinic_booking_bot
//! export MAX_ATTEMPTS=5
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// Default Values
// ============================================================================

/// Default delay between successful steps (seconds)
pub const DEFAULT_STEP_DELAY: u64 = 1;

/// Default number of scenario attempts (no retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Default delay before a failed scenario is restarted (seconds)
pub const DEFAULT_RESTART_DELAY: u64 = 20 * 60;

/// Default scenario file
pub const DEFAULT_STEPS_FILE: &str = "steps.yaml";

/// Default session gateway endpoint
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8081";

/// Default gateway request timeout (seconds)
pub const DEFAULT_GATEWAY_TIMEOUT: u64 = 30;

/// Minimum accepted length of the API hash
const MIN_API_HASH_LEN: usize = 10;

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_API_ID: &str = "API_ID";
pub const ENV_API_HASH: &str = "API_HASH";
pub const ENV_PHONE_NUMBER: &str = "PHONE_NUMBER";
pub const ENV_PASSWORD: &str = "TG_PASSWORD";
pub const ENV_TARGET_BOT: &str = "TARGET_BOT";
pub const ENV_STEP_DELAY: &str = "STEP_DELAY";
pub const ENV_MAX_ATTEMPTS: &str = "MAX_ATTEMPTS";
pub const ENV_RESTART_DELAY: &str = "RESTART_DELAY";
pub const ENV_STEPS_FILE: &str = "STEPS_FILE";
pub const ENV_GATEWAY_URL: &str = "GATEWAY_URL";
pub const ENV_GATEWAY_TIMEOUT: &str = "GATEWAY_TIMEOUT";

// ============================================================================
// Errors
// ============================================================================

/// Malformed or incomplete configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path} must contain a top-level 'steps' list")]
    MissingSteps { path: PathBuf },

    #[error("step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },

    #[error("environment variable {var}: {reason}")]
    Env { var: &'static str, reason: String },
}

// ============================================================================
// Settings
// ============================================================================

/// Centralized configuration for one booking run
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat account credentials
    pub account: AccountSettings,
    /// Username of the bot being driven
    pub target_bot: String,
    /// Timing and retry policy for the step executor
    pub executor: ExecutorSettings,
    /// Session gateway connection
    pub gateway: GatewaySettings,
    /// Scenario YAML path
    pub steps_file: PathBuf,
}

/// Chat account credentials
#[derive(Clone)]
pub struct AccountSettings {
    pub api_id: i32,
    pub api_hash: String,
    pub phone_number: String,
    pub password: Option<String>,
}

// Keeps secrets out of logs.
impl std::fmt::Debug for AccountSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSettings")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("phone_number", &self.phone_number)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Step executor timing and retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Pause after each successful step before the next one
    pub step_delay: Duration,
    /// Maximum number of full passes through the scenario (at least 1)
    pub max_attempts: u32,
    /// Pause before a failed scenario is restarted from the first step
    pub restart_delay: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_secs(DEFAULT_STEP_DELAY),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            restart_delay: Duration::from_secs(DEFAULT_RESTART_DELAY),
        }
    }
}

impl ExecutorSettings {
    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }
}

/// Session gateway connection settings
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Base URL, without trailing slash
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GATEWAY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT),
        }
    }
}

impl Config {
    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_id: i32 = required(&var, ENV_API_ID)?
            .trim()
            .parse()
            .map_err(|e| env_error(ENV_API_ID, format!("not an integer: {e}")))?;
        if api_id <= 0 {
            return Err(env_error(ENV_API_ID, "must be a positive integer"));
        }

        let api_hash = required(&var, ENV_API_HASH)?;
        if api_hash.len() < MIN_API_HASH_LEN {
            return Err(env_error(
                ENV_API_HASH,
                format!("must be at least {MIN_API_HASH_LEN} characters"),
            ));
        }

        let phone_number = required(&var, ENV_PHONE_NUMBER)?.trim().to_string();
        validate_phone_number(&phone_number)?;

        let target_bot = required(&var, ENV_TARGET_BOT)?.trim().to_string();

        let max_attempts = parse_or(&var, ENV_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(env_error(ENV_MAX_ATTEMPTS, "must be at least 1"));
        }

        Ok(Self {
            account: AccountSettings {
                api_id,
                api_hash,
                phone_number,
                password: var(ENV_PASSWORD),
            },
            target_bot,
            executor: ExecutorSettings {
                step_delay: Duration::from_secs(parse_or(&var, ENV_STEP_DELAY, DEFAULT_STEP_DELAY)?),
                max_attempts,
                restart_delay: Duration::from_secs(parse_or(
                    &var,
                    ENV_RESTART_DELAY,
                    DEFAULT_RESTART_DELAY,
                )?),
            },
            gateway: GatewaySettings {
                endpoint: var(ENV_GATEWAY_URL)
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
                timeout: Duration::from_secs(parse_or(
                    &var,
                    ENV_GATEWAY_TIMEOUT,
                    DEFAULT_GATEWAY_TIMEOUT,
                )?),
            },
            steps_file: var(ENV_STEPS_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STEPS_FILE)),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn env_error(var: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Env {
        var,
        reason: reason.into(),
    }
}

fn required<F>(var: &F, name: &'static str) -> Result<String, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    var(name).ok_or_else(|| env_error(name, "is required"))
}

fn parse_or<F, T>(var: &F, name: &'static str, default: T) -> Result<T, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| env_error(name, format!("invalid value '{raw}': {e}"))),
        None => Ok(default),
    }
}

/// Phone numbers are `+` followed by digits only
fn validate_phone_number(phone: &str) -> Result<(), ConfigurationError> {
    let digits = phone.strip_prefix('+').unwrap_or("");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(env_error(
            ENV_PHONE_NUMBER,
            "must start with '+' and contain only digits",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        (ENV_API_ID, "12345"),
        (ENV_API_HASH, "0123456789abcdef"),
        (ENV_PHONE_NUMBER, "+79990001122"),
        (ENV_TARGET_BOT, "clinic_bot"),
    ];

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(MINIMAL)).unwrap();
        assert_eq!(config.executor, ExecutorSettings::default());
        assert_eq!(config.executor.step_delay, Duration::from_secs(1));
        assert_eq!(config.executor.max_attempts, 1);
        assert_eq!(config.executor.restart_delay, Duration::from_secs(1200));
        assert_eq!(config.steps_file, PathBuf::from(DEFAULT_STEPS_FILE));
        assert_eq!(config.gateway.endpoint, DEFAULT_GATEWAY_URL);
        assert!(config.account.password.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend([
            (ENV_STEP_DELAY, "3"),
            (ENV_MAX_ATTEMPTS, "4"),
            (ENV_RESTART_DELAY, "60"),
            (ENV_PASSWORD, "hunter2"),
            (ENV_GATEWAY_URL, "http://gateway:9000/"),
            (ENV_STEPS_FILE, "scenarios/dentist.yaml"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.executor.step_delay, Duration::from_secs(3));
        assert_eq!(config.executor.max_attempts, 4);
        assert_eq!(config.executor.restart_delay, Duration::from_secs(60));
        assert_eq!(config.account.password.as_deref(), Some("hunter2"));
        assert_eq!(config.gateway.endpoint, "http://gateway:9000");
        assert_eq!(config.steps_file, PathBuf::from("scenarios/dentist.yaml"));
    }

    #[test]
    fn test_missing_required_variable() {
        let pairs: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(k, _)| *k != ENV_TARGET_BOT)
            .collect();
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Env { var: ENV_TARGET_BOT, .. }));
    }

    #[test]
    fn test_phone_number_validation() {
        assert!(validate_phone_number("+79990001122").is_ok());
        assert!(validate_phone_number("79990001122").is_err());
        assert!(validate_phone_number("+7999-000").is_err());
        assert!(validate_phone_number("+").is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push((ENV_MAX_ATTEMPTS, "0"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Env { var: ENV_MAX_ATTEMPTS, .. }));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push((ENV_STEP_DELAY, "soon"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("STEP_DELAY"));
    }

    #[test]
    fn test_secrets_not_in_debug_output() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push((ENV_PASSWORD, "hunter2"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        let rendered = format!("{:?}", config.account);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("0123456789abcdef"));
    }
}
