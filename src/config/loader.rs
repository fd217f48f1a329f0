//! Configuration loading.
//!
//! Sources, lowest to highest precedence: defaults, TOML file, environment,
//! command-line flags. Environment keys are the uppercased flag names,
//! prefixed with `<WAITON_PREFIX>_` when that variable is set.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::{BackoffStrategy, OutputFormat, WaitConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::probe::target::split_list;

/// Names the prefix for environment-variable configuration.
pub const PREFIX_VAR: &str = "WAITON_PREFIX";

/// Flags read from bare environment names when no prefix is set. Kept to the
/// historical set so generic names like `OUTPUT` are never picked up.
const UNPREFIXED_FLAGS: &[&str] = &["urls", "globalTimeout", "urlTimeout", "maxRetries"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Env {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied by flags or environment; `None` keeps the lower layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub targets: Option<Vec<String>>,
    pub global_timeout: Option<Duration>,
    pub attempt_timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub backoff: Option<BackoffStrategy>,
    pub max_delay: Option<Duration>,
    pub log_level: Option<String>,
    pub output: Option<OutputFormat>,
}

impl WaitConfig {
    /// Layer `overrides` on top of this config.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(targets) = overrides.targets {
            self.targets = targets;
        }
        if let Some(d) = overrides.global_timeout {
            self.global_timeout_ms = d.as_millis() as u64;
        }
        if let Some(d) = overrides.attempt_timeout {
            self.attempt_timeout_ms = d.as_millis() as u64;
        }
        if let Some(n) = overrides.max_attempts {
            self.max_attempts = n;
        }
        if let Some(d) = overrides.retry_delay {
            self.retry.delay_ms = d.as_millis() as u64;
        }
        if let Some(strategy) = overrides.backoff {
            self.retry.strategy = strategy;
        }
        if let Some(d) = overrides.max_delay {
            self.retry.max_delay_ms = d.as_millis() as u64;
        }
        if let Some(level) = overrides.log_level {
            self.observability.log_level = level;
        }
        if let Some(output) = overrides.output {
            self.observability.output = output;
        }
    }
}

/// Read a TOML config file. Not validated: later layers may still fill gaps.
pub fn load_config(path: &Path) -> Result<WaitConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: WaitConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Read `<PREFIX>_<FLAG>` variables through `lookup`, or bare `<FLAG>` when
/// `prefix` is empty.
pub fn env_overrides<F>(prefix: &str, lookup: F) -> Result<ConfigOverrides, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |flag: &str| {
        let key = if prefix.is_empty() {
            if !UNPREFIXED_FLAGS.contains(&flag) {
                return None;
            }
            flag.to_ascii_uppercase()
        } else {
            format!("{}_{}", prefix, flag.to_ascii_uppercase())
        };
        lookup(&key).map(|value| (key, value))
    };

    let targets = get("urls")
        .map(|(_, v)| split_list(&v))
        .filter(|t| !t.is_empty());

    Ok(ConfigOverrides {
        targets,
        global_timeout: get("globalTimeout").map(parse_duration).transpose()?,
        attempt_timeout: get("urlTimeout").map(parse_duration).transpose()?,
        max_attempts: get("maxRetries").map(parse_value::<u32>).transpose()?,
        retry_delay: get("retryDelay").map(parse_duration).transpose()?,
        backoff: get("backoff").map(parse_value::<BackoffStrategy>).transpose()?,
        max_delay: get("maxDelay").map(parse_duration).transpose()?,
        log_level: get("logLevel").map(|(_, v)| v),
        output: get("output").map(parse_value::<OutputFormat>).transpose()?,
    })
}

fn parse_duration((key, value): (String, String)) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Env {
        reason: e.to_string(),
        key,
        value,
    })
}

fn parse_value<T>((key, value): (String, String)) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        reason: e.to_string(),
        key,
        value,
    })
}

/// Merge every layer and validate the result.
pub fn resolve<F>(
    file: Option<&Path>,
    env_prefix: Option<&str>,
    lookup: F,
    cli: ConfigOverrides,
) -> Result<WaitConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match file {
        Some(path) => load_config(path)?,
        None => WaitConfig::default(),
    };

    config.apply(env_overrides(env_prefix.unwrap_or(""), lookup)?);
    config.apply(cli);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
