//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file is a valid (if useless) config.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinator::RunPlan;
use crate::probe::TargetError;
use crate::resilience::{BackoffPolicy, RetryPolicy};

/// Root configuration for one run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Endpoints to wait for (`http://`, `https://`, `tcp://`).
    pub targets: Vec<String>,

    /// Time allowed for all targets to become available, in milliseconds.
    pub global_timeout_ms: u64,

    /// Time allowed for a single attempt, in milliseconds.
    pub attempt_timeout_ms: u64,

    /// Attempts per target before giving up.
    pub max_attempts: u32,

    /// Delay between attempts.
    pub retry: RetryConfig,

    /// Logging and output settings.
    pub observability: ObservabilityConfig,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            global_timeout_ms: 60_000,
            attempt_timeout_ms: 10_000,
            max_attempts: 100,
            retry: RetryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl WaitConfig {
    pub fn global_timeout(&self) -> Duration {
        Duration::from_millis(self.global_timeout_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// The policy every target of this run shares.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            attempt_timeout: self.attempt_timeout(),
            backoff: self.retry.policy(),
        }
    }

    /// Parse the targets into a run plan.
    pub fn plan(&self) -> Result<RunPlan, TargetError> {
        RunPlan::parse(&self.targets, self.retry_policy())
    }
}

/// Inter-attempt delay settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// `fixed` (default) or `exponential`.
    pub strategy: BackoffStrategy,

    /// Fixed delay, or base delay for exponential backoff, in milliseconds.
    pub delay_ms: u64,

    /// Cap for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> BackoffPolicy {
        let delay = Duration::from_millis(self.delay_ms);
        match self.strategy {
            BackoffStrategy::Fixed => BackoffPolicy::Fixed(delay),
            BackoffStrategy::Exponential => BackoffPolicy::Exponential {
                base: delay,
                max: Duration::from_millis(self.max_delay_ms),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    #[default]
    Fixed,
    Exponential,
}

impl FromStr for BackoffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(BackoffStrategy::Fixed),
            "exponential" => Ok(BackoffStrategy::Exponential),
            other => Err(format!(
                "unknown backoff strategy '{}' (expected fixed or exponential)",
                other
            )),
        }
    }
}

/// Logging and report settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Report format written on completion.
    pub output: OutputFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Log lines only.
    #[default]
    Text,
    /// Log lines plus a JSON summary on stdout.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown output format '{}' (expected text or json)",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}
