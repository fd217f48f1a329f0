//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1)
//! - Parse every target so bad schemes fail before any probe runs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WaitConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::{BackoffStrategy, WaitConfig};
use crate::probe::{Target, TargetError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no url to test")]
    NoTargets,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("retry.max_delay_ms ({max_ms}) is below retry.delay_ms ({base_ms})")]
    MaxDelayBelowBase { base_ms: u64, max_ms: u64 },

    #[error(transparent)]
    Target(#[from] TargetError),
}

pub fn validate_config(config: &WaitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.targets.is_empty() {
        errors.push(ValidationError::NoTargets);
    }
    for raw in &config.targets {
        if let Err(e) = Target::parse(raw) {
            errors.push(e.into());
        }
    }

    if config.global_timeout_ms == 0 {
        errors.push(ValidationError::Zero("global_timeout"));
    }
    if config.attempt_timeout_ms == 0 {
        errors.push(ValidationError::Zero("attempt_timeout"));
    }
    if config.max_attempts == 0 {
        errors.push(ValidationError::Zero("max_attempts"));
    }

    if config.retry.strategy == BackoffStrategy::Exponential
        && config.retry.max_delay_ms < config.retry.delay_ms
    {
        errors.push(ValidationError::MaxDelayBelowBase {
            base_ms: config.retry.delay_ms,
            max_ms: config.retry.max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
