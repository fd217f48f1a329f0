//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → loader.rs (WAITON_PREFIX environment variables)
//!     → command-line flags
//!     → validation.rs (semantic checks, target parsing)
//!     → WaitConfig (validated, immutable)
//!     → RunPlan + GlobalDeadline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved
//! - All fields have defaults to allow minimal configs
//! - Any configuration error aborts before a single probe starts

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve, ConfigError, ConfigOverrides, PREFIX_VAR};
pub use schema::{BackoffStrategy, ObservabilityConfig, OutputFormat, RetryConfig, WaitConfig};
pub use validation::{validate_config, ValidationError};
