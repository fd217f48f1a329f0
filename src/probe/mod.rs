//! Probe strategies.
//!
//! # Data Flow
//! ```text
//! raw endpoint string
//!     → target.rs (parse, scheme check)
//!     → Probe::for_target (pick strategy)
//!     → http.rs | tcp.rs (one attempt under an AttemptDeadline)
//!     → ProbeOutcome
//! ```
//!
//! # Design Decisions
//! - The set of schemes is closed, so strategies are enum variants
//! - A probe performs exactly one attempt; retrying belongs to the engine
//! - Every attempt is bounded by the deadline it is handed

pub mod http;
pub mod target;
pub mod tcp;

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::resilience::deadline::{AttemptDeadline, DeadlineBound};

pub use http::HttpProbe;
pub use target::{Scheme, Target, TargetError};
pub use tcp::TcpProbe;

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// Connection refused, unreachable host, DNS failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// A response arrived with a status other than 200.
    #[error("request returned status {0}")]
    Status(u16),

    /// The request was sent but no usable response came back.
    #[error("no response: {0}")]
    NoResponse(String),

    /// The per-attempt timeout elapsed.
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),

    /// The global deadline cut the attempt short.
    #[error("context canceled: global deadline reached")]
    Canceled,

    /// The probe could not be built (e.g. TLS backend initialisation).
    #[error("probe setup failed: {0}")]
    Setup(String),
}

/// Result of one attempt.
pub type ProbeOutcome = Result<(), ProbeFailure>;

impl AttemptDeadline {
    /// Failure to report when this deadline fires before the attempt ends.
    pub fn expired(&self) -> ProbeFailure {
        match self.bound {
            DeadlineBound::Global => ProbeFailure::Canceled,
            DeadlineBound::PerAttempt => ProbeFailure::TimedOut(self.attempt_timeout),
        }
    }
}

/// One health-check strategy bound to its target.
#[derive(Debug, Clone)]
pub enum Probe {
    Http(HttpProbe),
    Tcp(TcpProbe),
}

impl Probe {
    /// Build the strategy matching the target's scheme.
    pub fn for_target(target: &Target) -> Result<Self, ProbeFailure> {
        match target.scheme() {
            Scheme::Http | Scheme::Https => Ok(Probe::Http(HttpProbe::new(target.clone())?)),
            Scheme::Tcp => Ok(Probe::Tcp(TcpProbe::new(target.clone()))),
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            Probe::Http(p) => p.target(),
            Probe::Tcp(p) => p.target(),
        }
    }

    /// Perform exactly one attempt, bounded by `deadline`.
    pub async fn attempt(&self, deadline: AttemptDeadline) -> ProbeOutcome {
        match self {
            Probe::Http(p) => p.attempt(deadline).await,
            Probe::Tcp(p) => p.attempt(deadline).await,
        }
    }
}

/// Render an error with its source chain, `outer: inner: root`.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !out.contains(&cause_text) {
            out.push_str(": ");
            out.push_str(&cause_text);
        }
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::deadline::{compose, GlobalDeadline};

    #[test]
    fn dispatches_on_scheme() {
        let http = Target::parse("https://example.com/ready").unwrap();
        assert!(matches!(Probe::for_target(&http).unwrap(), Probe::Http(_)));

        let tcp = Target::parse("tcp://127.0.0.1:1").unwrap();
        let probe = Probe::for_target(&tcp).unwrap();
        assert!(matches!(probe, Probe::Tcp(_)));
        assert_eq!(probe.target(), &tcp);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_maps_to_failure_kind() {
        let far = GlobalDeadline::after(Duration::from_secs(60));
        let d = compose(far, Duration::from_secs(1));
        assert_eq!(d.expired(), ProbeFailure::TimedOut(Duration::from_secs(1)));

        let near = GlobalDeadline::after(Duration::from_millis(10));
        assert_eq!(compose(near, Duration::from_secs(1)).expired(), ProbeFailure::Canceled);
    }

    #[test]
    fn failure_messages() {
        assert_eq!(ProbeFailure::Status(500).to_string(), "request returned status 500");
        assert!(ProbeFailure::Canceled.to_string().contains("canceled"));
    }
}
