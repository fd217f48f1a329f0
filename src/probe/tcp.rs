//! TCP connect probe.

use tokio::net::TcpStream;
use tokio::time;

use super::{ProbeFailure, ProbeOutcome, Target};
use crate::resilience::deadline::AttemptDeadline;

/// Succeeds when a TCP connection can be established. No data is exchanged.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    target: Target,
}

impl TcpProbe {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub async fn attempt(&self, deadline: AttemptDeadline) -> ProbeOutcome {
        let addr = self.target.address();

        match time::timeout_at(deadline.at, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::debug!(addr = %addr, error = %e, "TCP probe failed: connection error");
                Err(ProbeFailure::Connect(e.to_string()))
            }
            Err(_) => {
                tracing::debug!(addr = %addr, "TCP probe failed: timeout");
                Err(deadline.expired())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::deadline::{compose, GlobalDeadline};
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn deadline(timeout: Duration) -> AttemptDeadline {
        compose(GlobalDeadline::after(Duration::from_secs(30)), timeout)
    }

    #[tokio::test]
    async fn connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let probe = TcpProbe::new(Target::parse(&format!("tcp://{}", addr)).unwrap());

        assert_eq!(probe.attempt(deadline(Duration::from_secs(1))).await, Ok(()));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_failure() {
        // Bind then drop to get a port nobody listens on.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let probe = TcpProbe::new(Target::parse(&format!("tcp://{}", addr)).unwrap());

        let outcome = probe.attempt(deadline(Duration::from_secs(1))).await;
        assert!(matches!(outcome, Err(ProbeFailure::Connect(_))));
    }
}
