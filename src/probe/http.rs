//! HTTP(S) GET probe.
//!
//! # Responsibilities
//! - Issue one GET against the target URL under the attempt deadline
//! - Treat only `200 OK` as healthy
//! - Drain the response body before returning, whatever the status

use reqwest::{Client, StatusCode};
use tokio::time;

use super::{error_chain, ProbeFailure, ProbeOutcome, Target};
use crate::resilience::deadline::AttemptDeadline;

const USER_AGENT: &str = concat!("waiton/", env!("CARGO_PKG_VERSION"));

/// HTTP probe owning its own client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    target: Target,
    client: Client,
}

impl HttpProbe {
    pub fn new(target: Target) -> Result<Self, ProbeFailure> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProbeFailure::Setup(error_chain(&e)))?;

        Ok(Self { target, client })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub async fn attempt(&self, deadline: AttemptDeadline) -> ProbeOutcome {
        let url = self.target.address();
        let request = self.client.get(url).send();

        let response = match time::timeout_at(deadline.at, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::debug!(url = %url, error = %e, "HTTP probe failed: request error");
                return Err(classify(&e, &deadline));
            }
            Err(_) => {
                tracing::debug!(url = %url, "HTTP probe failed: timeout");
                return Err(deadline.expired());
            }
        };

        let status = response.status();

        // Body is drained (or dropped on timeout) before the verdict is returned.
        if time::timeout_at(deadline.at, response.bytes()).await.is_err() {
            tracing::debug!(url = %url, "Response body not drained before deadline");
        }

        if status == StatusCode::OK {
            Ok(())
        } else {
            tracing::debug!(url = %url, status = %status, "HTTP probe failed: non-success status");
            Err(ProbeFailure::Status(status.as_u16()))
        }
    }
}

fn classify(err: &reqwest::Error, deadline: &AttemptDeadline) -> ProbeFailure {
    if err.is_timeout() {
        deadline.expired()
    } else if err.is_connect() {
        ProbeFailure::Connect(error_chain(err))
    } else {
        ProbeFailure::NoResponse(error_chain(err))
    }
}
