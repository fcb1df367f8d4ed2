// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling loop for submission completion.
//!
//! The service's completion times cluster in a 30-90s band, so the loop uses
//! a fixed cadence (not exponential backoff): one unconditional warm-up delay
//! before the first poll, then a constant interval between polls. All waits
//! suspend the calling task; no thread is ever blocked.

use std::time::Duration;

use fleetlens_config::model::ProtocolConfig;
use fleetlens_core::{Credentials, FleetlensError, PollStatus, ResultPayload, SessionId, SubmissionId};
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::transport::Transport;
use crate::types::{assemble_payload, find_download_url, functions, resolve_status};

/// Drives one submission to a terminal state.
pub struct Poller<'a> {
    transport: &'a Transport,
    first_delay: Duration,
    interval: Duration,
    max_attempts: u32,
}

impl<'a> Poller<'a> {
    pub fn new(transport: &'a Transport, config: &ProtocolConfig) -> Self {
        Self {
            transport,
            first_delay: Duration::from_millis(config.poll_first_delay_ms),
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.poll_max_attempts,
        }
    }

    /// The hard time ceiling this poller enforces:
    /// `first_delay + (max_attempts - 1) * interval`.
    pub fn ceiling(&self) -> Duration {
        self.first_delay + self.interval * self.max_attempts.saturating_sub(1)
    }

    /// Poll the submission until it reaches `DONE` and return its payload.
    ///
    /// `FAILED` and `ERROR` are terminal and fail immediately -- never
    /// retried. A missing or unknown status is non-terminal and polls again.
    /// Exhausting the attempt budget fails with the approximate elapsed time.
    pub async fn poll_until_done(
        &self,
        credentials: &Credentials,
        session: &SessionId,
        submission: &SubmissionId,
    ) -> Result<ResultPayload, FleetlensError> {
        // The service needs startup time after submission; polling immediately
        // only wastes a cycle.
        sleep(self.first_delay).await;

        for attempt in 1..=self.max_attempts {
            let results = self
                .transport
                .invoke(
                    credentials,
                    functions::STATUS,
                    json!({
                        "chat_id": session.0,
                        "message_group_id": submission.0,
                    }),
                )
                .await?;

            let Some(record) = results.first() else {
                if attempt == self.max_attempts {
                    return Err(FleetlensError::EmptyResult(format!(
                        "status still empty after {} poll attempts",
                        self.max_attempts
                    )));
                }
                debug!(attempt, "status results empty, polling again");
                sleep(self.interval).await;
                continue;
            };

            let status = resolve_status(record);
            debug!(attempt, %status, "submission status");

            match status {
                PollStatus::Done => {
                    let mut payload = assemble_payload(record);
                    // The download URL moves around between service releases;
                    // search the whole response for it.
                    if let Some(url) = results.iter().find_map(|r| find_download_url(r, 0)) {
                        payload.download_url = Some(url);
                    }
                    return Ok(payload);
                }
                PollStatus::Failed | PollStatus::Error => {
                    warn!(%status, "submission reached terminal failure");
                    return Err(FleetlensError::QueryFailed { status });
                }
                PollStatus::InProgress => {
                    if attempt < self.max_attempts {
                        sleep(self.interval).await;
                    }
                }
            }
        }

        Err(FleetlensError::PollTimeout {
            attempts: self.max_attempts,
            elapsed_secs: self.ceiling().as_secs(),
        })
    }
}
