// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The query-execution protocol client.
//!
//! [`ProtocolClient::query`] runs one question end-to-end: create a session,
//! submit the prompt, poll to completion, normalize the result into an
//! [`Insight`]. The client is stateless across queries -- every query gets a
//! fresh session -- and failures always propagate; converting them into
//! degraded successes is the cache layer's job alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fleetlens_config::model::{ProtocolConfig, ServiceConfig};
use fleetlens_core::{
    Credentials, CredentialsAdapter, FleetlensError, Insight, ResultPayload, SessionId,
    SubmissionId,
};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::poller::Poller;
use crate::transport::Transport;
use crate::types::functions;

/// Client for the session-based remote analytics service.
///
/// The service's session model does not reliably tolerate concurrent chats,
/// so the client holds a one-permit semaphore: queries from concurrent tasks
/// queue up and run strictly one at a time.
pub struct ProtocolClient {
    transport: Transport,
    protocol: ProtocolConfig,
    credentials: Arc<dyn CredentialsAdapter>,
    query_gate: Semaphore,
}

impl ProtocolClient {
    pub fn new(
        service: &ServiceConfig,
        protocol: &ProtocolConfig,
        credentials: Arc<dyn CredentialsAdapter>,
    ) -> Result<Self, FleetlensError> {
        Ok(Self {
            transport: Transport::new(service)?,
            protocol: protocol.clone(),
            credentials,
            query_gate: Semaphore::new(1),
        })
    }

    /// Execute one natural-language question end-to-end.
    pub async fn query(&self, question: &str) -> Result<Insight, FleetlensError> {
        let _permit = self
            .query_gate
            .acquire()
            .await
            .map_err(|_| FleetlensError::Internal("query gate closed".into()))?;

        let credentials = self.credentials.credentials().await?;
        let session = self.create_session(&credentials).await?;
        let submission = self.submit_prompt(&credentials, &session, question).await?;

        let poller = Poller::new(&self.transport, &self.protocol);
        let payload = poller
            .poll_until_done(&credentials, &session, &submission)
            .await?;

        Ok(normalize(question, payload))
    }

    /// Create a fresh session, retrying both transport errors and soft
    /// failures (structurally successful responses without a `chat_id`).
    ///
    /// Runs up to `create_attempts` attempts total with a fixed delay between
    /// them. The final error distinguishes "no session id returned" from a
    /// transport failure by propagating whichever kind the last attempt hit.
    async fn create_session(&self, credentials: &Credentials) -> Result<SessionId, FleetlensError> {
        let attempts = self.protocol.create_attempts;
        let delay = Duration::from_millis(self.protocol.create_retry_delay_ms);
        let mut last_error: Option<FleetlensError> = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                sleep(delay).await;
            }

            match self
                .transport
                .invoke_first(credentials, functions::CREATE, json!({}))
                .await
            {
                Ok(record) => match record.get("chat_id").and_then(Value::as_str) {
                    Some(chat_id) => {
                        debug!(attempt, "session created");
                        return Ok(SessionId(chat_id.to_string()));
                    }
                    None => {
                        warn!(attempt, "create response carried no chat_id");
                        last_error = Some(FleetlensError::Schema(format!(
                            "no session id returned by `create` after {attempts} attempts"
                        )));
                    }
                },
                Err(err) => {
                    warn!(attempt, error = %err, "session creation attempt failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FleetlensError::Internal("session creation ran no attempts".into())))
    }

    /// Submit the question into the session.
    ///
    /// The submission id appears at either `message_group_id` (top level) or
    /// `message_group.id` (nested), depending on the service release; both
    /// are checked in that order. This tolerance is deliberate compatibility
    /// with the remote service, not something to clean up.
    async fn submit_prompt(
        &self,
        credentials: &Credentials,
        session: &SessionId,
        question: &str,
    ) -> Result<SubmissionId, FleetlensError> {
        let record = self
            .transport
            .invoke_first(
                credentials,
                functions::SUBMIT,
                json!({
                    "chat_id": session.0,
                    "content": question,
                }),
            )
            .await?;

        let id = record
            .get("message_group_id")
            .and_then(Value::as_str)
            .or_else(|| {
                record
                    .pointer("/message_group/id")
                    .and_then(Value::as_str)
            })
            .ok_or_else(|| {
                FleetlensError::Schema(
                    "submit response carried neither message_group_id nor message_group.id".into(),
                )
            })?;

        Ok(SubmissionId(id.to_string()))
    }
}

/// Normalize a raw payload into the public [`Insight`] shape.
fn normalize(question: &str, payload: ResultPayload) -> Insight {
    Insight {
        id: uuid::Uuid::new_v4().to_string(),
        question: question.to_string(),
        columns: payload.columns.unwrap_or_default(),
        rows: payload.rows.unwrap_or_default(),
        reasoning: payload.reasoning,
        queried_at: Utc::now(),
        total_rows: payload.total_rows,
        download_url: payload.download_url,
        from_cache: false,
    }
}
