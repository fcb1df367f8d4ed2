// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted mock of the remote analytics service.
//!
//! Wraps a wiremock server and mounts per-function responses, discriminated
//! by the `function` field of the request body exactly as the real endpoint
//! multiplexes calls. Mount order matters: earlier mocks win until their
//! `up_to_n_times` budget is spent, which is how status sequences are
//! scripted.

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A scripted remote analytics service for tests.
pub struct MockAnalyticsService {
    pub server: MockServer,
}

impl MockAnalyticsService {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Endpoint URL for `[service]` config.
    pub fn endpoint(&self) -> String {
        self.server.uri()
    }

    /// An endpoint nothing listens on, for unreachable-service tests.
    pub fn unreachable_endpoint() -> String {
        // Port 9 (discard) is never served in test environments.
        "http://127.0.0.1:9/rpc".to_string()
    }

    /// Wrap results in the service's response envelope.
    pub fn envelope(results: Value) -> Value {
        json!({"result": {"apiResult": {"results": results}}})
    }

    async fn mount_function(&self, function: &str, body: Value, times: Option<u64>) {
        let mut mock = Mock::given(method("POST"))
            .and(body_partial_json(json!({"function": function})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        if let Some(times) = times {
            mock = mock.up_to_n_times(times).expect(times);
        }
        mock.mount(&self.server).await;
    }

    /// `create` succeeds with the given session id.
    pub async fn on_create(&self, chat_id: &str) {
        self.mount_function("create", Self::envelope(json!([{"chat_id": chat_id}])), None)
            .await;
    }

    /// `create` returns a structurally successful response without a session
    /// id. Expects exactly `times` calls.
    pub async fn on_create_soft_failure(&self, times: u64) {
        self.mount_function("create", Self::envelope(json!([{}])), Some(times))
            .await;
    }

    /// `submit` succeeds with the given submission id (top-level shape).
    pub async fn on_submit(&self, message_group_id: &str) {
        self.mount_function(
            "submit",
            Self::envelope(json!([{"message_group_id": message_group_id}])),
            None,
        )
        .await;
    }

    /// `status` reports IN_PROGRESS `in_progress` times, then DONE carrying
    /// the given sub-messages.
    pub async fn on_status_progress_then_done(&self, in_progress: u64, messages: Value) {
        if in_progress > 0 {
            self.mount_function(
                "status",
                Self::status_record("IN_PROGRESS", json!([])),
                Some(in_progress),
            )
            .await;
        }
        self.mount_function("status", Self::status_record("DONE", messages), Some(1))
            .await;
    }

    /// `status` immediately reports a terminal status (`FAILED` / `ERROR`).
    pub async fn on_status_terminal(&self, status: &str) {
        self.mount_function("status", Self::status_record(status, json!([])), None)
            .await;
    }

    fn status_record(status: &str, messages: Value) -> Value {
        Self::envelope(json!([{
            "message_group": {
                "status": {"status": status},
                "messages": messages,
            }
        }]))
    }
}
