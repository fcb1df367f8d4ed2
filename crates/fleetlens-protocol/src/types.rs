// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the remote analytics protocol.
//!
//! The service exposes one logical endpoint multiplexed by a function name.
//! Responses arrive in a fixed envelope; everything inside `results` is
//! loosely-shaped JSON that the poller interrogates defensively.

use fleetlens_core::{Credentials, PollStatus, ResultPayload, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote function names multiplexed over the single endpoint.
pub mod functions {
    /// Create a session ("chat"). No parameters.
    pub const CREATE: &str = "create";
    /// Submit a question into a session.
    pub const SUBMIT: &str = "submit";
    /// Fetch the current status of a submission.
    pub const STATUS: &str = "status";
}

/// Maximum recursion depth for the download-URL search. The remote schema is
/// untrusted input, so the walk is bounded.
pub const MAX_URL_SEARCH_DEPTH: usize = 32;

/// Cloud-storage hosts that mark a string as a full-result download URL.
const CLOUD_STORAGE_DOMAINS: &[&str] = &[
    "storage.googleapis.com",
    "amazonaws.com",
    "blob.core.windows.net",
];

/// Request body for the single logical endpoint.
///
/// `restrict_to_customer_data` is mandatory on every call: omitting it makes
/// the service answer with an empty *success*, not an error. [`RpcRequest::new`]
/// owns the field so no call site can forget it.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub service: &'a str,
    pub function: &'a str,
    pub restrict_to_customer_data: bool,
    pub parameters: Value,
    pub credentials: &'a Credentials,
}

impl<'a> RpcRequest<'a> {
    pub fn new(
        service: &'a str,
        function: &'a str,
        parameters: Value,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            service,
            function,
            restrict_to_customer_data: true,
            parameters,
            credentials,
        }
    }
}

/// Response envelope: either `result.apiResult.results` or `error.message`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub result: Option<EnvelopeResult>,
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeResult {
    #[serde(rename = "apiResult")]
    pub api_result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResult {
    pub results: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeError {
    pub message: Option<String>,
}

/// Resolve the submission status by descending `message_group.status.status`.
///
/// Any missing level resolves to `InProgress` -- a merely-incomplete shape is
/// never an error, and unknown status strings are non-terminal.
pub fn resolve_status(record: &Value) -> PollStatus {
    record
        .pointer("/message_group/status/status")
        .and_then(Value::as_str)
        .map(PollStatus::from_wire)
        .unwrap_or(PollStatus::InProgress)
}

/// Assemble the result payload from a completed submission's sub-messages.
///
/// Different fields may live on different sub-messages, so the scan walks all
/// of them and keeps the first occurrence of each field.
pub fn assemble_payload(record: &Value) -> ResultPayload {
    let mut payload = ResultPayload::default();
    let messages = record
        .pointer("/message_group/messages")
        .and_then(Value::as_array);

    for message in messages.into_iter().flatten() {
        if payload.columns.is_none() {
            payload.columns = message.get("columns").and_then(|v| {
                serde_json::from_value::<Vec<String>>(v.clone()).ok()
            });
        }
        if payload.rows.is_none() {
            payload.rows = message.get("preview_rows").and_then(|v| {
                serde_json::from_value::<Vec<Row>>(v.clone()).ok()
            });
        }
        if payload.reasoning.is_none() {
            payload.reasoning = message
                .get("reasoning")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        if payload.total_rows.is_none() {
            payload.total_rows = message.get("total_rows").and_then(Value::as_u64);
        }
        if payload.download_url.is_none() {
            payload.download_url = message
                .get("download_url")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
    }

    payload
}

/// Depth-first search for a full-result download URL anywhere in a response
/// value. The URL's schema location is not stable across service releases,
/// so the whole tree is searched for the first https string that carries a
/// `.csv` path or a known cloud-storage host.
pub fn find_download_url(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_URL_SEARCH_DEPTH {
        return None;
    }
    match value {
        Value::String(s) if looks_like_download_url(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|v| find_download_url(v, depth + 1)),
        Value::Object(map) => map.values().find_map(|v| find_download_url(v, depth + 1)),
        _ => None,
    }
}

fn looks_like_download_url(s: &str) -> bool {
    s.starts_with("https://")
        && (s.contains(".csv") || CLOUD_STORAGE_DOMAINS.iter().any(|d| s.contains(d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rpc_request_always_restricts_to_customer_data() {
        let credentials = Credentials {
            token: "tok".into(),
        };
        let request = RpcRequest::new("svc", functions::CREATE, json!({}), &credentials);
        assert!(request.restrict_to_customer_data);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["restrict_to_customer_data"], json!(true));
        assert_eq!(body["function"], json!("create"));
    }

    #[test]
    fn status_resolution_defaults_to_in_progress() {
        assert_eq!(resolve_status(&json!({})), PollStatus::InProgress);
        assert_eq!(
            resolve_status(&json!({"message_group": {}})),
            PollStatus::InProgress
        );
        assert_eq!(
            resolve_status(&json!({"message_group": {"status": {}}})),
            PollStatus::InProgress
        );
        assert_eq!(
            resolve_status(&json!({"message_group": {"status": {"status": "DONE"}}})),
            PollStatus::Done
        );
        assert_eq!(
            resolve_status(&json!({"message_group": {"status": {"status": "SOMETHING_NEW"}}})),
            PollStatus::InProgress
        );
    }

    #[test]
    fn payload_takes_first_occurrence_across_sub_messages() {
        let record = json!({
            "message_group": {
                "status": {"status": "DONE"},
                "messages": [
                    {"reasoning": "joined trips against vehicle registry"},
                    {"columns": ["vehicle", "km"], "preview_rows": [{"vehicle": "v-1", "km": 120}]},
                    {"columns": ["ignored"], "total_rows": 41},
                    {"reasoning": "ignored too"}
                ]
            }
        });

        let payload = assemble_payload(&record);
        assert_eq!(payload.columns.as_deref(), Some(&["vehicle".to_string(), "km".to_string()][..]));
        assert_eq!(payload.rows.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            payload.reasoning.as_deref(),
            Some("joined trips against vehicle registry")
        );
        assert_eq!(payload.total_rows, Some(41));
        assert!(payload.download_url.is_none());
    }

    #[test]
    fn download_url_found_anywhere_in_tree() {
        let record = json!({
            "message_group": {
                "messages": [
                    {"attachments": {"export": {"href": "https://storage.googleapis.com/fleet/results-7f.csv"}}}
                ]
            }
        });
        assert_eq!(
            find_download_url(&record, 0),
            Some("https://storage.googleapis.com/fleet/results-7f.csv".to_string())
        );

        // Plain https strings without a storage marker do not match.
        let noise = json!({"link": "https://docs.example.com/page"});
        assert_eq!(find_download_url(&noise, 0), None);

        // http (non-TLS) is never a download URL.
        let insecure = json!({"link": "http://storage.googleapis.com/x.csv"});
        assert_eq!(find_download_url(&insecure, 0), None);
    }

    #[test]
    fn download_url_search_is_depth_guarded() {
        let mut value = json!("https://bucket.amazonaws.com/export.csv");
        for _ in 0..(MAX_URL_SEARCH_DEPTH + 8) {
            value = json!({ "nested": value });
        }
        assert_eq!(find_download_url(&value, 0), None);
    }
}
