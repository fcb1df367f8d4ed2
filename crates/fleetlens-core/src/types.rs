// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared types for the Fleetlens query pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque handle for one remote conversation session.
///
/// Created fresh per query and never reused across queries; it has no
/// lifecycle beyond the query that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Opaque handle for one submitted question within a session
/// (the remote service's "message group id").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Remote status of a submission.
///
/// `Done` is terminal success, `Failed` and `Error` are terminal failures,
/// `InProgress` is the only non-terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollStatus {
    InProgress,
    Done,
    Failed,
    Error,
}

impl PollStatus {
    /// Parse a wire status string. Unknown or unexpected strings resolve to
    /// `InProgress` -- an incomplete shape is never treated as terminal.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or(PollStatus::InProgress)
    }

    /// True for `Done`, `Failed`, and `Error`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollStatus::InProgress)
    }
}

/// One result row: column name to cell value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Raw result of a completed submission, before normalization.
///
/// Fields are assembled by scanning all sub-messages of the completed
/// submission and taking the first occurrence of each -- different fields may
/// live on different sub-messages, so all of them stay optional here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPayload {
    pub columns: Option<Vec<String>>,
    pub rows: Option<Vec<Row>>,
    pub reasoning: Option<String>,
    pub total_rows: Option<u64>,
    pub download_url: Option<String>,
}

/// The normalized, cache-ready result exposed to the rest of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Generated unique id (not a remote identifier).
    pub id: String,
    /// The original natural-language question.
    pub question: String,
    /// Ordered column names. Empty when the service returned none.
    pub columns: Vec<String>,
    /// Preview rows. Empty when the service returned none.
    pub rows: Vec<Row>,
    /// Optional reasoning text produced by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// When the query completed.
    pub queried_at: DateTime<Utc>,
    /// Total row count behind the preview, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// Full-result download URL, when one was found anywhere in the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Set only by the cache layer when serving cached or fallback data.
    #[serde(default)]
    pub from_cache: bool,
}

/// Session credentials for the remote analytics service, produced by a
/// [`crate::traits::CredentialsAdapter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_status_wire_round_trip() {
        for (wire, status) in [
            ("IN_PROGRESS", PollStatus::InProgress),
            ("DONE", PollStatus::Done),
            ("FAILED", PollStatus::Failed),
            ("ERROR", PollStatus::Error),
        ] {
            assert_eq!(PollStatus::from_wire(wire), status);
            assert_eq!(status.to_string(), wire);
        }
    }

    #[test]
    fn unknown_status_is_non_terminal() {
        assert_eq!(PollStatus::from_wire("QUEUED"), PollStatus::InProgress);
        assert_eq!(PollStatus::from_wire(""), PollStatus::InProgress);
        assert!(!PollStatus::from_wire("whatever").is_terminal());
    }

    #[test]
    fn terminal_statuses() {
        assert!(PollStatus::Done.is_terminal());
        assert!(PollStatus::Failed.is_terminal());
        assert!(PollStatus::Error.is_terminal());
        assert!(!PollStatus::InProgress.is_terminal());
    }

    #[test]
    fn insight_from_cache_defaults_false_on_deserialize() {
        let json = serde_json::json!({
            "id": "i-1",
            "question": "how far did the fleet drive?",
            "columns": ["day", "km"],
            "rows": [],
            "queried_at": "2026-01-01T00:00:00Z"
        });
        let insight: Insight = serde_json::from_value(json).unwrap();
        assert!(!insight.from_cache);
        assert!(insight.download_url.is_none());
    }
}
