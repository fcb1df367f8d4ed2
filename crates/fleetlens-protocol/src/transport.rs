// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level call wrapper for the single logical analytics endpoint.
//!
//! Every remote function goes through [`Transport::invoke`]: one POST with
//! the function name, the mandatory customer-data scope flag, and the session
//! credentials; the response envelope is decoded here so the layers above
//! only ever see a results list or a typed error.

use std::time::Duration;

use fleetlens_config::model::ServiceConfig;
use fleetlens_core::{Credentials, FleetlensError};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::types::{Envelope, RpcRequest};

/// HTTP transport for the remote analytics service.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    endpoint: String,
    service_id: String,
}

impl Transport {
    /// Build the transport from service configuration.
    ///
    /// The per-call timeout bounds a single network exchange; the polling
    /// ceiling is enforced separately by the poller's attempt budget.
    pub fn new(config: &ServiceConfig) -> Result<Self, FleetlensError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FleetlensError::transport("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            service_id: config.service_id.clone(),
        })
    }

    /// Invoke a remote function and return the decoded results list.
    ///
    /// The list may legitimately be empty here -- the status poller treats an
    /// empty list as "not ready yet". Call sites that require a record use
    /// [`Transport::invoke_first`].
    pub async fn invoke(
        &self,
        credentials: &Credentials,
        function: &str,
        parameters: Value,
    ) -> Result<Vec<Value>, FleetlensError> {
        let request = RpcRequest::new(&self.service_id, function, parameters, credentials);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| FleetlensError::transport(format!("`{function}` request failed"), e))?;

        let status = response.status();
        debug!(function, status = %status, "analytics response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FleetlensError::Transport {
                message: format!("analytics endpoint returned {status} for `{function}`: {body}"),
                source: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FleetlensError::transport("failed to read response body", e))?;
        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            FleetlensError::Schema(format!("`{function}` response is not a valid envelope: {e}"))
        })?;

        // An explicit error envelope is fatal; the message is forwarded verbatim.
        if let Some(error) = envelope.error {
            return Err(FleetlensError::Remote(
                error
                    .message
                    .unwrap_or_else(|| "remote error without message".to_string()),
            ));
        }

        envelope
            .result
            .and_then(|r| r.api_result)
            .and_then(|r| r.results)
            .ok_or_else(|| {
                FleetlensError::Schema(format!(
                    "`{function}` response envelope is missing result.apiResult.results"
                ))
            })
    }

    /// Invoke a remote function and return the first result record.
    ///
    /// An empty results list is an error here, never an empty success --
    /// session creation and prompt submission always expect a record.
    pub async fn invoke_first(
        &self,
        credentials: &Credentials,
        function: &str,
        parameters: Value,
    ) -> Result<Value, FleetlensError> {
        let mut results = self.invoke(credentials, function, parameters).await?;
        if results.is_empty() {
            return Err(FleetlensError::EmptyResult(format!(
                "`{function}` returned an empty results list"
            )));
        }
        Ok(results.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::functions;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_transport(endpoint: String) -> Transport {
        Transport::new(&ServiceConfig {
            endpoint,
            ..ServiceConfig::default()
        })
        .unwrap()
    }

    fn test_credentials() -> Credentials {
        Credentials {
            token: "test-token".into(),
        }
    }

    fn envelope(results: Value) -> Value {
        json!({"result": {"apiResult": {"results": results}}})
    }

    #[tokio::test]
    async fn invoke_decodes_results_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(json!([{"chat_id": "c-1"}]))),
            )
            .mount(&server)
            .await;

        let transport = test_transport(server.uri());
        let results = transport
            .invoke(&test_credentials(), functions::CREATE, json!({}))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["chat_id"], json!("c-1"));
    }

    #[tokio::test]
    async fn every_request_carries_scope_flag_and_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "restrict_to_customer_data": true,
                "function": "status",
                "credentials": {"token": "test-token"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_transport(server.uri());
        let results = transport
            .invoke(&test_credentials(), functions::STATUS, json!({}))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn error_envelope_is_forwarded_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": {"message": "quota exhausted for tenant"}})),
            )
            .mount(&server)
            .await;

        let transport = test_transport(server.uri());
        let err = transport
            .invoke(&test_credentials(), functions::CREATE, json!({}))
            .await
            .unwrap_err();
        match err {
            FleetlensError::Remote(message) => assert_eq!(message, "quota exhausted for tenant"),
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_envelope_fields_are_schema_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
            .mount(&server)
            .await;

        let transport = test_transport(server.uri());
        let err = transport
            .invoke(&test_credentials(), functions::CREATE, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetlensError::Schema(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn http_failure_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let transport = test_transport(server.uri());
        let err = transport
            .invoke(&test_credentials(), functions::CREATE, json!({}))
            .await
            .unwrap_err();
        match err {
            FleetlensError::Transport { message, .. } => {
                assert!(message.contains("502"), "got: {message}");
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invoke_first_rejects_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
            .mount(&server)
            .await;

        let transport = test_transport(server.uri());
        let err = transport
            .invoke_first(&test_credentials(), functions::SUBMIT, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetlensError::EmptyResult(_)), "got {err:?}");
    }
}
