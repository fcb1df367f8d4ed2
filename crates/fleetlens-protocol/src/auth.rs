// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config-backed credentials adapter.
//!
//! Real deployments plug their own [`CredentialsAdapter`] in at the
//! composition root; this one serves the common case of a static API token
//! from configuration or environment.

use async_trait::async_trait;
use fleetlens_config::model::ServiceConfig;
use fleetlens_core::{Credentials, CredentialsAdapter, FleetlensError};

/// Supplies a fixed API token for every query.
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Build from `[service]` config. The token comes from
    /// `service.api_token`, which the loader also fills from the
    /// `FLEETLENS_SERVICE_API_TOKEN` environment variable.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, FleetlensError> {
        match config.api_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(Self::new(token)),
            _ => Err(FleetlensError::Config(
                "service.api_token is not set (use fleetlens.toml or FLEETLENS_SERVICE_API_TOKEN)"
                    .into(),
            )),
        }
    }
}

#[async_trait]
impl CredentialsAdapter for StaticCredentials {
    async fn credentials(&self) -> Result<Credentials, FleetlensError> {
        Ok(Credentials {
            token: self.token.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_configured_token() {
        let adapter = StaticCredentials::new("tok-42");
        let credentials = adapter.credentials().await.unwrap();
        assert_eq!(credentials.token, "tok-42");
    }

    #[test]
    fn from_config_requires_a_token() {
        let config = ServiceConfig::default();
        assert!(StaticCredentials::from_config(&config).is_err());

        let config = ServiceConfig {
            api_token: Some("tok".into()),
            ..ServiceConfig::default()
        };
        assert!(StaticCredentials::from_config(&config).is_ok());
    }
}
