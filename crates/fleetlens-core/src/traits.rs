// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The credentials seam between the query pipeline and the (out-of-scope)
//! authentication collaborator.

use async_trait::async_trait;

use crate::error::FleetlensError;
use crate::types::Credentials;

/// Supplies session credentials for the remote analytics service.
///
/// Authentication internals live outside this system; the query pipeline only
/// asks for usable credentials immediately before each query.
#[async_trait]
pub trait CredentialsAdapter: Send + Sync {
    /// Returns credentials valid for one query's worth of remote calls.
    async fn credentials(&self) -> Result<Credentials, FleetlensError>;
}
