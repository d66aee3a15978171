// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Proxy configurator trait definitions.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from proxy operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProxyError {
    /// The proxy executable was not found.
    #[error("Proxy binary not found: {0}")]
    BinaryNotFound(String),

    /// The new configuration did not pass validation.
    #[error("Configuration test failed: {0}")]
    Validation(String),

    /// The proxy did not accept the reload.
    #[error("Reload failed: {0}")]
    Reload(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// What a published rule routes a subdomain to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyTarget {
    /// Static files served from a directory.
    Static(PathBuf),
    /// HTTP forwarded to `localhost:<port>`.
    Backend(u16),
}

/// Publishes and retracts the routing rule for a subdomain.
///
/// Every change is validated before it goes live; a failed validation or
/// reload leaves the previous rule (or no rule) in place.
#[async_trait]
pub trait ProxyConfigurator: Send + Sync {
    /// Configurator type identifier (e.g., "nginx", "mock").
    fn proxy_type(&self) -> &'static str;

    /// Serve static files from `root` under `subdomain`.
    async fn publish_static(&self, subdomain: &str, root: &Path) -> Result<()>;

    /// Forward `subdomain` to `localhost:port`.
    async fn publish_proxy(&self, subdomain: &str, port: u16) -> Result<()>;

    /// Remove the rule for `subdomain`. A missing rule is not an error.
    async fn retract(&self, subdomain: &str) -> Result<()>;
}
