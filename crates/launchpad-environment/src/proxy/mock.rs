// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock proxy configurator for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::traits::*;

/// In-memory proxy configurator.
#[derive(Default)]
pub struct MockProxy {
    rules: Mutex<HashMap<String, ProxyTarget>>,
    publishes: AtomicUsize,
    retracts: AtomicUsize,
    /// Fail every publish.
    pub fail_publish: AtomicBool,
    /// Fail every retract.
    pub fail_retract: AtomicBool,
}

impl MockProxy {
    /// Create a mock proxy with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// The live rule for `subdomain`.
    pub async fn rule(&self, subdomain: &str) -> Option<ProxyTarget> {
        self.rules.lock().await.get(subdomain).cloned()
    }

    /// Number of live rules.
    pub async fn rule_count(&self) -> usize {
        self.rules.lock().await.len()
    }

    /// Successful publishes so far.
    pub fn publish_count(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }

    /// Successful retracts so far.
    pub fn retract_count(&self) -> usize {
        self.retracts.load(Ordering::SeqCst)
    }

    async fn publish(&self, subdomain: &str, target: ProxyTarget) -> Result<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(ProxyError::Validation("mock validation failure".to_string()));
        }
        self.rules.lock().await.insert(subdomain.to_string(), target);
        self.publishes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ProxyConfigurator for MockProxy {
    fn proxy_type(&self) -> &'static str {
        "mock"
    }

    async fn publish_static(&self, subdomain: &str, root: &Path) -> Result<()> {
        self.publish(subdomain, ProxyTarget::Static(root.to_path_buf()))
            .await
    }

    async fn publish_proxy(&self, subdomain: &str, port: u16) -> Result<()> {
        self.publish(subdomain, ProxyTarget::Backend(port)).await
    }

    async fn retract(&self, subdomain: &str) -> Result<()> {
        if self.fail_retract.load(Ordering::SeqCst) {
            return Err(ProxyError::Reload("mock reload failure".to_string()));
        }
        self.rules.lock().await.remove(subdomain);
        self.retracts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_replaces_rule() {
        let proxy = MockProxy::new();
        proxy.publish_proxy("api", 10001).await.unwrap();
        proxy.publish_proxy("api", 10002).await.unwrap();

        assert_eq!(proxy.rule("api").await, Some(ProxyTarget::Backend(10002)));
        assert_eq!(proxy.rule_count().await, 1);
        assert_eq!(proxy.publish_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_publish_keeps_previous_rule() {
        let proxy = MockProxy::new();
        proxy.publish_static("blog", Path::new("/srv/blog")).await.unwrap();

        proxy.fail_publish.store(true, Ordering::SeqCst);
        assert!(proxy.publish_proxy("blog", 10001).await.is_err());

        assert_eq!(
            proxy.rule("blog").await,
            Some(ProxyTarget::Static("/srv/blog".into()))
        );
    }

    #[tokio::test]
    async fn test_retract_absent_rule() {
        let proxy = MockProxy::new();
        proxy.retract("nothing").await.unwrap();
        assert_eq!(proxy.retract_count(), 1);
    }
}
