// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock runner for testing.
//!
//! Simulates images and containers in memory without touching a container
//! runtime.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::traits::*;

/// A simulated container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockContainer {
    /// Handle returned from `launch`.
    pub handle_id: String,
    /// Container name.
    pub name: String,
    /// Image it was launched from.
    pub image: String,
    /// Bound host port.
    pub host_port: u16,
    /// Internal port.
    pub container_port: u16,
    /// Whether it is running.
    pub running: bool,
}

#[derive(Debug, Default)]
struct MockState {
    builds: Vec<BuildOptions>,
    containers: HashMap<String, MockContainer>,
    next_id: u64,
    starts: usize,
}

/// Mock runner for testing.
pub struct MockRunner {
    state: Mutex<MockState>,
    /// Fail every `build_image` call.
    pub fail_builds: AtomicBool,
    /// Fail every `launch` call.
    pub fail_launch: AtomicBool,
    /// Fail every `start` call.
    pub fail_start: AtomicBool,
    /// Fail every `stop` call.
    pub fail_stop: AtomicBool,
    /// Fail every `remove` call.
    pub fail_remove: AtomicBool,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            fail_builds: AtomicBool::new(false),
            fail_launch: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    /// Create a mock runner whose image builds fail.
    pub fn failing_builds() -> Self {
        let runner = Self::new();
        runner.fail_builds.store(true, Ordering::SeqCst);
        runner
    }

    /// Every build requested so far.
    pub async fn builds(&self) -> Vec<BuildOptions> {
        self.state.lock().await.builds.clone()
    }

    /// Every container that currently exists, sorted by handle.
    pub async fn containers(&self) -> Vec<MockContainer> {
        let state = self.state.lock().await;
        let mut containers: Vec<_> = state.containers.values().cloned().collect();
        containers.sort_by(|a, b| a.handle_id.cmp(&b.handle_id));
        containers
    }

    /// The container with this handle, if it exists.
    pub async fn container(&self, handle_id: &str) -> Option<MockContainer> {
        self.state.lock().await.containers.get(handle_id).cloned()
    }

    /// Number of successful `start` calls.
    pub async fn start_count(&self) -> usize {
        self.state.lock().await.starts
    }

    fn failure(command: &str) -> RunnerError {
        RunnerError::ExitCode {
            command: format!("mock {}", command),
            exit_code: 1,
            stderr: "Mock failure".to_string(),
        }
    }
}

#[async_trait]
impl Runner for MockRunner {
    fn runner_type(&self) -> &'static str {
        "mock"
    }

    async fn build_image(&self, options: &BuildOptions) -> Result<()> {
        self.state.lock().await.builds.push(options.clone());
        if self.fail_builds.load(Ordering::SeqCst) {
            return Err(Self::failure("build"));
        }
        Ok(())
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<RunnerHandle> {
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err(Self::failure("run"));
        }

        let mut state = self.state.lock().await;
        state.containers.retain(|_, c| c.name != options.name);
        state.next_id += 1;
        let handle_id = format!("mock_{:08x}", state.next_id);
        state.containers.insert(
            handle_id.clone(),
            MockContainer {
                handle_id: handle_id.clone(),
                name: options.name.clone(),
                image: options.image.clone(),
                host_port: options.host_port,
                container_port: options.container_port,
                running: true,
            },
        );

        Ok(RunnerHandle {
            handle_id,
            name: options.name.clone(),
            started_at: Utc::now(),
        })
    }

    async fn start(&self, handle_id: &str) -> Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Self::failure("start"));
        }
        let mut state = self.state.lock().await;
        let container = state
            .containers
            .get_mut(handle_id)
            .ok_or_else(|| RunnerError::NotFound(handle_id.to_string()))?;
        container.running = true;
        state.starts += 1;
        Ok(())
    }

    async fn stop(&self, handle_id: &str) -> Result<()> {
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(Self::failure("stop"));
        }
        let mut state = self.state.lock().await;
        let container = state
            .containers
            .get_mut(handle_id)
            .ok_or_else(|| RunnerError::NotFound(handle_id.to_string()))?;
        container.running = false;
        Ok(())
    }

    async fn remove(&self, handle_id: &str) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(Self::failure("rm"));
        }
        self.state.lock().await.containers.remove(handle_id);
        Ok(())
    }

    async fn logs(&self, handle_id: &str, tail: usize) -> Result<String> {
        let state = self.state.lock().await;
        let container = state
            .containers
            .get(handle_id)
            .ok_or_else(|| RunnerError::NotFound(handle_id.to_string()))?;
        Ok(format!(
            "{} {} started (tail {})\n",
            Utc::now().to_rfc3339(),
            container.name,
            tail
        ))
    }

    async fn status(&self, handle_id: &str) -> Result<ContainerState> {
        let state = self.state.lock().await;
        Ok(match state.containers.get(handle_id) {
            Some(c) if c.running => ContainerState::Running,
            Some(_) => ContainerState::Exited,
            None => ContainerState::NotFound,
        })
    }
}
