// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runner trait definitions.
//!
//! Defines the abstract interface for container runtimes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from runner operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    /// The runtime executable was not found.
    #[error("Runtime binary not found: {0}")]
    BinaryNotFound(String),

    /// No container with this handle or name exists.
    #[error("Container not found: {0}")]
    NotFound(String),

    /// A runtime command exited with non-zero code.
    #[error("{command} exited with code {exit_code}: {stderr}")]
    ExitCode {
        /// Runtime subcommand that failed.
        command: String,
        /// Exit code from the process.
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("Other: {0}")]
    Other(String),
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Image tag for the project called `name`.
pub fn image_tag(name: &str) -> String {
    format!("paas-{}:latest", name)
}

/// Container name for the project called `name`.
pub fn container_name(name: &str) -> String {
    format!("paas-{}", name)
}

/// Options for building an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build context (the project's working directory).
    pub context_dir: PathBuf,
    /// Recipe file, relative to the context.
    pub recipe: String,
    /// Tag to apply to the built image.
    pub tag: String,
}

/// A host directory mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBind {
    /// Host path.
    pub host_path: PathBuf,
    /// Mount point inside the container.
    pub container_path: String,
    /// Mount read-only.
    pub read_only: bool,
}

impl VolumeBind {
    /// `host:container:mode` as accepted by `docker run -v`.
    pub fn to_arg(&self) -> String {
        format!(
            "{}:{}:{}",
            self.host_path.display(),
            self.container_path,
            if self.read_only { "ro" } else { "rw" }
        )
    }
}

/// Options for creating and starting a container.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Image to run.
    pub image: String,
    /// Container name; an existing container with this name is replaced.
    pub name: String,
    /// Host port bound to `container_port`.
    pub host_port: u16,
    /// Port the application listens on inside the container.
    pub container_port: u16,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Volume binds.
    pub volumes: Vec<VolumeBind>,
}

/// Handle for a launched container.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    /// Opaque container handle, persisted as the project's `container_id`.
    pub handle_id: String,
    /// Container name.
    pub name: String,
    /// When the container was started.
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Live state of a container as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerState {
    /// Created but never started.
    Created,
    /// Running.
    Running,
    /// Paused.
    Paused,
    /// Restarting under its restart policy.
    Restarting,
    /// Being removed.
    Removing,
    /// Exited.
    Exited,
    /// Dead.
    Dead,
    /// The runtime does not know the handle.
    NotFound,
}

impl ContainerState {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Created => "created",
            ContainerState::Running => "running",
            ContainerState::Paused => "paused",
            ContainerState::Restarting => "restarting",
            ContainerState::Removing => "removing",
            ContainerState::Exited => "exited",
            ContainerState::Dead => "dead",
            ContainerState::NotFound => "not-found",
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContainerState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" => Ok(ContainerState::Created),
            "running" => Ok(ContainerState::Running),
            "paused" => Ok(ContainerState::Paused),
            "restarting" => Ok(ContainerState::Restarting),
            "removing" => Ok(ContainerState::Removing),
            "exited" => Ok(ContainerState::Exited),
            "dead" => Ok(ContainerState::Dead),
            "not-found" => Ok(ContainerState::NotFound),
            other => Err(format!("Unknown container state: {}", other)),
        }
    }
}

/// Trait for container runtimes.
///
/// Runners are PURE execution engines - they do NOT access the database.
/// Persisting handles and status is the orchestrator's job.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runner type identifier (e.g., "docker", "mock").
    fn runner_type(&self) -> &'static str;

    /// Build an image from a recipe inside a build context.
    async fn build_image(&self, options: &BuildOptions) -> Result<()>;

    /// Create and start a container, replacing any container with the same
    /// name.
    async fn launch(&self, options: &LaunchOptions) -> Result<RunnerHandle>;

    /// Start a stopped container.
    async fn start(&self, handle_id: &str) -> Result<()>;

    /// Stop a running container.
    async fn stop(&self, handle_id: &str) -> Result<()>;

    /// Stop (if running) and remove a container. Removing a container that
    /// no longer exists succeeds.
    async fn remove(&self, handle_id: &str) -> Result<()>;

    /// The last `tail` log lines, with timestamps.
    async fn logs(&self, handle_id: &str, tail: usize) -> Result<String>;

    /// Live state of a container; unknown handles report
    /// [`ContainerState::NotFound`].
    async fn status(&self, handle_id: &str) -> Result<ContainerState>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_conventions() {
        assert_eq!(image_tag("api"), "paas-api:latest");
        assert_eq!(container_name("api"), "paas-api");
    }

    #[test]
    fn test_volume_bind_arg() {
        let bind = VolumeBind {
            host_path: PathBuf::from("/srv/data"),
            container_path: "/data".to_string(),
            read_only: true,
        };
        assert_eq!(bind.to_arg(), "/srv/data:/data:ro");
    }

    #[test]
    fn test_container_state_strings() {
        for state in [
            ContainerState::Running,
            ContainerState::Exited,
            ContainerState::NotFound,
        ] {
            assert_eq!(state.as_str().parse::<ContainerState>().unwrap(), state);
        }
        assert_eq!(
            serde_json::to_string(&ContainerState::NotFound).unwrap(),
            "\"not-found\""
        );
        assert!("bogus".parse::<ContainerState>().is_err());
    }
}
