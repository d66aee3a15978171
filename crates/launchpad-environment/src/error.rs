// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for launchpad-environment.

use std::path::PathBuf;

use launchpad_core::project::InvalidTransition;
use thiserror::Error;

use crate::ports::AllocationError;
use crate::source::SourceError;

/// Environment errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A project with this name already exists.
    #[error("Project with name '{0}' already exists")]
    DuplicateName(String),

    /// No project matches the given id or name.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// No free host port could be found.
    #[error("No available ports: {0}")]
    ResourceExhausted(#[from] AllocationError),

    /// A local source path does not exist.
    #[error("Source path does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Cloning a remote repository failed.
    #[error("Failed to clone repository: {0}")]
    SourceFetch(String),

    /// The container image could not be built.
    #[error("Failed to build Docker image: {0}")]
    BuildFailed(String),

    /// The container could not be created or started.
    #[error("Failed to start container: {0}")]
    ContainerStartFailed(String),

    /// The proxy rule could not be written, validated or reloaded.
    #[error("Failed to publish proxy rule: {0}")]
    ProxyPublishFailed(String),

    /// The operation is not allowed in the project's current status.
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransition),

    /// Request validation failed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The project has nothing to start yet.
    #[error("Project '{0}' has not been deployed")]
    NotDeployed(String),

    /// The container runtime failed outside of deploy and start.
    #[error("Runtime error: {0}")]
    Runtime(#[from] crate::runner::RunnerError),

    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record store operation failed.
    #[error("Core error: {0}")]
    Core(#[from] launchpad_core::CoreError),
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(path) => Error::SourceNotFound(path),
            SourceError::Fetch { url, message } => {
                Error::SourceFetch(format!("{}: {}", url, message))
            }
            err @ SourceError::ContainsWorkingDir { .. } => {
                Error::InvalidRequest(err.to_string())
            }
            SourceError::Io(e) => Error::Io(e),
        }
    }
}

/// Result type using Environment Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Step of a deployment, recorded with every deploy failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    /// Fetching or copying source into the working directory.
    Provision,
    /// Assigning a host port to a project that has none.
    Allocate,
    /// Resolving or generating the build recipe.
    Recipe,
    /// Building the container image.
    Build,
    /// Creating and starting the container.
    Launch,
    /// Writing and reloading the proxy rule.
    Publish,
    /// Committing a step to the record store.
    Record,
}

impl DeployStage {
    /// Lowercase stage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStage::Provision => "provision",
            DeployStage::Allocate => "allocate",
            DeployStage::Recipe => "recipe",
            DeployStage::Build => "build",
            DeployStage::Launch => "launch",
            DeployStage::Publish => "publish",
            DeployStage::Record => "record",
        }
    }
}

impl std::fmt::Display for DeployStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_errors_map_to_taxonomy() {
        let err: Error = SourceError::NotFound(PathBuf::from("/nope")).into();
        assert_eq!(err.to_string(), "Source path does not exist: /nope");

        let err: Error = SourceError::Fetch {
            url: "https://github.com/u/x.git".to_string(),
            message: "repository not found".to_string(),
        }
        .into();
        assert!(matches!(err, Error::SourceFetch(_)));
        assert!(err.to_string().starts_with("Failed to clone repository"));

        let err: Error = SourceError::ContainsWorkingDir {
            path: PathBuf::from("/srv"),
            working_dir: PathBuf::from("/srv/projects/site"),
        }
        .into();
        assert!(matches!(err, Error::InvalidRequest(ref m) if m.contains("/srv/projects/site")));
    }

    #[test]
    fn test_step_messages_are_distinct() {
        assert_eq!(
            Error::BuildFailed("exit 1".into()).to_string(),
            "Failed to build Docker image: exit 1"
        );
        assert_eq!(
            Error::ProjectNotFound("7".into()).to_string(),
            "Project not found: 7"
        );
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(DeployStage::Build.to_string(), "build");
        assert_eq!(DeployStage::Publish.as_str(), "publish");
    }
}
