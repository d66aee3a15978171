// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Project model and status state machine.
//!
//! A project is the unit launchpad deploys: a static site or a server-side
//! application, fetched from GitHub or a local path, reachable at
//! `<subdomain>.<domain>` once running.
//!
//! # Status State Machine
//!
//! ```text
//!              create
//!                │
//!                ▼
//!          ┌─────────┐   deploy    ┌──────────┐  succeeded  ┌─────────┐
//!          │ STOPPED │────────────►│ BUILDING │────────────►│ RUNNING │
//!          └─────────┘             └────┬─────┘             └────┬────┘
//!            ▲  ▲  │ start              │ failed                 │
//!            │  │  └────────────────────┼───────────────────────►│
//!            │  │                       ▼                        │
//!            │  │     deploy      ┌──────────┐                   │
//!            │  └──── stop ───────│  FAILED  │                   │
//!            │                    └──────────┘                   │
//!            └──────────────────── stop ─────────────────────────┘
//! ```
//!
//! Status values are never assigned directly. [`ProjectStatus::apply`] is the
//! single transition function; its [`Transition`] output is the only way to
//! put a status into a [`ProjectUpdate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Internal port an application listens on when none is given.
pub const DEFAULT_CONTAINER_PORT: u16 = 80;

/// Maximum length of a project name (a DNS label).
pub const MAX_NAME_LEN: usize = 63;

/// What kind of workload a project is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Static files served directly by the proxy.
    Static,
    /// An application built into an image and run in a container.
    Serverside,
}

impl ProjectType {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Static => "static",
            ProjectType::Serverside => "serverside",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static" => Ok(ProjectType::Static),
            "serverside" => Ok(ProjectType::Serverside),
            _ => Err(format!("Unknown project type: {}", s)),
        }
    }
}

/// Where a project's source comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A directory or file on this machine.
    Local,
    /// A remote git repository.
    Github,
}

impl SourceType {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Local => "local",
            SourceType::Github => "github",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(SourceType::Local),
            "github" => Ok(SourceType::Github),
            _ => Err(format!("Unknown source type: {}", s)),
        }
    }
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Not serving. Initial status.
    Stopped,
    /// Serving traffic at its subdomain.
    Running,
    /// Deployment in progress.
    Building,
    /// Last deployment failed; `error_message` says why.
    Failed,
}

impl ProjectStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Stopped => "stopped",
            ProjectStatus::Running => "running",
            ProjectStatus::Building => "building",
            ProjectStatus::Failed => "failed",
        }
    }

    /// Apply a lifecycle event.
    ///
    /// Returns `Ok(None)` when the event is a no-op in the current status
    /// (start while running, stop while stopped), `Ok(Some(_))` for a real
    /// transition, and `Err` when the event is not allowed.
    ///
    /// A `failed` project leaves that status only through `start` or
    /// `deploy`, so a failure recorded mid-deploy is never hidden behind a
    /// plain `stopped`.
    pub fn apply(self, event: LifecycleEvent) -> Result<Option<Transition>, InvalidTransition> {
        use LifecycleEvent as E;
        use ProjectStatus as S;

        let (next, error_message) = match (self, event) {
            (S::Stopped | S::Failed | S::Running, E::Deploy) => (S::Building, None),
            (S::Building, E::DeploySucceeded) => (S::Running, None),
            (S::Building, E::DeployFailed { message }) => {
                let message = if message.trim().is_empty() {
                    "deployment failed".to_string()
                } else {
                    message
                };
                (S::Failed, Some(message))
            }
            (S::Running, E::Start) => return Ok(None),
            (S::Stopped | S::Failed, E::Start) => (S::Running, None),
            (S::Stopped, E::Stop) => return Ok(None),
            (S::Running | S::Building, E::Stop) => (S::Stopped, None),
            (from, event) => {
                return Err(InvalidTransition {
                    from,
                    event: event.name(),
                });
            }
        };

        Ok(Some(Transition {
            from: self,
            next,
            error_message,
        }))
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stopped" => Ok(ProjectStatus::Stopped),
            "running" => Ok(ProjectStatus::Running),
            "building" => Ok(ProjectStatus::Building),
            "failed" => Ok(ProjectStatus::Failed),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

/// Events that drive the status state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A deployment begins.
    Deploy,
    /// Every deployment step completed.
    DeploySucceeded,
    /// A deployment step failed.
    DeployFailed {
        /// Description of the failing step.
        message: String,
    },
    /// Explicit start request.
    Start,
    /// Explicit stop request.
    Stop,
}

impl LifecycleEvent {
    /// Short name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Deploy => "deploy",
            LifecycleEvent::DeploySucceeded => "deploy_succeeded",
            LifecycleEvent::DeployFailed { .. } => "deploy_failed",
            LifecycleEvent::Start => "start",
            LifecycleEvent::Stop => "stop",
        }
    }
}

/// A validated status change produced by [`ProjectStatus::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    from: ProjectStatus,
    next: ProjectStatus,
    error_message: Option<String>,
}

impl Transition {
    /// Status before the transition.
    pub fn previous(&self) -> ProjectStatus {
        self.from
    }

    /// Status after the transition.
    pub fn next(&self) -> ProjectStatus {
        self.next
    }

    /// Failure description, present only when entering `failed`.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// A rejected lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {event} a project that is {from}")]
pub struct InvalidTransition {
    /// Status the project was in.
    pub from: ProjectStatus,
    /// Name of the rejected event.
    pub event: &'static str,
}

/// A persisted project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Store-assigned identifier.
    pub id: i64,
    /// Unique, immutable name.
    pub name: String,
    /// Static site or server-side application.
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    /// Current lifecycle status.
    pub status: ProjectStatus,
    /// Where the source comes from.
    pub source_type: SourceType,
    /// Repository URL or filesystem path.
    pub source_path: String,
    /// DNS label routed to this project (same as `name`).
    pub subdomain: String,
    /// Host port, allocated at create time for server-side projects.
    pub port: Option<u16>,
    /// Port the application listens on inside its container.
    pub container_port: u16,
    /// Runtime handle of the project's container.
    pub container_id: Option<String>,
    /// Override for the container's run command.
    pub launch_command: Option<String>,
    /// Build recipe used by the last deployment.
    pub dockerfile_path: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Why the last deployment failed.
    pub error_message: Option<String>,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
    /// When the project was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether this project runs in a container.
    pub fn is_serverside(&self) -> bool {
        self.project_type == ProjectType::Serverside
    }
}

/// Fields supplied when creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    /// Unique name, also used as subdomain.
    pub name: String,
    /// Static site or server-side application.
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    /// Where the source comes from.
    pub source_type: SourceType,
    /// Repository URL or filesystem path.
    pub source_path: String,
    /// Override for the container's run command.
    #[serde(default)]
    pub launch_command: Option<String>,
    /// Port the application listens on (defaults to 80).
    #[serde(default)]
    pub container_port: Option<u16>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A partial update of a project's mutable fields.
///
/// Unset fields are left untouched; `updated_at` is always refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub(crate) status: Option<ProjectStatus>,
    pub(crate) error_message: Option<Option<String>>,
    pub(crate) port: Option<Option<u16>>,
    pub(crate) container_id: Option<Option<String>>,
    pub(crate) dockerfile_path: Option<Option<String>>,
    pub(crate) description: Option<Option<String>>,
    pub(crate) launch_command: Option<Option<String>>,
}

impl ProjectUpdate {
    /// Empty update (only touches `updated_at`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status transition. Entering `failed` stores the failure
    /// message; any other status clears it.
    pub fn transition(mut self, transition: &Transition) -> Self {
        self.status = Some(transition.next);
        self.error_message = Some(transition.error_message.clone());
        self
    }

    /// Set the allocated host port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(Some(port));
        self
    }

    /// Set or clear the container handle.
    pub fn container_id(mut self, container_id: Option<String>) -> Self {
        self.container_id = Some(container_id);
        self
    }

    /// Set or clear the resolved build recipe path.
    pub fn dockerfile_path(mut self, path: Option<String>) -> Self {
        self.dockerfile_path = Some(path);
        self
    }

    /// Set or clear the description.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Set or clear the launch command override.
    pub fn launch_command(mut self, command: Option<String>) -> Self {
        self.launch_command = Some(command);
        self
    }

    /// Status this update moves the project to, if any.
    pub fn status(&self) -> Option<ProjectStatus> {
        self.status
    }

    /// True when no field besides `updated_at` would change.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Validate a project name.
///
/// Names become DNS labels: 1-63 characters of lowercase ASCII letters,
/// digits and hyphens, starting and ending with a letter or digit.
pub fn validate_project_name(name: &str) -> Result<(), CoreError> {
    let invalid = |message: &str| CoreError::ValidationError {
        field: "name".to_string(),
        message: message.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("must be at most 63 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "may only contain lowercase letters, digits and hyphens",
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}
