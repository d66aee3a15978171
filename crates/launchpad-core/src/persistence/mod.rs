// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Persistence interfaces and backends for launchpad-core.
//!
//! The store is the single source of truth for a project's `status`, `port`
//! and `container_id`. Callers commit each change before moving on, so a crash
//! leaves the record describing the last step known to have happened.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresPersistence;
pub use self::sqlite::SqlitePersistence;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::project::{NewProject, Project, ProjectUpdate};

/// Column list shared by every `SELECT`/`RETURNING` on the projects table.
pub(crate) const PROJECT_COLUMNS: &str = "id, name, project_type, status, source_type, \
     source_path, subdomain, port, container_port, container_id, launch_command, \
     dockerfile_path, description, error_message, created_at, updated_at";

/// Project row as stored (enums as text, ports as signed integers).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Unique name.
    pub name: String,
    /// `static` or `serverside`.
    pub project_type: String,
    /// `stopped`, `running`, `building` or `failed`.
    pub status: String,
    /// `local` or `github`.
    pub source_type: String,
    /// Repository URL or filesystem path.
    pub source_path: String,
    /// DNS label routed to this project.
    pub subdomain: String,
    /// Allocated host port.
    pub port: Option<i32>,
    /// Internal container port.
    pub container_port: i32,
    /// Runtime handle.
    pub container_id: Option<String>,
    /// Run command override.
    pub launch_command: Option<String>,
    /// Resolved build recipe path.
    pub dockerfile_path: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Failure description.
    pub error_message: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = CoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| CoreError::InvalidRecord {
            project_id: row.id,
            reason,
        };
        let port = row
            .port
            .map(u16::try_from)
            .transpose()
            .map_err(|_| invalid(format!("port out of range: {:?}", row.port)))?;
        let container_port = u16::try_from(row.container_port)
            .map_err(|_| invalid(format!("container_port out of range: {}", row.container_port)))?;

        Ok(Project {
            id: row.id,
            project_type: row.project_type.parse().map_err(invalid)?,
            status: row.status.parse().map_err(invalid)?,
            source_type: row.source_type.parse().map_err(invalid)?,
            name: row.name,
            source_path: row.source_path,
            subdomain: row.subdomain,
            port,
            container_port,
            container_id: row.container_id,
            launch_command: row.launch_command,
            dockerfile_path: row.dockerfile_path,
            description: row.description,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Persistence interface used by the lifecycle orchestrator.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// All projects, newest first.
    async fn list_projects(&self) -> Result<Vec<Project>, CoreError>;

    /// Fetch a project by id.
    async fn get_project(&self, project_id: i64) -> Result<Option<Project>, CoreError>;

    /// Fetch a project by its unique name.
    async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>, CoreError>;

    /// Insert a new project in `stopped` status with `subdomain = name`.
    ///
    /// Fails with [`CoreError::Conflict`] when the name is taken.
    async fn insert_project(&self, project: &NewProject) -> Result<Project, CoreError>;

    /// Apply a partial update and return the updated record.
    ///
    /// Returns `Ok(None)` if the project does not exist. Fails with
    /// [`CoreError::Conflict`] if a port is already assigned elsewhere.
    async fn update_project(
        &self,
        project_id: i64,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, CoreError>;

    /// Delete a project. Returns whether a row was removed.
    async fn delete_project(&self, project_id: i64) -> Result<bool, CoreError>;

    /// Every host port currently assigned to a project.
    async fn used_ports(&self) -> Result<Vec<u16>, CoreError>;

    /// Check that the database answers.
    async fn health_check(&self) -> Result<bool, CoreError>;
}

/// Open the backend matching `database_url` and run its migrations.
///
/// `postgres://` and `postgresql://` URLs use [`PostgresPersistence`];
/// everything else is treated as SQLite.
pub async fn connect(database_url: &str) -> Result<Arc<dyn Persistence>, CoreError> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        let persistence = PostgresPersistence::connect(database_url).await?;
        tracing::info!(backend = "postgres", "Connected to project store");
        Ok(Arc::new(persistence))
    } else {
        let persistence = SqlitePersistence::connect(database_url).await?;
        tracing::info!(backend = "sqlite", "Connected to project store");
        Ok(Arc::new(persistence))
    }
}
