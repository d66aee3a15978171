// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed persistence implementation.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::CoreError;
use crate::migrations::SQLITE as MIGRATOR;
use crate::project::{DEFAULT_CONTAINER_PORT, NewProject, Project, ProjectUpdate};

use super::{PROJECT_COLUMNS, Persistence, ProjectRow};

/// SQLite-backed persistence provider.
#[derive(Clone)]
pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    /// Create a new SQLite persistence provider from an existing pool.
    ///
    /// The caller is responsible for running [`crate::migrations::run_sqlite`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using a `sqlite:` URL and run migrations.
    ///
    /// Missing database files and parent directories are created. In-memory
    /// databases get a single connection so every query sees the same data.
    pub async fn connect(database_url: &str) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| CoreError::DatabaseError {
                operation: "connect".to_string(),
                details: format!("Invalid SQLite URL {:?}: {}", database_url, e),
            })?
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:");
        if !in_memory
            && let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::DatabaseError {
                operation: "create_dir".to_string(),
                details: format!("Failed to create directory {:?}: {}", parent, e),
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await
            .map_err(|e| CoreError::DatabaseError {
                operation: "connect".to_string(),
                details: format!("Failed to connect to SQLite at {:?}: {}", database_url, e),
            })?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create and initialize a SQLite store from a file path.
    ///
    /// ```ignore
    /// let persistence = SqlitePersistence::from_path(".data/launchpad.db").await?;
    /// ```
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().to_string_lossy());
        Self::connect(&url).await
    }

    /// A fresh, migrated in-memory store.
    pub async fn in_memory() -> Result<Self, CoreError> {
        Self::connect("sqlite::memory:").await
    }
}

#[async_trait::async_trait]
impl Persistence for SqlitePersistence {
    async fn list_projects(&self) -> Result<Vec<Project>, CoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, id DESC",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Project::try_from).collect()
    }

    async fn get_project(&self, project_id: i64) -> Result<Option<Project>, CoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE id = ?",
            PROJECT_COLUMNS
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::try_from).transpose()
    }

    async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>, CoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE name = ?",
            PROJECT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::try_from).transpose()
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, CoreError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            INSERT INTO projects (
                name, project_type, status, source_type, source_path, subdomain,
                container_port, launch_command, description, created_at, updated_at
            ) VALUES (?, ?, 'stopped', ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(&project.name)
        .bind(project.project_type.as_str())
        .bind(project.source_type.as_str())
        .bind(&project.source_path)
        .bind(&project.name)
        .bind(i32::from(
            project.container_port.unwrap_or(DEFAULT_CONTAINER_PORT),
        ))
        .bind(&project.launch_command)
        .bind(&project.description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Project::try_from(row)
    }

    async fn update_project(
        &self,
        project_id: i64,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, CoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE projects SET updated_at = ");
        builder.push_bind(Utc::now());
        if let Some(status) = update.status {
            builder.push(", status = ").push_bind(status.as_str());
        }
        if let Some(message) = &update.error_message {
            builder.push(", error_message = ").push_bind(message.clone());
        }
        if let Some(port) = update.port {
            builder.push(", port = ").push_bind(port.map(i32::from));
        }
        if let Some(container_id) = &update.container_id {
            builder
                .push(", container_id = ")
                .push_bind(container_id.clone());
        }
        if let Some(path) = &update.dockerfile_path {
            builder.push(", dockerfile_path = ").push_bind(path.clone());
        }
        if let Some(description) = &update.description {
            builder
                .push(", description = ")
                .push_bind(description.clone());
        }
        if let Some(command) = &update.launch_command {
            builder.push(", launch_command = ").push_bind(command.clone());
        }
        builder.push(" WHERE id = ").push_bind(project_id);
        builder.push(" RETURNING ").push(PROJECT_COLUMNS);

        let row = builder
            .build_query_as::<ProjectRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(Project::try_from).transpose()
    }

    async fn delete_project(&self, project_id: i64) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn used_ports(&self) -> Result<Vec<u16>, CoreError> {
        let rows: Vec<(i32,)> =
            sqlx::query_as("SELECT port FROM projects WHERE port IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(port,)| u16::try_from(port).ok())
            .collect())
    }

    async fn health_check(&self) -> Result<bool, CoreError> {
        let row: (i64,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(row.0 == 1)
    }
}
