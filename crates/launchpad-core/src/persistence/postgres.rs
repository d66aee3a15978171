// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed persistence implementation.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::CoreError;
use crate::migrations::POSTGRES as MIGRATOR;
use crate::project::{DEFAULT_CONTAINER_PORT, NewProject, Project, ProjectUpdate};

use super::{PROJECT_COLUMNS, Persistence, ProjectRow};

/// PostgreSQL-backed persistence implementation.
#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Create a new Postgres-backed persistence implementation.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self, CoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| CoreError::DatabaseError {
                operation: "connect".to_string(),
                details: format!("Failed to connect to PostgreSQL: {}", e),
            })?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Persistence for PostgresPersistence {
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
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::try_from).transpose()
    }

    async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>, CoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE name = $1",
            PROJECT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::try_from).transpose()
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, CoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            INSERT INTO projects (
                name, project_type, status, source_type, source_path, subdomain,
                container_port, launch_command, description, created_at, updated_at
            ) VALUES ($1, $2, 'stopped', $3, $4, $1, $5, $6, $7, NOW(), NOW())
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(&project.name)
        .bind(project.project_type.as_str())
        .bind(project.source_type.as_str())
        .bind(&project.source_path)
        .bind(i32::from(
            project.container_port.unwrap_or(DEFAULT_CONTAINER_PORT),
        ))
        .bind(&project.launch_command)
        .bind(&project.description)
        .fetch_one(&self.pool)
        .await?;

        Project::try_from(row)
    }

    async fn update_project(
        &self,
        project_id: i64,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, CoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE projects SET updated_at = NOW()");
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
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
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
        let row: (i64,) = sqlx::query_as("SELECT 1::BIGINT")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 == 1)
    }
}
