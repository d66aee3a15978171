// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for launchpad-core integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use launchpad_core::persistence::{self, SqlitePersistence};
use launchpad_core::{NewProject, Persistence, ProjectType, SourceType};

/// A fresh in-memory SQLite store.
pub async fn sqlite_store() -> Arc<dyn Persistence> {
    Arc::new(
        SqlitePersistence::in_memory()
            .await
            .expect("Failed to create in-memory SQLite store"),
    )
}

/// A PostgreSQL store from `TEST_LAUNCHPAD_DATABASE_URL`, with the projects
/// table emptied. Returns `None` when the variable is unset.
pub async fn postgres_store() -> Option<Arc<dyn Persistence>> {
    let database_url = std::env::var("TEST_LAUNCHPAD_DATABASE_URL").ok()?;
    let store = persistence::PostgresPersistence::connect(&database_url)
        .await
        .ok()?;
    sqlx::query("DELETE FROM projects")
        .execute(store.pool())
        .await
        .ok()?;
    Some(Arc::new(store))
}

/// Every store available in this environment.
pub async fn stores() -> Vec<(&'static str, Arc<dyn Persistence>)> {
    let mut stores = vec![("sqlite", sqlite_store().await)];
    if let Some(pg) = postgres_store().await {
        stores.push(("postgres", pg));
    } else {
        eprintln!("Skipping postgres backend: TEST_LAUNCHPAD_DATABASE_URL not set");
    }
    stores
}

pub fn static_project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        project_type: ProjectType::Static,
        source_type: SourceType::Github,
        source_path: format!("https://github.com/u/{}.git", name),
        launch_command: None,
        container_port: None,
        description: None,
    }
}

pub fn serverside_project(name: &str, container_port: u16) -> NewProject {
    NewProject {
        name: name.to_string(),
        project_type: ProjectType::Serverside,
        source_type: SourceType::Local,
        source_path: format!("/srv/src/{}", name),
        launch_command: Some("python app.py".to_string()),
        container_port: Some(container_port),
        description: Some(format!("{} service", name)),
    }
}
