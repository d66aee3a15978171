// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared harness for launchpad-environment integration tests.

#![allow(dead_code)]

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use launchpad_core::persistence::SqlitePersistence;
use launchpad_core::{NewProject, Persistence, ProjectType, SourceType};
use launchpad_environment::Orchestrator;
use launchpad_environment::proxy::MockProxy;
use launchpad_environment::runner::MockRunner;
use launchpad_environment::source::MockFetcher;
use tempfile::TempDir;

/// An orchestrator over an in-memory store and mock runtime, proxy and
/// fetcher, rooted in a temporary directory.
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub store: Arc<dyn Persistence>,
    pub runner: Arc<MockRunner>,
    pub proxy: Arc<MockProxy>,
    pub fetcher: Arc<MockFetcher>,
    pub temp: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_port_range(10000..20000).await
    }

    pub async fn with_port_range(range: Range<u16>) -> Self {
        Self::with_runner(range, MockRunner::new()).await
    }

    pub async fn with_runner(range: Range<u16>, runner: MockRunner) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let store: Arc<dyn Persistence> = Arc::new(
            SqlitePersistence::in_memory()
                .await
                .expect("Failed to create in-memory SQLite store"),
        );
        let runner = Arc::new(runner);
        let proxy = Arc::new(MockProxy::new());
        let fetcher = Arc::new(MockFetcher::new());

        let orchestrator = Orchestrator::builder()
            .store(store.clone())
            .runner(runner.clone())
            .proxy(proxy.clone())
            .fetcher(fetcher.clone())
            .projects_dir(temp.path().join("projects"))
            .port_range(range)
            .build()
            .expect("Failed to build orchestrator");

        Self {
            orchestrator,
            store,
            runner,
            proxy,
            fetcher,
            temp,
        }
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.temp.path().join("projects")
    }

    /// Write `files` into a fresh directory under the temp root.
    pub fn local_source(&self, dir_name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.temp.path().join("sources").join(dir_name);
        std::fs::create_dir_all(&dir).expect("Failed to create source dir");
        for (name, body) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create source subdir");
            }
            std::fs::write(path, body).expect("Failed to write source file");
        }
        dir
    }
}

pub fn github_static(name: &str, url: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        project_type: ProjectType::Static,
        source_type: SourceType::Github,
        source_path: url.to_string(),
        launch_command: None,
        container_port: None,
        description: None,
    }
}

pub fn local_serverside(name: &str, source: &Path) -> NewProject {
    NewProject {
        name: name.to_string(),
        project_type: ProjectType::Serverside,
        source_type: SourceType::Local,
        source_path: source.display().to_string(),
        launch_command: None,
        container_port: None,
        description: None,
    }
}

pub fn local_static(name: &str, source: &Path) -> NewProject {
    NewProject {
        project_type: ProjectType::Static,
        ..local_serverside(name, source)
    }
}
