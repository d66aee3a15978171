// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Backend-agnostic record store tests.
//!
//! Every test runs against in-memory SQLite, and additionally against
//! PostgreSQL when `TEST_LAUNCHPAD_DATABASE_URL` is set. The PostgreSQL
//! fixture empties the table, so run those with `--test-threads=1`.

mod common;

use common::*;
use launchpad_core::{LifecycleEvent, ProjectStatus, ProjectUpdate, persistence};

#[tokio::test]
async fn test_insert_defaults() {
    for (backend, store) in stores().await {
        let project = store
            .insert_project(&serverside_project("api", 5000))
            .await
            .unwrap();

        assert_eq!(project.status, ProjectStatus::Stopped, "{backend}");
        assert_eq!(project.subdomain, "api", "{backend}");
        assert_eq!(project.container_port, 5000, "{backend}");
        assert_eq!(project.port, None, "{backend}");
        assert_eq!(project.error_message, None, "{backend}");
        assert_eq!(project.launch_command.as_deref(), Some("python app.py"));
    }
}

#[tokio::test]
async fn test_name_uniqueness() {
    for (backend, store) in stores().await {
        store.insert_project(&static_project("blog")).await.unwrap();
        let err = store
            .insert_project(&static_project("blog"))
            .await
            .unwrap_err();
        assert!(err.is_conflict_on("name"), "{backend}: {err}");
        assert_eq!(store.list_projects().await.unwrap().len(), 1, "{backend}");
    }
}

#[tokio::test]
async fn test_port_uniqueness_across_projects() {
    for (backend, store) in stores().await {
        let a = store
            .insert_project(&serverside_project("a", 80))
            .await
            .unwrap();
        let b = store
            .insert_project(&serverside_project("b", 80))
            .await
            .unwrap();

        store
            .update_project(a.id, &ProjectUpdate::new().port(10_500))
            .await
            .unwrap();
        let err = store
            .update_project(b.id, &ProjectUpdate::new().port(10_500))
            .await
            .unwrap_err();
        assert!(err.is_conflict_on("port"), "{backend}: {err}");

        let b = store.get_project(b.id).await.unwrap().unwrap();
        assert_eq!(b.port, None, "{backend}");
        assert_eq!(store.used_ports().await.unwrap(), vec![10_500], "{backend}");
    }
}

#[tokio::test]
async fn test_full_status_walk_persists() {
    for (backend, store) in stores().await {
        let project = store
            .insert_project(&serverside_project("walk", 8080))
            .await
            .unwrap();

        let mut status = project.status;
        for event in [
            LifecycleEvent::Deploy,
            LifecycleEvent::DeploySucceeded,
            LifecycleEvent::Stop,
            LifecycleEvent::Start,
        ] {
            let transition = status.apply(event).unwrap().unwrap();
            let updated = store
                .update_project(project.id, &ProjectUpdate::new().transition(&transition))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(updated.status, transition.next(), "{backend}");
            status = updated.status;
        }

        let stored = store.get_project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProjectStatus::Running, "{backend}");
        assert!(stored.updated_at >= project.updated_at, "{backend}");
    }
}

#[tokio::test]
async fn test_clear_optional_fields() {
    for (backend, store) in stores().await {
        let project = store
            .insert_project(&serverside_project("clear", 8080))
            .await
            .unwrap();

        let updated = store
            .update_project(
                project.id,
                &ProjectUpdate::new()
                    .description(None)
                    .launch_command(Some("./main --port 8080".to_string())),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.description, None, "{backend}");
        assert_eq!(
            updated.launch_command.as_deref(),
            Some("./main --port 8080"),
            "{backend}"
        );
    }
}

#[tokio::test]
async fn test_delete_frees_name_and_port() {
    for (backend, store) in stores().await {
        let project = store
            .insert_project(&serverside_project("reuse", 80))
            .await
            .unwrap();
        store
            .update_project(project.id, &ProjectUpdate::new().port(10_001))
            .await
            .unwrap();

        assert!(store.delete_project(project.id).await.unwrap(), "{backend}");
        assert!(store.used_ports().await.unwrap().is_empty(), "{backend}");

        let again = store
            .insert_project(&serverside_project("reuse", 80))
            .await
            .unwrap();
        assert_ne!(again.id, project.id, "{backend}");
    }
}

#[tokio::test]
async fn test_connect_dispatches_on_url() {
    let temp = tempfile::TempDir::new().unwrap();
    let url = format!(
        "sqlite:{}?mode=rwc",
        temp.path().join("data").join("launchpad.db").display()
    );

    let store = persistence::connect(&url).await.unwrap();
    assert!(store.health_check().await.unwrap());

    store.insert_project(&static_project("kept")).await.unwrap();
    drop(store);

    // Reopening sees the same data and re-running migrations is a no-op.
    let reopened = persistence::connect(&url).await.unwrap();
    let kept = reopened.get_project_by_name("kept").await.unwrap();
    assert!(kept.is_some());
}
