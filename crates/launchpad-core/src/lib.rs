// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Launchpad Core - Project Records
//!
//! This crate owns the persisted side of launchpad: the [`Project`] record,
//! its status state machine, and the [`Persistence`] trait with SQLite and
//! PostgreSQL backends. It performs no deployment work itself; the
//! orchestrator in `launchpad-environment` drives it.
//!
//! # Record Store
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `list_projects` | All projects, newest first |
//! | `get_project` | Fetch by id |
//! | `get_project_by_name` | Fetch by unique name |
//! | `insert_project` | Create in `stopped` status, returns assigned id |
//! | `update_project` | Partial update, always touches `updated_at` |
//! | `delete_project` | Remove by id |
//! | `used_ports` | Every host port currently assigned |
//!
//! # Invariants enforced by the schema
//!
//! - `name` and `subdomain` are unique (subdomain is always equal to name).
//! - `port` is unique among projects that have one.
//! - Enumerated columns are constrained to their known values.
//!
//! # Modules
//!
//! - [`error`]: Error types for store operations
//! - [`migrations`]: Embedded SQLite and PostgreSQL migrations
//! - [`persistence`]: The `Persistence` trait and its backends
//! - [`project`]: Project model, status state machine, name validation

#![deny(missing_docs)]

/// Error types for store operations.
pub mod error;

/// Embedded database migrations.
pub mod migrations;

/// Persistence trait and backends.
pub mod persistence;

/// Project model and status state machine.
pub mod project;

pub use error::CoreError;
pub use persistence::Persistence;
pub use project::{
    LifecycleEvent, NewProject, Project, ProjectStatus, ProjectType, ProjectUpdate, SourceType,
    Transition,
};
