// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database migrations for launchpad-core.
//!
//! This module exposes embedded migrations that can be run programmatically.
//! The persistence constructors call these; embedders that manage their own
//! pools can call them directly.
//!
//! # Example
//!
//! ```ignore
//! use sqlx::SqlitePool;
//! use launchpad_core::migrations;
//!
//! let pool = SqlitePool::connect("sqlite:.data/launchpad.db?mode=rwc").await?;
//! migrations::run_sqlite(&pool).await?;
//! ```

use sqlx::migrate::MigrateError;

/// PostgreSQL migrator with all migrations embedded.
pub static POSTGRES: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgresql");

/// SQLite migrator with all migrations embedded.
pub static SQLITE: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

/// Run PostgreSQL migrations.
///
/// Safe to call multiple times; already-applied migrations are skipped.
pub async fn run_postgres(pool: &sqlx::PgPool) -> Result<(), MigrateError> {
    POSTGRES.run(pool).await
}

/// Run SQLite migrations.
///
/// Safe to call multiple times; already-applied migrations are skipped.
pub async fn run_sqlite(pool: &sqlx::SqlitePool) -> Result<(), MigrateError> {
    SQLITE.run(pool).await
}
