// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Launchpad Environment - Project Deployment
//!
//! This crate turns project records from `launchpad-core` into running
//! deployments on a single host. It fetches source, builds container images,
//! runs containers on allocated host ports, and publishes nginx rules that
//! route `<name>.<domain>` to each project.
//!
//! # Architecture
//!
//! ```text
//!                       ┌──────────────────────────┐
//!                       │   launchpad CLI / caller  │
//!                       └────────────┬─────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Orchestrator                                │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐         │
//! │  │  Source   │  │  Recipe   │  │  Runner   │  │   Proxy   │         │
//! │  │Provisioner│  │ Resolver  │  │ (docker)  │  │  (nginx)  │         │
//! │  └───────────┘  └───────────┘  └───────────┘  └───────────┘         │
//! │        ┌───────────────┐                                             │
//! │        │ PortAllocator │                                             │
//! │        └───────────────┘                                             │
//! └──────────────────────────────────┬──────────────────────────────────┘
//!                                    │
//!                                    ▼
//!                       ┌──────────────────────────┐
//!                       │  launchpad-core store    │
//!                       │  (SQLite / PostgreSQL)   │
//!                       └──────────────────────────┘
//! ```
//!
//! # Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `create` | Register a project; serverside projects get a host port |
//! | `list` / `get` | Read project records |
//! | `update` | Edit description or launch command |
//! | `deploy` | Provision, build, launch and publish |
//! | `start` / `stop` | Toggle a deployed project |
//! | `delete` | Tear down container, rule and working directory |
//! | `logs` | Recent container output |
//! | `runtime_status` | Live container state |
//!
//! # Project Status State Machine
//!
//! ```text
//!   create ──► STOPPED ──deploy──► BUILDING ──success──► RUNNING
//!               │  ▲                 │  ▲                 │  ▲
//!               │  │           failure│  │deploy          │  │
//!               │  │                 ▼  │                 │  │
//!               │  │                 FAILED ─── start ────┼─►│
//!               │  └──────────── stop ───────────────────┘  │
//!               └─────────────── start ──────────────────────┘
//! ```
//!
//! `start` moves `stopped` or `failed` to `running`; `deploy` is accepted
//! from every status except `building`. `stop` applies to `running` and
//! `building` only, so a `failed` project keeps its error until it is started
//! or redeployed. Transitions are computed by
//! [`launchpad_core::ProjectStatus::apply`].
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LAUNCHPAD_DATABASE_URL` | `sqlite:.data/launchpad.db?mode=rwc` | Record store URL |
//! | `LAUNCHPAD_DOMAIN` | `launch.me` | Parent domain for subdomains |
//! | `LAUNCHPAD_PROJECTS_DIR` | `.data/projects` | Working directories |
//! | `LAUNCHPAD_NGINX_CONFIG_DIR` | `/etc/nginx/sites-enabled` | nginx rule files |
//! | `LAUNCHPAD_NGINX_BIN` | `nginx` | nginx executable |
//! | `LAUNCHPAD_NGINX_OPTIONAL` | `true` | Skip reload when nginx is absent |
//! | `LAUNCHPAD_DOCKER_BIN` | `docker` | docker executable |
//! | `LAUNCHPAD_GIT_BIN` | `git` | git executable |
//! | `LAUNCHPAD_PORT_RANGE_START` | `10000` | First host port (inclusive) |
//! | `LAUNCHPAD_PORT_RANGE_END` | `20000` | Last host port (exclusive) |
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for environment operations
//! - [`lifecycle`]: The project lifecycle orchestrator
//! - [`ports`]: Host port allocation
//! - [`proxy`]: Reverse proxy configurators
//! - [`recipe`]: Build strategy selection and Dockerfile generation
//! - [`runner`]: Container runtime backends
//! - [`source`]: Source provisioning

#![deny(missing_docs)]

/// Configuration loaded from environment variables.
pub mod config;

/// Error types for environment operations.
pub mod error;

/// Project lifecycle orchestration.
pub mod lifecycle;

/// Random-probe host port allocation.
pub mod ports;

/// Reverse proxy configurators (nginx, mock).
pub mod proxy;

/// Build recipe resolution.
pub mod recipe;

/// Container runtime backends (docker, mock).
pub mod runner;

/// Working directory provisioning from GitHub or local paths.
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::{DeleteReport, MetadataUpdate, Orchestrator};
