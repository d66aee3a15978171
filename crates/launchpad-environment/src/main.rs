// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Launchpad - Self-Service Deployment Manager
//!
//! Command line front end over the lifecycle orchestrator. Every command
//! prints its result as JSON on stdout; logs go to stderr.

mod cli;

use std::process;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, ProjectRef};
use launchpad_core::Project;
use launchpad_core::persistence;
use launchpad_environment::{Config, Error, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    let dotenv = dotenvy::dotenv();

    let default_filter = if cli.debug {
        "launchpad_environment=debug,launchpad_core=debug"
    } else {
        "launchpad_environment=info,launchpad_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = dotenv {
        tracing::debug!("No .env file loaded: {}", e);
    }

    if let Err(error) = run(cli.command).await {
        eprintln!("Error: {}", error);
        process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let store = persistence::connect(&config.database_url).await?;
    if !store.health_check().await? {
        warn!(database_url = %config.database_url, "Record store health check failed");
    }
    let orchestrator = Orchestrator::from_config(&config, store)?;
    info!(domain = %config.domain, projects_dir = %config.projects_dir.display(), "Orchestrator ready");

    match command {
        Commands::Create(args) => print_json(&orchestrator.create(args.into()).await?),
        Commands::List => print_json(&orchestrator.list().await?),
        Commands::Get(target) => print_json(&resolve(&orchestrator, &target).await?),
        Commands::Update(args) => {
            let project = resolve(&orchestrator, &args.target).await?;
            print_json(&orchestrator.update(project.id, args.changes()).await?)
        }
        Commands::Deploy(target) => {
            let project = resolve(&orchestrator, &target).await?;
            print_json(&orchestrator.deploy(project.id).await?)
        }
        Commands::Start(target) => {
            let project = resolve(&orchestrator, &target).await?;
            print_json(&orchestrator.start(project.id).await?)
        }
        Commands::Stop(target) => {
            let project = resolve(&orchestrator, &target).await?;
            print_json(&orchestrator.stop(project.id).await?)
        }
        Commands::Delete(target) => {
            let project = resolve(&orchestrator, &target).await?;
            print_json(&orchestrator.delete(project.id).await?)
        }
        Commands::Logs(args) => {
            let project = resolve(&orchestrator, &args.target).await?;
            print!("{}", orchestrator.logs(project.id, args.tail).await?);
            Ok(())
        }
        Commands::Status(target) => {
            let project = resolve(&orchestrator, &target).await?;
            let runtime = orchestrator.runtime_status(project.id).await?;
            print_json(&serde_json::json!({
                "id": project.id,
                "name": project.name,
                "status": project.status,
                "runtime": runtime,
            }))
        }
    }
}

/// Look a project up by name, then by numeric id.
async fn resolve(orchestrator: &Orchestrator, target: &ProjectRef) -> Result<Project, Error> {
    match orchestrator.get_by_name(&target.project).await {
        Err(Error::ProjectNotFound(_)) => match target.project.parse::<i64>() {
            Ok(id) => orchestrator.get(id).await,
            Err(_) => Err(Error::ProjectNotFound(target.project.clone())),
        },
        other => other,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
