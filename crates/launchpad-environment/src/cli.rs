// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command line definition for the `launchpad` binary.

use clap::{Args, Parser, Subcommand};
use launchpad_core::project::validate_project_name;
use launchpad_core::{NewProject, ProjectType, SourceType};
use launchpad_environment::MetadataUpdate;

#[derive(Parser, Debug)]
#[command(name = "launchpad", author, version, about = "Self-service deployment manager")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a new project
    Create(CreateArgs),

    /// List projects, newest first
    #[command(visible_alias = "ls")]
    List,

    /// Show one project
    Get(ProjectRef),

    /// Edit description or launch command
    Update(UpdateArgs),

    /// Fetch, build and publish a project
    Deploy(ProjectRef),

    /// Start a stopped project
    Start(ProjectRef),

    /// Stop a running project
    Stop(ProjectRef),

    /// Remove a project and everything deployed for it
    #[command(visible_alias = "rm")]
    Delete(ProjectRef),

    /// Print recent container output
    Logs(LogsArgs),

    /// Show the live container state
    Status(ProjectRef),
}

/// A project addressed by name or numeric id.
#[derive(Args, Debug, Clone)]
pub struct ProjectRef {
    /// Project name or id
    pub project: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project name, also used as subdomain
    #[arg(value_parser = parse_name)]
    pub name: String,

    /// static or serverside
    #[arg(long = "type", default_value = "static")]
    pub project_type: ProjectType,

    /// github or local
    #[arg(long, default_value = "github")]
    pub source_type: SourceType,

    /// Repository URL or filesystem path
    #[arg(long)]
    pub source_path: String,

    /// Command the container runs
    #[arg(long)]
    pub launch_command: Option<String>,

    /// Port the application listens on inside the container
    #[arg(long)]
    pub container_port: Option<u16>,

    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,
}

fn parse_name(name: &str) -> Result<String, String> {
    validate_project_name(name)
        .map(|_| name.to_string())
        .map_err(|e| e.to_string())
}

impl From<CreateArgs> for NewProject {
    fn from(args: CreateArgs) -> Self {
        NewProject {
            name: args.name,
            project_type: args.project_type,
            source_type: args.source_type,
            source_path: args.source_path,
            launch_command: args.launch_command,
            container_port: args.container_port,
            description: args.description,
        }
    }
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: ProjectRef,

    /// New description (empty string clears it)
    #[arg(long)]
    pub description: Option<String>,

    /// New launch command (empty string clears it)
    #[arg(long)]
    pub launch_command: Option<String>,
}

impl UpdateArgs {
    pub fn changes(&self) -> MetadataUpdate {
        MetadataUpdate {
            description: self.description.clone(),
            launch_command: self.launch_command.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    #[command(flatten)]
    pub target: ProjectRef,

    /// Number of lines from the end
    #[arg(long)]
    pub tail: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::parse_from([
            "launchpad",
            "create",
            "api",
            "--type",
            "serverside",
            "--source-type",
            "local",
            "--source-path",
            "/srv/api",
            "--container-port",
            "8080",
        ]);
        let Commands::Create(args) = cli.command else {
            panic!("expected create");
        };
        let new: NewProject = args.into();
        assert_eq!(new.project_type, ProjectType::Serverside);
        assert_eq!(new.source_type, SourceType::Local);
        assert_eq!(new.container_port, Some(8080));
    }

    #[test]
    fn test_parse_logs_tail() {
        let cli = Cli::parse_from(["launchpad", "logs", "api", "--tail", "20"]);
        let Commands::Logs(args) = cli.command else {
            panic!("expected logs");
        };
        assert_eq!(args.target.project, "api");
        assert_eq!(args.tail, Some(20));
    }

    #[test]
    fn test_rejects_invalid_name_before_running() {
        assert!(
            Cli::try_parse_from(["launchpad", "create", "My_App", "--source-path", "p"]).is_err()
        );
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(
            Cli::try_parse_from(["launchpad", "create", "x", "--type", "lambda", "--source-path", "p"])
                .is_err()
        );
    }
}
