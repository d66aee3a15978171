// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Docker runner implementation.
//!
//! Drives the `docker` CLI. Pure execution logic, no database access.

use async_trait::async_trait;
use chrono::Utc;
use std::ffi::OsStr;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::runner::{
    BuildOptions, ContainerState, LaunchOptions, Result, Runner, RunnerError, RunnerHandle,
};

/// Restart policy applied to every launched container.
pub const RESTART_POLICY: &str = "unless-stopped";

/// Docker runner configuration.
#[derive(Debug, Clone)]
pub struct DockerRunnerConfig {
    /// docker executable.
    pub docker_bin: String,
    /// Restart policy passed to `docker run --restart`.
    pub restart_policy: String,
}

impl Default for DockerRunnerConfig {
    fn default() -> Self {
        Self {
            docker_bin: "docker".to_string(),
            restart_policy: RESTART_POLICY.to_string(),
        }
    }
}

/// Container runner using the docker CLI.
pub struct DockerRunner {
    config: DockerRunnerConfig,
}

impl DockerRunner {
    /// Create a new docker runner
    pub fn new(config: DockerRunnerConfig) -> Self {
        Self { config }
    }

    /// Runner using `docker_bin` with default settings.
    pub fn with_binary(docker_bin: impl Into<String>) -> Self {
        Self::new(DockerRunnerConfig {
            docker_bin: docker_bin.into(),
            ..Default::default()
        })
    }

    async fn exec<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.config.docker_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    RunnerError::BinaryNotFound(self.config.docker_bin.clone())
                }
                _ => RunnerError::Io(e),
            })
    }

    /// Run a docker subcommand on a container, mapping "no such container"
    /// to [`RunnerError::NotFound`].
    async fn container_command(&self, command: &str, args: &[&str], handle: &str) -> Result<Output> {
        let mut full = vec![command];
        full.extend_from_slice(args);
        full.push(handle);
        let output = self.exec(&full).await?;
        if output.status.success() {
            return Ok(output);
        }
        let stderr = stderr_of(&output);
        if is_missing_container(&stderr) {
            return Err(RunnerError::NotFound(handle.to_string()));
        }
        Err(RunnerError::ExitCode {
            command: format!("docker {}", command),
            exit_code: output.status.code().unwrap_or(-1),
            stderr,
        })
    }

    fn run_args(&self, options: &LaunchOptions) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            options.name.clone(),
            "-p".to_string(),
            format!("{}:{}", options.host_port, options.container_port),
            "--restart".to_string(),
            self.config.restart_policy.clone(),
        ];

        let mut env: Vec<_> = options.env.iter().collect();
        env.sort();
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        for volume in &options.volumes {
            args.push("-v".to_string());
            args.push(volume.to_arg());
        }

        args.push(options.image.clone());
        args
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn is_missing_container(stderr: &str) -> bool {
    stderr.contains("No such container") || stderr.contains("No such object")
}

#[async_trait]
impl Runner for DockerRunner {
    fn runner_type(&self) -> &'static str {
        "docker"
    }

    async fn build_image(&self, options: &BuildOptions) -> Result<()> {
        info!(tag = %options.tag, recipe = %options.recipe, "Building image");

        let recipe_path = options.context_dir.join(&options.recipe);
        let output = self
            .exec([
                OsStr::new("build"),
                OsStr::new("--rm"),
                OsStr::new("-f"),
                recipe_path.as_os_str(),
                OsStr::new("-t"),
                OsStr::new(&options.tag),
                options.context_dir.as_os_str(),
            ])
            .await?;

        if !output.status.success() {
            let stderr = stderr_of(&output);
            error!(tag = %options.tag, stderr = %stderr, "Image build failed");
            return Err(RunnerError::ExitCode {
                command: "docker build".to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        info!(tag = %options.tag, "Successfully built image");
        Ok(())
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<RunnerHandle> {
        self.remove(&options.name).await?;

        let output = self.exec(self.run_args(options)).await?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            error!(name = %options.name, stderr = %stderr, "Container failed to start");
            return Err(RunnerError::ExitCode {
                command: "docker run".to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let handle_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if handle_id.is_empty() {
            return Err(RunnerError::Other(
                "docker run printed no container id".to_string(),
            ));
        }

        info!(
            name = %options.name,
            container_id = %handle_id,
            host_port = options.host_port,
            container_port = options.container_port,
            "Started container"
        );
        Ok(RunnerHandle {
            handle_id,
            name: options.name.clone(),
            started_at: Utc::now(),
        })
    }

    async fn start(&self, handle_id: &str) -> Result<()> {
        self.container_command("start", &[], handle_id).await?;
        info!(container_id = %handle_id, "Started container");
        Ok(())
    }

    async fn stop(&self, handle_id: &str) -> Result<()> {
        self.container_command("stop", &[], handle_id).await?;
        info!(container_id = %handle_id, "Stopped container");
        Ok(())
    }

    async fn remove(&self, handle_id: &str) -> Result<()> {
        match self.container_command("rm", &["-f"], handle_id).await {
            Ok(_) => {
                info!(container_id = %handle_id, "Removed container");
                Ok(())
            }
            Err(RunnerError::NotFound(_)) => {
                debug!(container_id = %handle_id, "Container already removed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn logs(&self, handle_id: &str, tail: usize) -> Result<String> {
        let tail = tail.to_string();
        let output = self
            .container_command("logs", &["--tail", &tail, "--timestamps"], handle_id)
            .await?;

        // docker replays the container's stderr on its own stderr.
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            logs.push_str(&stderr);
        }
        Ok(logs)
    }

    async fn status(&self, handle_id: &str) -> Result<ContainerState> {
        match self
            .container_command("inspect", &["-f", "{{.State.Status}}"], handle_id)
            .await
        {
            Ok(output) => {
                let raw = String::from_utf8_lossy(&output.stdout);
                raw.trim().parse().map_err(|e: String| {
                    warn!(container_id = %handle_id, state = %raw.trim(), "Unrecognized container state");
                    RunnerError::Other(e)
                })
            }
            Err(RunnerError::NotFound(_)) => Ok(ContainerState::NotFound),
            Err(e) => Err(e),
        }
    }
}
