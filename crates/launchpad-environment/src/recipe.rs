// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Build recipe resolution for serverside projects.
//!
//! A `Dockerfile` shipped with the source is used as-is. Otherwise the
//! working directory is matched against [`STRATEGIES`] in order, and the
//! first strategy whose marker file exists renders `Dockerfile.generated`.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

/// Recipe file a project may ship itself.
pub const DOCKERFILE: &str = "Dockerfile";

/// Recipe file written when none is shipped.
pub const GENERATED_DOCKERFILE: &str = "Dockerfile.generated";

/// A build strategy keyed on a marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStrategy {
    /// Stack name.
    pub name: &'static str,
    /// File whose presence selects this strategy. `None` always matches.
    pub marker: Option<&'static str>,
    /// Run command used when the project has no `launch_command`.
    pub default_command: &'static str,
    template: &'static str,
}

const NODE_TEMPLATE: &str = r#"FROM node:18-alpine

WORKDIR /app

COPY package*.json ./
RUN npm install

COPY . .

EXPOSE {port}

CMD {command}
"#;

const PYTHON_TEMPLATE: &str = r#"FROM python:3.11-slim

WORKDIR /app

COPY requirements.txt .
RUN pip install --no-cache-dir -r requirements.txt

COPY . .

EXPOSE {port}

CMD {command}
"#;

const GO_TEMPLATE: &str = r#"FROM golang:1.21-alpine AS builder

WORKDIR /app

COPY go.* ./
RUN go mod download

COPY . .
RUN go build -o main .

FROM alpine:latest
WORKDIR /app
COPY --from=builder /app/main .

EXPOSE {port}

CMD {command}
"#;

const GENERIC_TEMPLATE: &str = r#"FROM ubuntu:22.04

WORKDIR /app

COPY . .

EXPOSE {port}

CMD {command}
"#;

/// Strategies in priority order; the last entry has no marker and always
/// matches.
pub const STRATEGIES: &[BuildStrategy] = &[
    BuildStrategy {
        name: "node",
        marker: Some("package.json"),
        default_command: r#"["npm", "start"]"#,
        template: NODE_TEMPLATE,
    },
    BuildStrategy {
        name: "python",
        marker: Some("requirements.txt"),
        default_command: r#"["python", "app.py"]"#,
        template: PYTHON_TEMPLATE,
    },
    BuildStrategy {
        name: "go",
        marker: Some("go.mod"),
        default_command: r#"["./main"]"#,
        template: GO_TEMPLATE,
    },
    BuildStrategy {
        name: "generic",
        marker: None,
        default_command: r#"["bash"]"#,
        template: GENERIC_TEMPLATE,
    },
];

impl BuildStrategy {
    /// Render the recipe text.
    ///
    /// `launch_command` is placed verbatim after `CMD`, so both the exec
    /// form (`["node", "server.js"]`) and the shell form work.
    pub fn render(&self, launch_command: Option<&str>, container_port: u16) -> String {
        let command = launch_command
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.default_command);
        self.template
            .replace("{port}", &container_port.to_string())
            .replace("{command}", command)
    }
}

/// Pick the first strategy whose marker exists in `dir`.
pub async fn detect(dir: &Path) -> std::io::Result<&'static BuildStrategy> {
    for strategy in STRATEGIES {
        match strategy.marker {
            Some(marker) => {
                if fs::try_exists(dir.join(marker)).await? {
                    return Ok(strategy);
                }
            }
            None => return Ok(strategy),
        }
    }
    Err(std::io::Error::other("no build strategy matched"))
}

/// A resolved build recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Recipe file inside the working directory.
    pub path: PathBuf,
    /// Strategy that produced the recipe, `None` for a shipped Dockerfile.
    pub strategy: Option<&'static str>,
}

impl Recipe {
    /// File name relative to the build context.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DOCKERFILE)
    }
}

/// Resolve the recipe for the working directory `dir`, writing
/// `Dockerfile.generated` when the project ships none.
pub async fn resolve(
    dir: &Path,
    launch_command: Option<&str>,
    container_port: u16,
) -> std::io::Result<Recipe> {
    let shipped = dir.join(DOCKERFILE);
    if fs::try_exists(&shipped).await? {
        info!(path = %shipped.display(), "Using project Dockerfile");
        return Ok(Recipe {
            path: shipped,
            strategy: None,
        });
    }

    let strategy = detect(dir).await?;
    let path = dir.join(GENERATED_DOCKERFILE);
    fs::write(&path, strategy.render(launch_command, container_port)).await?;
    info!(path = %path.display(), strategy = strategy.name, "Generated Dockerfile");

    Ok(Recipe {
        path,
        strategy: Some(strategy.name),
    })
}
