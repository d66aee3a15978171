// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Source provisioning.
//!
//! Every deploy starts from a clean working directory at
//! `{projects_dir}/{name}`: an existing directory is removed, then the source
//! is cloned (GitHub) or copied (local path) into it.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use launchpad_core::SourceType;
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors from source provisioning.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A local source path does not exist.
    #[error("Source path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    /// The remote repository could not be cloned.
    #[error("Failed to clone {url}: {message}")]
    Fetch {
        /// Repository URL.
        url: String,
        /// Fetcher output.
        message: String,
    },

    /// The working directory would land inside the directory being copied.
    #[error("Source {} contains the working directory {}", .path.display(), .working_dir.display())]
    ContainsWorkingDir {
        /// Local source directory.
        path: PathBuf,
        /// Working directory it would be copied into.
        working_dir: PathBuf,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Fetches a remote repository into a directory.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Clone `url` into `dest`. `dest` does not exist when this is called.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Fetcher shelling out to `git clone`.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    git_bin: String,
}

impl GitFetcher {
    /// Fetcher using the given git executable.
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
        }
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        info!(url = %url, dest = %dest.display(), "Cloning repository");

        let output = Command::new(&self.git_bin)
            .arg("clone")
            .arg("--")
            .arg(url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| SourceError::Fetch {
                url: url.to_string(),
                message: format!("failed to run {}: {}", self.git_bin, e),
            })?;

        if !output.status.success() {
            return Err(SourceError::Fetch {
                url: url.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(url = %url, "Successfully cloned repository");
        Ok(())
    }
}

/// In-memory fetcher for tests.
///
/// Each registered URL materializes as a directory holding the registered
/// files; unregistered URLs clone as an empty directory unless marked as
/// failing.
#[derive(Default)]
pub struct MockFetcher {
    repos: Mutex<HashMap<String, Vec<(String, String)>>>,
    failing: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Create an empty mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the files a URL clones to.
    pub async fn add_repo(&self, url: &str, files: &[(&str, &str)]) {
        self.repos.lock().await.insert(
            url.to_string(),
            files
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_string()))
                .collect(),
        );
    }

    /// Make fetching `url` fail.
    pub async fn fail_repo(&self, url: &str) {
        self.failing.lock().await.insert(url.to_string());
    }

    /// URLs fetched so far, in order.
    pub async fn fetched(&self) -> Vec<String> {
        self.fetched.lock().await.clone()
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        self.fetched.lock().await.push(url.to_string());

        if self.failing.lock().await.contains(url) {
            return Err(SourceError::Fetch {
                url: url.to_string(),
                message: "repository not found".to_string(),
            });
        }

        fs::create_dir_all(dest).await?;
        let files = self.repos.lock().await.get(url).cloned().unwrap_or_default();
        for (name, body) in files {
            let path = dest.join(&name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, body).await?;
        }
        Ok(())
    }
}

/// Materializes project sources into per-project working directories.
#[derive(Clone)]
pub struct SourceProvisioner {
    projects_dir: PathBuf,
    fetcher: Arc<dyn SourceFetcher>,
}

impl SourceProvisioner {
    /// Provisioner rooted at `projects_dir`.
    pub fn new(projects_dir: impl Into<PathBuf>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
            fetcher,
        }
    }

    /// Working directory of the project called `name`.
    pub fn working_dir(&self, name: &str) -> PathBuf {
        self.projects_dir.join(name)
    }

    /// Prepare a fresh working directory for `name` and return its path.
    pub async fn provision(
        &self,
        name: &str,
        source_type: SourceType,
        source_path: &str,
    ) -> Result<PathBuf> {
        let dir = self.working_dir(name);
        if self.remove(name).await? {
            debug!(dir = %dir.display(), "Removed previous working directory");
        }
        fs::create_dir_all(&self.projects_dir).await?;

        match source_type {
            SourceType::Github => self.fetcher.fetch(source_path, &dir).await?,
            SourceType::Local => copy_local(Path::new(source_path), &dir).await?,
        }

        info!(name = %name, dir = %dir.display(), source_type = %source_type, "Provisioned source");
        Ok(dir)
    }

    /// Remove the working directory of `name`. Returns whether one existed.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let dir = self.working_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Copy a local directory's contents, or a single file, into `dest`.
///
/// Symbolic links inside the tree are recreated as links, never followed.
/// `dest` must not lie inside `source`.
async fn copy_local(source: &Path, dest: &Path) -> Result<()> {
    let metadata = match fs::metadata(source).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SourceError::NotFound(source.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.is_dir() {
        ensure_outside(source, dest).await?;
    }

    info!(source = %source.display(), dest = %dest.display(), "Copying local source");
    fs::create_dir_all(dest).await?;

    if !metadata.is_dir() {
        let file_name = source
            .file_name()
            .ok_or_else(|| SourceError::NotFound(source.to_path_buf()))?;
        fs::copy(source, dest.join(file_name)).await?;
        return Ok(());
    }

    let mut pending = vec![(source.to_path_buf(), dest.to_path_buf())];
    while let Some((from, to)) = pending.pop() {
        let mut entries = fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = to.join(entry.file_name());
            let file_type = fs::symlink_metadata(entry.path()).await?.file_type();
            if file_type.is_symlink() {
                copy_link(&entry.path(), &target).await?;
            } else if file_type.is_dir() {
                fs::create_dir_all(&target).await?;
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), &target).await?;
            }
        }
    }
    Ok(())
}

/// Refuse to copy `source` into a `dest` below it.
async fn ensure_outside(source: &Path, dest: &Path) -> Result<()> {
    let source = fs::canonicalize(source).await?;
    let resolved = match (dest.parent(), dest.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent).await?.join(name),
        _ => dest.to_path_buf(),
    };
    if resolved.starts_with(&source) {
        return Err(SourceError::ContainsWorkingDir {
            path: source,
            working_dir: resolved,
        });
    }
    Ok(())
}

#[cfg(unix)]
async fn copy_link(link: &Path, target: &Path) -> Result<()> {
    let points_to = fs::read_link(link).await?;
    debug!(link = %link.display(), points_to = %points_to.display(), "Recreating symlink");
    fs::symlink(points_to, target).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn copy_link(link: &Path, _target: &Path) -> Result<()> {
    tracing::warn!(link = %link.display(), "Skipping symlink in local source");
    Ok(())
}
