// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Project lifecycle orchestration.
//!
//! The [`Orchestrator`] sequences the source provisioner, recipe resolver,
//! container runner and proxy configurator, and records every status change
//! through [`ProjectStatus::apply`] so the stored status only ever moves
//! along legal edges.
//!
//! A deploy runs these stages, persisting after each step that changes the
//! record:
//!
//! 1. `building` is recorded
//! 2. source is provisioned into `{projects_dir}/{name}`
//! 3. static projects: the proxy serves the working directory
//! 4. serverside projects: a port is assigned if missing, the recipe is
//!    resolved, the image built, the container launched (replacing any
//!    previous one) and the proxy pointed at the host port
//! 5. `running` is recorded
//!
//! The first failing stage stops the sequence; the project is marked
//! `failed` with `"{stage}: {error}"` and the error is returned.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use launchpad_core::project::validate_project_name;
use launchpad_core::{
    CoreError, LifecycleEvent, NewProject, Persistence, Project, ProjectStatus, ProjectType,
    ProjectUpdate,
};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{Config, DEFAULT_PORT_RANGE};
use crate::error::{DeployStage, Error, Result};
use crate::ports::{AllocationError, DEFAULT_MAX_ATTEMPTS, PortAllocator};
use crate::proxy::{NginxConfig, NginxProxy, ProxyConfigurator};
use crate::recipe;
use crate::runner::{
    BuildOptions, ContainerState, DockerRunner, LaunchOptions, Runner, RunnerError, container_name,
    image_tag,
};
use crate::source::{GitFetcher, SourceFetcher, SourceProvisioner};

/// Lines returned by [`Orchestrator::logs`] when no tail is given.
pub const DEFAULT_LOG_TAIL: usize = 100;

/// Logs reply for projects that have no container.
pub const NO_LOGS: &str = "No logs available";

/// Logs reply for static projects.
pub const NO_LOGS_STATIC: &str = "No logs available for static projects";

/// Times a port is re-picked after losing a race on the unique column.
const PORT_CONFLICT_RETRIES: usize = 3;

/// Metadata that can be edited without redeploying.
///
/// `None` leaves a field untouched; an empty string clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataUpdate {
    /// New description.
    pub description: Option<String>,
    /// New launch command, used from the next deploy on.
    pub launch_command: Option<String>,
}

/// Outcome of [`Orchestrator::delete`].
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    /// The record as it was before deletion.
    pub project: Project,
    /// Cleanup steps that failed. The record is deleted regardless.
    pub warnings: Vec<String>,
}

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn Persistence>>,
    runner: Option<Arc<dyn Runner>>,
    proxy: Option<Arc<dyn ProxyConfigurator>>,
    fetcher: Option<Arc<dyn SourceFetcher>>,
    projects_dir: PathBuf,
    port_range: Range<u16>,
    max_port_attempts: usize,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            store: None,
            runner: None,
            proxy: None,
            fetcher: None,
            projects_dir: Config::default().projects_dir,
            port_range: DEFAULT_PORT_RANGE,
            max_port_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl OrchestratorBuilder {
    /// Set the record store (required).
    pub fn store(mut self, store: Arc<dyn Persistence>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the container runner (required).
    pub fn runner(mut self, runner: Arc<dyn Runner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Set the proxy configurator (required).
    pub fn proxy(mut self, proxy: Arc<dyn ProxyConfigurator>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set the repository fetcher.
    ///
    /// Default: `git` on the PATH
    pub fn fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the parent directory of project working directories.
    ///
    /// Default: `.data/projects`
    pub fn projects_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.projects_dir = dir.into();
        self
    }

    /// Set the host port range for serverside projects.
    ///
    /// Default: `10000..20000`
    pub fn port_range(mut self, range: Range<u16>) -> Self {
        self.port_range = range;
        self
    }

    /// Set how many random probes a port allocation makes.
    ///
    /// Default: 100
    pub fn max_port_attempts(mut self, attempts: usize) -> Self {
        self.max_port_attempts = attempts;
        self
    }

    /// Build the orchestrator.
    ///
    /// Returns an error if a required component is missing.
    pub fn build(self) -> Result<Orchestrator> {
        let store = self
            .store
            .ok_or_else(|| Error::InvalidRequest("store is required".to_string()))?;
        let runner = self
            .runner
            .ok_or_else(|| Error::InvalidRequest("runner is required".to_string()))?;
        let proxy = self
            .proxy
            .ok_or_else(|| Error::InvalidRequest("proxy is required".to_string()))?;
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(GitFetcher::default()));

        Ok(Orchestrator {
            store,
            runner,
            proxy,
            provisioner: SourceProvisioner::new(self.projects_dir, fetcher),
            allocator: PortAllocator::new(self.port_range)
                .with_max_attempts(self.max_port_attempts),
            allocation_lock: Mutex::new(()),
        })
    }
}

/// Drives projects through create, deploy, start, stop and delete.
pub struct Orchestrator {
    store: Arc<dyn Persistence>,
    runner: Arc<dyn Runner>,
    proxy: Arc<dyn ProxyConfigurator>,
    provisioner: SourceProvisioner,
    allocator: PortAllocator,
    allocation_lock: Mutex<()>,
}

type StageResult<T> = std::result::Result<T, (DeployStage, Error)>;

/// Tags a deploy step's error with the stage it failed in.
trait AtStage<T> {
    fn at(self, stage: DeployStage) -> StageResult<T>;
}

impl<T, E: Into<Error>> AtStage<T> for std::result::Result<T, E> {
    fn at(self, stage: DeployStage) -> StageResult<T> {
        self.map_err(|e| (stage, e.into()))
    }
}

fn invalid_request(err: CoreError) -> Error {
    match err {
        CoreError::ValidationError { field, message } => {
            Error::InvalidRequest(format!("{} {}", field, message))
        }
        other => other.into(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Orchestrator {
    /// Create a builder.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Orchestrator wired to docker, nginx and git as described by `config`.
    pub fn from_config(config: &Config, store: Arc<dyn Persistence>) -> Result<Self> {
        Self::builder()
            .store(store)
            .runner(Arc::new(DockerRunner::with_binary(config.docker_bin.clone())))
            .proxy(Arc::new(NginxProxy::new(NginxConfig {
                config_dir: config.nginx_config_dir.clone(),
                nginx_bin: config.nginx_bin.clone(),
                domain: config.domain.clone(),
                optional: config.nginx_optional,
            })))
            .fetcher(Arc::new(GitFetcher::new(config.git_bin.clone())))
            .projects_dir(config.projects_dir.clone())
            .port_range(config.port_range.clone())
            .build()
    }

    /// Register a project in `stopped` status.
    ///
    /// Serverside projects get a host port immediately. If no port can be
    /// assigned the record is removed again and
    /// [`Error::ResourceExhausted`] is returned.
    pub async fn create(&self, new: NewProject) -> Result<Project> {
        validate_project_name(&new.name).map_err(invalid_request)?;
        if new.source_path.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "source_path must not be empty".to_string(),
            ));
        }
        if new.container_port == Some(0) {
            return Err(Error::InvalidRequest(
                "container_port must be between 1 and 65535".to_string(),
            ));
        }
        if self.store.get_project_by_name(&new.name).await?.is_some() {
            return Err(Error::DuplicateName(new.name));
        }

        let project = match self.store.insert_project(&new).await {
            Ok(project) => project,
            Err(e) if e.is_conflict_on("name") => return Err(Error::DuplicateName(new.name)),
            Err(e) => return Err(invalid_request(e)),
        };

        if !project.is_serverside() {
            info!(project_id = project.id, name = %project.name, "Created static project");
            return Ok(project);
        }

        match self.assign_port(project.id).await {
            Ok(project) => {
                info!(
                    project_id = project.id,
                    name = %project.name,
                    port = ?project.port,
                    "Created serverside project"
                );
                Ok(project)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete_project(project.id).await {
                    error!(project_id = project.id, error = %cleanup, "Failed to remove project after port allocation failed");
                }
                Err(e)
            }
        }
    }

    /// All projects, newest first.
    pub async fn list(&self) -> Result<Vec<Project>> {
        Ok(self.store.list_projects().await?)
    }

    /// Fetch a project by id.
    pub async fn get(&self, project_id: i64) -> Result<Project> {
        self.store
            .get_project(project_id)
            .await?
            .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))
    }

    /// Fetch a project by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Project> {
        self.store
            .get_project_by_name(name)
            .await?
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
    }

    /// Edit description or launch command.
    pub async fn update(&self, project_id: i64, changes: MetadataUpdate) -> Result<Project> {
        let mut update = ProjectUpdate::new();
        if let Some(description) = changes.description {
            update = update.description(non_empty(Some(description)));
        }
        if let Some(command) = changes.launch_command {
            update = update.launch_command(non_empty(Some(command)));
        }
        if update.is_empty() {
            return self.get(project_id).await;
        }
        self.record(project_id, update).await
    }

    /// Deploy (or redeploy) a project from its source.
    pub async fn deploy(&self, project_id: i64) -> Result<Project> {
        let project = self.get(project_id).await?;
        let building = self.advance(&project, LifecycleEvent::Deploy).await?;
        info!(project_id, name = %building.name, project_type = %building.project_type, "Deploying project");

        match self.run_deploy(&building).await {
            Ok(project) => {
                info!(project_id, name = %project.name, "Deployment succeeded");
                Ok(project)
            }
            Err((stage, err)) => {
                error!(project_id, name = %building.name, stage = %stage, error = %err, "Deployment failed");
                let message = format!("{}: {}", stage, err);
                if let Err(record_err) = self
                    .advance(&building, LifecycleEvent::DeployFailed { message })
                    .await
                {
                    error!(project_id, error = %record_err, "Failed to record deployment failure");
                }
                Err(err)
            }
        }
    }

    async fn run_deploy(&self, project: &Project) -> StageResult<Project> {
        let dir = self
            .provisioner
            .provision(&project.name, project.source_type, &project.source_path)
            .await
            .at(DeployStage::Provision)?;

        let project = match project.project_type {
            ProjectType::Static => {
                self.proxy
                    .publish_static(&project.subdomain, &dir)
                    .await
                    .map_err(|e| Error::ProxyPublishFailed(e.to_string()))
                    .at(DeployStage::Publish)?;
                project.clone()
            }
            ProjectType::Serverside => self.deploy_container(project, dir).await?,
        };

        self.advance(&project, LifecycleEvent::DeploySucceeded)
            .await
            .at(DeployStage::Record)
    }

    async fn deploy_container(&self, project: &Project, dir: PathBuf) -> StageResult<Project> {
        let project = match project.port {
            Some(_) => project.clone(),
            None => self
                .assign_port(project.id)
                .await
                .at(DeployStage::Allocate)?,
        };
        let port = project.port.ok_or_else(|| {
            (
                DeployStage::Allocate,
                Error::InvalidRequest("project has no host port".to_string()),
            )
        })?;

        let recipe = recipe::resolve(
            &dir,
            project.launch_command.as_deref(),
            project.container_port,
        )
        .await
        .at(DeployStage::Recipe)?;

        let tag = image_tag(&project.name);
        self.runner
            .build_image(&BuildOptions {
                context_dir: dir,
                recipe: recipe.file_name().to_string(),
                tag: tag.clone(),
            })
            .await
            .map_err(|e| Error::BuildFailed(e.to_string()))
            .at(DeployStage::Build)?;

        let handle = self
            .runner
            .launch(&LaunchOptions {
                image: tag,
                name: container_name(&project.name),
                host_port: port,
                container_port: project.container_port,
                env: HashMap::new(),
                volumes: Vec::new(),
            })
            .await
            .map_err(|e| Error::ContainerStartFailed(e.to_string()))
            .at(DeployStage::Launch)?;

        let project = self
            .record(
                project.id,
                ProjectUpdate::new()
                    .container_id(Some(handle.handle_id))
                    .dockerfile_path(Some(recipe.path.display().to_string())),
            )
            .await
            .at(DeployStage::Record)?;

        self.proxy
            .publish_proxy(&project.subdomain, port)
            .await
            .map_err(|e| Error::ProxyPublishFailed(e.to_string()))
            .at(DeployStage::Publish)?;

        Ok(project)
    }

    /// Start a stopped or failed project. Already running is a no-op.
    pub async fn start(&self, project_id: i64) -> Result<Project> {
        let project = self.get(project_id).await?;
        let Some(transition) = project.status.apply(LifecycleEvent::Start)? else {
            debug!(project_id, "Project already running");
            return Ok(project);
        };
        let republish = transition.previous() == ProjectStatus::Failed;

        match project.project_type {
            ProjectType::Serverside => {
                let container_id = project
                    .container_id
                    .as_deref()
                    .ok_or_else(|| Error::NotDeployed(project.name.clone()))?;
                self.runner.start(container_id).await.map_err(|e| {
                    warn!(project_id, container_id = %container_id, error = %e, "Failed to start container");
                    Error::ContainerStartFailed(e.to_string())
                })?;
                if republish && let Some(port) = project.port {
                    self.proxy
                        .publish_proxy(&project.subdomain, port)
                        .await
                        .map_err(|e| Error::ProxyPublishFailed(e.to_string()))?;
                }
            }
            ProjectType::Static => {
                let dir = self.provisioner.working_dir(&project.name);
                if !fs::try_exists(&dir).await? {
                    return Err(Error::NotDeployed(project.name.clone()));
                }
                if republish {
                    self.proxy
                        .publish_static(&project.subdomain, &dir)
                        .await
                        .map_err(|e| Error::ProxyPublishFailed(e.to_string()))?;
                }
            }
        }

        info!(project_id, name = %project.name, "Started project");
        self.record(project_id, ProjectUpdate::new().transition(&transition))
            .await
    }

    /// Stop a project. Already stopped is a no-op.
    ///
    /// A failed project cannot be stopped; `start` or `deploy` it instead.
    ///
    /// A runtime failure while stopping the container is logged and the
    /// project is still marked stopped. The proxy rule stays in place.
    pub async fn stop(&self, project_id: i64) -> Result<Project> {
        let project = self.get(project_id).await?;
        let Some(transition) = project.status.apply(LifecycleEvent::Stop)? else {
            debug!(project_id, "Project already stopped");
            return Ok(project);
        };

        if project.is_serverside()
            && let Some(container_id) = project.container_id.as_deref()
            && let Err(e) = self.runner.stop(container_id).await
        {
            warn!(project_id, container_id = %container_id, error = %e, "Failed to stop container, marking stopped anyway");
        }

        info!(project_id, name = %project.name, "Stopped project");
        self.record(project_id, ProjectUpdate::new().transition(&transition))
            .await
    }

    /// Delete a project and everything deployed for it.
    ///
    /// Container, proxy rule and working directory are removed best-effort;
    /// failures are logged and reported, and the record is deleted last.
    pub async fn delete(&self, project_id: i64) -> Result<DeleteReport> {
        let project = self.get(project_id).await?;
        let mut warnings = Vec::new();

        if let Some(container_id) = project.container_id.as_deref()
            && let Err(e) = self.runner.remove(container_id).await
        {
            warn!(project_id, container_id = %container_id, error = %e, "Failed to remove container");
            warnings.push(format!("container: {}", e));
        }

        if let Err(e) = self.proxy.retract(&project.subdomain).await {
            warn!(project_id, subdomain = %project.subdomain, error = %e, "Failed to retract proxy rule");
            warnings.push(format!("proxy: {}", e));
        }

        if let Err(e) = self.provisioner.remove(&project.name).await {
            warn!(project_id, name = %project.name, error = %e, "Failed to remove working directory");
            warnings.push(format!("working directory: {}", e));
        }

        if !self.store.delete_project(project_id).await? {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        }

        info!(project_id, name = %project.name, warnings = warnings.len(), "Deleted project");
        Ok(DeleteReport { project, warnings })
    }

    /// Recent container output, `tail` lines (default 100).
    pub async fn logs(&self, project_id: i64, tail: Option<usize>) -> Result<String> {
        let project = self.get(project_id).await?;
        if !project.is_serverside() {
            return Ok(NO_LOGS_STATIC.to_string());
        }
        let Some(container_id) = project.container_id.as_deref() else {
            return Ok(NO_LOGS.to_string());
        };

        match self
            .runner
            .logs(container_id, tail.unwrap_or(DEFAULT_LOG_TAIL))
            .await
        {
            Ok(logs) => Ok(logs),
            Err(RunnerError::NotFound(_)) => Ok(NO_LOGS.to_string()),
            Err(e) => Err(e.into()),
        }
    }

    /// Live container state, `None` for static projects.
    pub async fn runtime_status(&self, project_id: i64) -> Result<Option<ContainerState>> {
        let project = self.get(project_id).await?;
        if !project.is_serverside() {
            return Ok(None);
        }
        match project.container_id.as_deref() {
            Some(container_id) => Ok(Some(self.runner.status(container_id).await?)),
            None => Ok(Some(ContainerState::NotFound)),
        }
    }

    /// Apply `event` to the stored status and persist the result.
    async fn advance(&self, project: &Project, event: LifecycleEvent) -> Result<Project> {
        match project.status.apply(event)? {
            Some(transition) => {
                self.record(project.id, ProjectUpdate::new().transition(&transition))
                    .await
            }
            None => Ok(project.clone()),
        }
    }

    async fn record(&self, project_id: i64, update: ProjectUpdate) -> Result<Project> {
        self.store
            .update_project(project_id, &update)
            .await?
            .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))
    }

    /// Pick an unused host port and persist it on the project.
    ///
    /// Allocation and persistence are serialized in-process; a conflict on
    /// the unique port column from another process triggers a re-pick.
    async fn assign_port(&self, project_id: i64) -> Result<Project> {
        let _guard = self.allocation_lock.lock().await;

        for attempt in 1..=PORT_CONFLICT_RETRIES {
            let used: HashSet<u16> = self.store.used_ports().await?.into_iter().collect();
            let port = self.allocator.allocate(&used)?;

            match self
                .store
                .update_project(project_id, &ProjectUpdate::new().port(port))
                .await
            {
                Ok(Some(project)) => {
                    info!(project_id, port, "Assigned host port");
                    return Ok(project);
                }
                Ok(None) => return Err(Error::ProjectNotFound(project_id.to_string())),
                Err(e) if e.is_conflict_on("port") => {
                    warn!(project_id, port, attempt, "Port taken concurrently, picking another");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let range = self.allocator.range();
        Err(AllocationError::Exhausted {
            start: range.start,
            end: range.end,
            attempts: PORT_CONFLICT_RETRIES,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::MockProxy;
    use crate::runner::MockRunner;
    use crate::source::MockFetcher;
    use launchpad_core::SourceType;
    use launchpad_core::persistence::sqlite::SqlitePersistence;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    struct Fixture {
        orchestrator: Orchestrator,
        runner: Arc<MockRunner>,
        proxy: Arc<MockProxy>,
        _temp: TempDir,
    }

    async fn fixture(range: Range<u16>) -> Fixture {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let proxy = Arc::new(MockProxy::default());
        let store = Arc::new(SqlitePersistence::in_memory().await.unwrap());
        let orchestrator = Orchestrator::builder()
            .store(store)
            .runner(runner.clone())
            .proxy(proxy.clone())
            .fetcher(Arc::new(MockFetcher::new()))
            .projects_dir(temp.path().join("projects"))
            .port_range(range)
            .build()
            .unwrap();
        Fixture {
            orchestrator,
            runner,
            proxy,
            _temp: temp,
        }
    }

    fn local_app(name: &str, project_type: ProjectType, source: &std::path::Path) -> NewProject {
        NewProject {
            name: name.to_string(),
            project_type,
            source_type: SourceType::Local,
            source_path: source.display().to_string(),
            launch_command: None,
            container_port: None,
            description: None,
        }
    }

    #[test]
    fn test_builder_requires_components() {
        let err = Orchestrator::builder().build().err().unwrap();
        assert!(matches!(err, Error::InvalidRequest(ref m) if m == "store is required"));
    }

    #[test]
    fn test_at_stage_tags_errors() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk full"));
        let (stage, err) = result.at(DeployStage::Recipe).unwrap_err();
        assert_eq!(stage, DeployStage::Recipe);
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_source_and_zero_port() {
        let f = fixture(10000..10010).await;
        let mut new = local_app("app", ProjectType::Serverside, std::path::Path::new(""));
        assert!(matches!(
            f.orchestrator.create(new.clone()).await,
            Err(Error::InvalidRequest(_))
        ));

        new.source_path = "/srv/app".to_string();
        new.container_port = Some(0);
        assert!(matches!(
            f.orchestrator.create(new).await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(f.orchestrator.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_clears_with_empty_string() {
        let f = fixture(10000..10010).await;
        let source = TempDir::new().unwrap();
        let project = f
            .orchestrator
            .create(local_app("site", ProjectType::Static, source.path()))
            .await
            .unwrap();

        let updated = f
            .orchestrator
            .update(
                project.id,
                MetadataUpdate {
                    description: Some("Landing page".to_string()),
                    launch_command: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Landing page"));

        let cleared = f
            .orchestrator
            .update(
                project.id,
                MetadataUpdate {
                    description: Some(String::new()),
                    launch_command: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.description, None);
    }

    #[tokio::test]
    async fn test_deploy_while_building_is_rejected() {
        let f = fixture(10000..10010).await;
        let source = TempDir::new().unwrap();
        let project = f
            .orchestrator
            .create(local_app("site", ProjectType::Static, source.path()))
            .await
            .unwrap();
        f.orchestrator
            .advance(&project, LifecycleEvent::Deploy)
            .await
            .unwrap();

        let err = f.orchestrator.deploy(project.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(f.proxy.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_serverside_start_republishes() {
        let f = fixture(10000..10010).await;
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("go.mod"), "module svc\n").unwrap();
        let project = f
            .orchestrator
            .create(local_app("svc", ProjectType::Serverside, source.path()))
            .await
            .unwrap();
        f.orchestrator.deploy(project.id).await.unwrap();
        let published = f.proxy.publish_count();

        f.proxy.fail_publish.store(true, Ordering::SeqCst);
        f.orchestrator.deploy(project.id).await.unwrap_err();
        let failed = f.orchestrator.get(project.id).await.unwrap();
        assert_eq!(failed.status, ProjectStatus::Failed);
        assert!(failed.error_message.unwrap().starts_with("publish:"));
        f.proxy.fail_publish.store(false, Ordering::SeqCst);

        let started = f.orchestrator.start(project.id).await.unwrap();
        assert_eq!(started.status, ProjectStatus::Running);
        assert_eq!(started.error_message, None);
        assert_eq!(f.proxy.publish_count(), published + 1);
        assert_eq!(f.runner.start_count().await, 1);
    }

    #[tokio::test]
    async fn test_logs_without_container() {
        let f = fixture(10000..10010).await;
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("package.json"), "{}").unwrap();
        let project = f
            .orchestrator
            .create(local_app("web", ProjectType::Serverside, source.path()))
            .await
            .unwrap();

        assert_eq!(f.orchestrator.logs(project.id, None).await.unwrap(), NO_LOGS);
        assert_eq!(
            f.orchestrator.runtime_status(project.id).await.unwrap(),
            Some(ContainerState::NotFound)
        );

        let deployed = f.orchestrator.deploy(project.id).await.unwrap();
        let logs = f.orchestrator.logs(project.id, Some(5)).await.unwrap();
        assert!(logs.contains("tail 5"));

        f.runner
            .remove(deployed.container_id.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(f.orchestrator.logs(project.id, None).await.unwrap(), NO_LOGS);
    }
}
