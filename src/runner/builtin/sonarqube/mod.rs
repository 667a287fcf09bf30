//! SonarQube runner
//!
//! SonarQube analyses on a server rather than in a one-shot container. The
//! runner starts the server container (unless `manage-server = false`) and
//! waits for it to report GREEN. Each target then gets its own project: the
//! scanner container uploads the working copy, the runner waits for the
//! background analysis and exports the project's vulnerabilities as SARIF.
//! The server container is removed when the run ends, even when the run is
//! cancelled.

pub mod client;
pub mod sarif;

use crate::pool::api::{JoinSummary, Task, TaskError, TaskResult};
use crate::runner::builtin::container::{prepare_dirs, ContainerSettings};
use crate::runner::context::RunnerContext;
use crate::runner::error::{RunnerError, RunnerResult};
use crate::runner::traits::ScanRunner;
use crate::scanner::process::CommandSpec;
use crate::scanner::types::{ScanPlan, ScanTarget};
use client::{AnalysisState, SonarQubeClient};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::time::Instant;

/// Secrets holding the server credentials; both default to `admin`
pub const USER_SECRET: &str = "sonarqube-user";
pub const PASSWORD_SECRET: &str = "sonarqube-password";

/// File written into each result directory
pub const RESULT_FILE: &str = "sonarqube_issues.sarif";

const DEFAULT_CREDENTIAL: &str = "admin";
const DEFAULT_URL: &str = "http://localhost:9000";
const DEFAULT_SERVER_IMAGE: &str = "sonarqube:lts";
const SERVER_CONTAINER_NAME: &str = "sastbench-sonarqube";
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 300;
const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 600;
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const SCANNER_OPTS_ENV: &str = "SONAR_SCANNER_OPTS";

pub struct SonarQubeRunner {
    ctx: RunnerContext,
    scanner: ContainerSettings,
    server_image: String,
    manage_server: bool,
    startup_timeout: Duration,
    analysis_timeout: Duration,
    client: SonarQubeClient,
    user: String,
    password: String,
}

impl SonarQubeRunner {
    pub const NAME: &'static str = "sonarqube";
    /// Scanner image; `image` overrides it
    pub const IMAGE: &'static str = "sonarsource/sonar-scanner-cli";

    pub fn new(ctx: RunnerContext) -> RunnerResult<Self> {
        let scanner = ContainerSettings::resolve(&ctx, Self::IMAGE)?;
        let url = ctx.setting_str("url")?.unwrap_or(DEFAULT_URL).to_string();
        let server_image = ctx
            .setting_str("server-image")?
            .unwrap_or(DEFAULT_SERVER_IMAGE)
            .to_string();
        let manage_server = ctx.setting_bool("manage-server")?.unwrap_or(true);
        let startup_timeout = Duration::from_secs(
            ctx.setting_u64("startup-timeout")?
                .unwrap_or(DEFAULT_STARTUP_TIMEOUT_SECS),
        );
        let analysis_timeout = Duration::from_secs(
            ctx.setting_u64("analysis-timeout")?
                .unwrap_or(DEFAULT_ANALYSIS_TIMEOUT_SECS),
        );

        let user = ctx
            .secret(USER_SECRET)
            .unwrap_or(DEFAULT_CREDENTIAL)
            .to_string();
        let password = ctx
            .secret(PASSWORD_SECRET)
            .unwrap_or(DEFAULT_CREDENTIAL)
            .to_string();
        let client = SonarQubeClient::new(url, user.as_str(), password.as_str()).map_err(|e| {
            RunnerError::Configuration {
                runner: Self::NAME.to_string(),
                message: format!("cannot build HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            ctx,
            scanner,
            server_image,
            manage_server,
            startup_timeout,
            analysis_timeout,
            client,
            user,
            password,
        })
    }

    pub fn create(ctx: RunnerContext) -> RunnerResult<Box<dyn ScanRunner>> {
        Ok(Box::new(Self::new(ctx)?))
    }

    pub fn client(&self) -> &SonarQubeClient {
        &self.client
    }

    pub fn manages_server(&self) -> bool {
        self.manage_server
    }

    /// Project key for a target; `stamp` keeps reruns apart
    pub fn project_key(target: &ScanTarget, stamp: i64) -> String {
        format!("sastbench-{}-{}", target.short_id(), stamp)
    }

    /// Scanner container for one target
    ///
    /// Credentials travel in `SONAR_SCANNER_OPTS` through the child
    /// environment so they never reach argv or the logs.
    pub fn command(&self, checkout: &Path, project_key: &str) -> CommandSpec {
        CommandSpec::new(self.scanner.engine())
            .args(["run", "--rm", "--network", "host"])
            .mount(checkout, "/usr/src")
            .args(["-e", SCANNER_OPTS_ENV, self.scanner.image()])
            .arg(format!("-Dsonar.projectKey={}", project_key))
            .arg("-Dsonar.sources=.")
            .arg(format!("-Dsonar.host.url={}", self.client.base_url()))
            .env(
                SCANNER_OPTS_ENV,
                format!(
                    "-Dsonar.login={} -Dsonar.password={}",
                    self.user, self.password
                ),
            )
    }

    fn service_error(&self, e: TaskError) -> RunnerError {
        RunnerError::Service {
            runner: Self::NAME.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ScanRunner for SonarQubeRunner {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, plan: &ScanPlan) -> RunnerResult<JoinSummary> {
        let server = if self.manage_server {
            let server = ServerContainer::start(self.scanner.engine(), &self.server_image)
                .await
                .map_err(|e| self.service_error(e))?;
            Some(server)
        } else {
            None
        };

        wait_until_ready(&self.client, self.startup_timeout)
            .await
            .map_err(|e| self.service_error(e))?;

        let tool = self.ctx.name();
        let stamp = chrono::Utc::now().timestamp();
        let mut language: Option<&str> = None;

        for target in plan.targets() {
            if language != Some(target.language()) {
                log::info!("Running {} for language {}", tool, target.language());
                language = Some(target.language());
            }
            log::info!("Running {} for repository {}", tool, target.address());

            let checkout = self.ctx.layout().checkout_dir(target);
            let project_key = Self::project_key(target, stamp);
            let job = ScanJob {
                client: self.client.clone(),
                command: self.command(&checkout, &project_key),
                project_name: target.to_string(),
                project_key,
                checkout,
                output: self.ctx.layout().result_dir(tool, target),
                analysis_timeout: self.analysis_timeout,
            };
            self.ctx
                .pool()
                .submit(Task::new(format!("{} {}", tool, target), job.run()))
                .await?;
        }

        let summary = self.ctx.pool().join_all().await;
        if let Some(server) = server {
            server.stop().await;
        }
        Ok(summary)
    }
}

crate::runner!(SonarQubeRunner::NAME, SonarQubeRunner::create);

/// Poll server health until it is GREEN or `timeout` has passed
pub async fn wait_until_ready(client: &SonarQubeClient, timeout: Duration) -> TaskResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        match client.health().await {
            Ok(health) if health == "GREEN" => {
                log::info!("SonarQube is ready at {}", client.base_url());
                return Ok(());
            }
            Ok(health) => log::info!("Waiting for SonarQube to be ready (health {})", health),
            Err(e) => log::debug!("SonarQube is not available yet: {}", e),
        }

        if Instant::now() >= deadline {
            return Err(TaskError::Precondition {
                message: format!(
                    "SonarQube at {} was not ready within {:?}",
                    client.base_url(),
                    timeout
                ),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn wait_for_analysis(
    client: &SonarQubeClient,
    project_key: &str,
    timeout: Duration,
) -> TaskResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        match client.analysis_state(project_key).await? {
            AnalysisState::Succeeded => return Ok(()),
            AnalysisState::Failed(status) => {
                return Err(TaskError::Precondition {
                    message: format!("analysis of {} ended with {}", project_key, status),
                })
            }
            AnalysisState::Pending => {}
        }

        if Instant::now() >= deadline {
            return Err(TaskError::Precondition {
                message: format!(
                    "analysis of {} did not finish within {:?}",
                    project_key, timeout
                ),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Everything one target's task needs, owned so the task is `'static`
struct ScanJob {
    client: SonarQubeClient,
    command: CommandSpec,
    project_key: String,
    project_name: String,
    checkout: PathBuf,
    output: PathBuf,
    analysis_timeout: Duration,
}

impl ScanJob {
    async fn run(self) -> TaskResult<()> {
        prepare_dirs(&self.checkout, &self.output).await?;
        self.client
            .create_project(&self.project_key, &self.project_name)
            .await?;
        self.command.run().await?;
        wait_for_analysis(&self.client, &self.project_key, self.analysis_timeout).await?;

        let issues = self.client.vulnerabilities(&self.project_key).await?;
        let mut rules = BTreeMap::new();
        for issue in &issues {
            if rules.contains_key(&issue.rule) {
                continue;
            }
            match self.client.rule(&issue.rule).await {
                Ok(Some(rule)) => {
                    rules.insert(issue.rule.clone(), rule);
                }
                Ok(None) => log::debug!("No rule found with key {}", issue.rule),
                Err(e) => log::warn!("Rule lookup for {} failed: {}", issue.rule, e),
            }
        }

        let path = self.output.join(RESULT_FILE);
        let document = sarif::issues_to_sarif(&self.project_key, &issues, &rules);
        let text = serde_json::to_string_pretty(&document).map_err(|e| TaskError::Io {
            operation: "serialise SARIF".to_string(),
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| TaskError::Io {
                operation: "write result file".to_string(),
                path: path.display().to_string(),
                cause: e.to_string(),
            })?;

        log::info!("Exported {} issue(s) to {}", issues.len(), path.display());
        Ok(())
    }
}

/// The SonarQube server container, removed on `stop` or drop
struct ServerContainer {
    engine: String,
    running: bool,
}

impl ServerContainer {
    async fn start(engine: &str, image: &str) -> TaskResult<Self> {
        let server = Self {
            engine: engine.to_string(),
            running: true,
        };

        // A container left by an interrupted run would hold the name
        if server.remove_command().run().await.is_ok() {
            log::debug!("Removed stale container {}", SERVER_CONTAINER_NAME);
        }

        CommandSpec::new(engine)
            .args(["run", "-d", "--name", SERVER_CONTAINER_NAME])
            .args(["--network", "host", image])
            .run()
            .await?;
        log::info!("Started SonarQube container from {}", image);
        Ok(server)
    }

    fn remove_command(&self) -> CommandSpec {
        CommandSpec::new(&self.engine).args(["rm", "--force", SERVER_CONTAINER_NAME])
    }

    async fn stop(mut self) {
        self.running = false;
        match self.remove_command().run().await {
            Ok(()) => log::info!("SonarQube container stopped and removed"),
            Err(e) => log::warn!("Failed to remove SonarQube container: {}", e),
        }
    }
}

impl Drop for ServerContainer {
    fn drop(&mut self) {
        if !self.running {
            return;
        }
        // Dropped mid-run (shutdown or early error); no runtime to await on
        let status = std::process::Command::new(&self.engine)
            .args(["rm", "--force", SERVER_CONTAINER_NAME])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => log::info!("SonarQube container removed"),
            Ok(s) => log::warn!("Removing SonarQube container exited with {}", s),
            Err(e) => log::warn!("Failed to remove SonarQube container: {}", e),
        }
    }
}
