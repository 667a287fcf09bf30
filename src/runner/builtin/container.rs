//! Shared plumbing for containerised runners
//!
//! Every built-in runner mounts the working copy and its result directory
//! into a container and lets the tool write a SARIF file there.

use crate::pool::api::{JoinSummary, Task, TaskError, TaskResult};
use crate::runner::context::RunnerContext;
use crate::runner::error::RunnerResult;
use crate::scanner::process::CommandSpec;
use crate::scanner::types::{ScanPlan, ScanTarget};
use std::path::{Path, PathBuf};

/// Container engine used when the `engine` setting is absent
pub const DEFAULT_ENGINE: &str = "docker";

/// Engine and image for one runner, after applying settings overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSettings {
    engine: String,
    image: String,
    overridden: bool,
}

impl ContainerSettings {
    /// Resolve `engine` and `image` settings against the runner defaults
    pub fn resolve(ctx: &RunnerContext, default_image: &str) -> RunnerResult<Self> {
        let image = ctx.setting_str("image")?;
        Ok(Self {
            engine: ctx
                .setting_str("engine")?
                .unwrap_or(DEFAULT_ENGINE)
                .to_string(),
            image: image.unwrap_or(default_image).to_string(),
            overridden: image.is_some(),
        })
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// True when the `image` setting replaced the runner default
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// `{engine} run --rm` with the working copy and result dir mounted
    pub fn run_command(
        &self,
        checkout: &Path,
        checkout_mount: &str,
        output: &Path,
        output_mount: &str,
    ) -> CommandSpec {
        CommandSpec::new(&self.engine)
            .args(["run", "--rm"])
            .mount(checkout, checkout_mount)
            .mount(output, output_mount)
    }
}

/// Submit one scan task per target and wait for all of them
///
/// `build` returns the command for a target, or `None` to skip it (for
/// example an unsupported language). The task checks that the working copy
/// exists, creates the result directory and runs the command.
pub async fn submit_targets<F>(
    ctx: &RunnerContext,
    plan: &ScanPlan,
    mut build: F,
) -> RunnerResult<JoinSummary>
where
    F: FnMut(&ScanTarget, &Path, &Path) -> Option<CommandSpec>,
{
    let tool = ctx.name();
    let mut language: Option<&str> = None;

    for target in plan.targets() {
        let checkout = ctx.layout().checkout_dir(target);
        let output = ctx.layout().result_dir(tool, target);
        let Some(command) = build(target, &checkout, &output) else {
            continue;
        };

        if language != Some(target.language()) {
            log::info!("Running {} for language {}", tool, target.language());
            language = Some(target.language());
        }
        log::info!("Running {} for repository {}", tool, target.address());

        let task = Task::new(
            format!("{} {}", tool, target),
            run_scan(command, checkout, output),
        );
        ctx.pool().submit(task).await?;
    }

    Ok(ctx.pool().join_all().await)
}

/// Check the working copy exists and create the result directory
pub async fn prepare_dirs(checkout: &Path, output: &Path) -> TaskResult<()> {
    if !checkout.is_dir() {
        return Err(TaskError::Precondition {
            message: format!("working copy {} is missing", checkout.display()),
        });
    }

    tokio::fs::create_dir_all(output)
        .await
        .map_err(|e| TaskError::Io {
            operation: "create result directory".to_string(),
            path: output.display().to_string(),
            cause: e.to_string(),
        })
}

async fn run_scan(command: CommandSpec, checkout: PathBuf, output: PathBuf) -> TaskResult<()> {
    prepare_dirs(&checkout, &output).await?;
    command.run().await?;
    log::info!("Results saved to {}", output.display());
    Ok(())
}
