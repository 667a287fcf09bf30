//! Horusec runner
//!
//! Horusec starts its own analysis containers, so the docker socket is
//! mounted and the host project path is passed alongside the container one.

use crate::pool::api::JoinSummary;
use crate::runner::builtin::container::{submit_targets, ContainerSettings};
use crate::runner::context::RunnerContext;
use crate::runner::error::RunnerResult;
use crate::runner::traits::ScanRunner;
use crate::scanner::process::CommandSpec;
use crate::scanner::types::{ScanPlan, ScanTarget};
use std::path::Path;

const DOCKER_SOCKET: &str = "/var/run/docker.sock";

pub struct HorusecRunner {
    ctx: RunnerContext,
    container: ContainerSettings,
}

impl HorusecRunner {
    pub const NAME: &'static str = "horusec";
    pub const IMAGE: &'static str = "horuszup/horusec-cli:v2.9.0-beta.3";

    pub fn new(ctx: RunnerContext) -> RunnerResult<Self> {
        let container = ContainerSettings::resolve(&ctx, Self::IMAGE)?;
        Ok(Self { ctx, container })
    }

    pub fn create(ctx: RunnerContext) -> RunnerResult<Box<dyn ScanRunner>> {
        Ok(Box::new(Self::new(ctx)?))
    }

    pub fn command(&self, _target: &ScanTarget, checkout: &Path, output: &Path) -> CommandSpec {
        self.container
            .run_command(checkout, "/src", output, "/report")
            .mount(Path::new(DOCKER_SOCKET), DOCKER_SOCKET)
            .args([self.container.image(), "horusec", "start", "-p", "/src"])
            .arg("-P")
            .arg(checkout.display().to_string())
            .args(["--output-format", "sarif"])
            .args(["--json-output-file", "/report/report.sarif"])
    }
}

#[async_trait::async_trait]
impl ScanRunner for HorusecRunner {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, plan: &ScanPlan) -> RunnerResult<JoinSummary> {
        submit_targets(&self.ctx, plan, |target, checkout, output| {
            Some(self.command(target, checkout, output))
        })
        .await
    }
}

crate::runner!(HorusecRunner::NAME, HorusecRunner::create);
