//! Semgrep runner

use crate::pool::api::JoinSummary;
use crate::runner::builtin::container::{submit_targets, ContainerSettings};
use crate::runner::context::RunnerContext;
use crate::runner::error::RunnerResult;
use crate::runner::traits::ScanRunner;
use crate::scanner::process::CommandSpec;
use crate::scanner::types::{ScanPlan, ScanTarget};
use std::path::Path;

pub struct SemgrepRunner {
    ctx: RunnerContext,
    container: ContainerSettings,
}

impl SemgrepRunner {
    pub const NAME: &'static str = "semgrep";
    pub const IMAGE: &'static str = "returntocorp/semgrep";

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
            .args([self.container.image(), "semgrep", "scan", "--sarif"])
            .args(["--sarif-output=/report/result.sarif", "/src"])
    }
}

#[async_trait::async_trait]
impl ScanRunner for SemgrepRunner {
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

crate::runner!(SemgrepRunner::NAME, SemgrepRunner::create);
