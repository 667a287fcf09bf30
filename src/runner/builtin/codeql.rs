//! CodeQL runner
//!
//! Builds a database from the working copy, then analyzes it to SARIF, both
//! inside one container invocation.

use crate::pool::api::JoinSummary;
use crate::runner::builtin::container::{submit_targets, ContainerSettings};
use crate::runner::context::RunnerContext;
use crate::runner::error::RunnerResult;
use crate::runner::traits::ScanRunner;
use crate::scanner::process::CommandSpec;
use crate::scanner::types::{ScanPlan, ScanTarget};
use std::path::Path;

/// CodeQL extractor per configured language
const LANGUAGES: &[(&str, &str)] = &[
    ("JS_TS", "javascript"),
    ("Python", "python"),
    ("Java", "java"),
    ("Kotlin", "java"),
    ("C_CPP", "cpp"),
    ("CSharp", "csharp"),
    ("Ruby", "ruby"),
    ("Go", "go"),
];

pub struct CodeQlRunner {
    ctx: RunnerContext,
    container: ContainerSettings,
}

impl CodeQlRunner {
    pub const NAME: &'static str = "codeql";
    pub const IMAGE: &'static str = "mcr.microsoft.com/cstsectools/codeql-container";

    pub fn new(ctx: RunnerContext) -> RunnerResult<Self> {
        let container = ContainerSettings::resolve(&ctx, Self::IMAGE)?;
        Ok(Self { ctx, container })
    }

    pub fn create(ctx: RunnerContext) -> RunnerResult<Box<dyn ScanRunner>> {
        Ok(Box::new(Self::new(ctx)?))
    }

    pub fn extractor_for(language: &str) -> Option<&'static str> {
        LANGUAGES
            .iter()
            .find(|(lang, _)| *lang == language)
            .map(|(_, extractor)| *extractor)
    }

    pub fn command(
        &self,
        target: &ScanTarget,
        checkout: &Path,
        output: &Path,
    ) -> Option<CommandSpec> {
        let Some(extractor) = Self::extractor_for(target.language()) else {
            log::warn!(
                "Language not supported by CodeQL: {} ({})",
                target.language(),
                target
            );
            return None;
        };

        let script = format!(
            "codeql database create --language={} --threads=0 --source-root=/src /tmp/database --overwrite \
             && codeql database analyze /tmp/database --threads=0 --format=sarifv2.1.0 --output=/report/report.sarif",
            extractor
        );

        Some(
            self.container
                .run_command(checkout, "/src", output, "/report")
                .args(["--entrypoint", "/bin/bash", self.container.image(), "-c"])
                .arg(script),
        )
    }
}

#[async_trait::async_trait]
impl ScanRunner for CodeQlRunner {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, plan: &ScanPlan) -> RunnerResult<JoinSummary> {
        submit_targets(&self.ctx, plan, |target, checkout, output| {
            self.command(target, checkout, output)
        })
        .await
    }
}

crate::runner!(CodeQlRunner::NAME, CodeQlRunner::create);
