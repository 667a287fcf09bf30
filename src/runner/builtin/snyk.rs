//! Snyk runner
//!
//! Snyk needs a per-ecosystem image and an API token. Exit status 1 means
//! "vulnerabilities found" and still produces a result file.

use crate::pool::api::JoinSummary;
use crate::runner::builtin::container::{submit_targets, ContainerSettings};
use crate::runner::context::RunnerContext;
use crate::runner::error::{RunnerError, RunnerResult};
use crate::runner::traits::ScanRunner;
use crate::scanner::process::CommandSpec;
use crate::scanner::types::{ScanPlan, ScanTarget};
use std::path::Path;

/// Secret holding the Snyk API token
pub const TOKEN_SECRET: &str = "snyk-token";

const TOKEN_ENV: &str = "SNYK_TOKEN";

/// Image per configured language
const IMAGES: &[(&str, &str)] = &[
    ("CSharp", "snyk/snyk:dotnet"),
    ("Go", "snyk/snyk:golang"),
    ("Java", "snyk/snyk:gradle"),
    ("Kotlin", "snyk/snyk:gradle"),
    ("JS_TS", "snyk/snyk:node"),
    ("Python", "snyk/snyk:python"),
    ("Ruby", "snyk/snyk:ruby"),
    ("PHP", "snyk/snyk:php"),
];

pub struct SnykRunner {
    ctx: RunnerContext,
    container: ContainerSettings,
    token: String,
}

impl SnykRunner {
    pub const NAME: &'static str = "snyk";
    /// Only used when the `image` setting overrides the per-language map
    pub const IMAGE: &'static str = "snyk/snyk";

    pub fn new(ctx: RunnerContext) -> RunnerResult<Self> {
        let token = ctx
            .secret(TOKEN_SECRET)
            .ok_or_else(|| RunnerError::Configuration {
                runner: Self::NAME.to_string(),
                message: format!("secret '{}' is required", TOKEN_SECRET),
            })?
            .to_string();
        let container = ContainerSettings::resolve(&ctx, Self::IMAGE)?;
        Ok(Self {
            ctx,
            container,
            token,
        })
    }

    pub fn create(ctx: RunnerContext) -> RunnerResult<Box<dyn ScanRunner>> {
        Ok(Box::new(Self::new(ctx)?))
    }

    pub fn image_for(language: &str) -> Option<&'static str> {
        IMAGES
            .iter()
            .find(|(lang, _)| *lang == language)
            .map(|(_, image)| *image)
    }

    pub fn command(
        &self,
        target: &ScanTarget,
        checkout: &Path,
        output: &Path,
    ) -> Option<CommandSpec> {
        let image = if self.container.is_overridden() {
            self.container.image()
        } else {
            match Self::image_for(target.language()) {
                Some(image) => image,
                None => {
                    log::info!(
                        "Language not supported by Snyk: {} ({})",
                        target.language(),
                        target
                    );
                    return None;
                }
            }
        };

        Some(
            self.container
                .run_command(checkout, "/app", output, "/app/report")
                .args(["-e", TOKEN_ENV, image])
                .args(["snyk", "test", "--ignore-policy"])
                .arg("--sarif-file-output=/app/report/result.sarif")
                .env(TOKEN_ENV, &self.token)
                .success_codes(&[0, 1]),
        )
    }
}

#[async_trait::async_trait]
impl ScanRunner for SnykRunner {
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

crate::runner!(SnykRunner::NAME, SnykRunner::create);
