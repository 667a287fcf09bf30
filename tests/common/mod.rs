//! Common test utilities and helpers
//!
//! A fetcher that only creates directories and a runner that writes SARIF
//! files itself, so whole batches run without git or containers.

#![allow(dead_code)]

use sastbench::pool::api::{JoinSummary, Task, TaskError, TaskResult};
use sastbench::runner::api::{
    RunnerContext, RunnerDescriptor, RunnerRegistry, RunnerResult, ScanRunner,
};
use sastbench::scanner::api::{Fetcher, ScanPlan, ScanTarget, VulnerabilityClass, WorkspaceLayout};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Creates the working copy; fails for addresses containing "unreachable"
pub struct FakeFetcher {
    pub log: EventLog,
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, address: &str, destination: &Path) -> TaskResult<()> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.log.lock().unwrap().push(format!("fetch {}", address));
        if address.contains("unreachable") {
            return Err(TaskError::Precondition {
                message: format!("cannot reach {}", address),
            });
        }
        std::fs::create_dir_all(destination).map_err(|e| TaskError::Io {
            operation: "create working copy".to_string(),
            path: destination.display().to_string(),
            cause: e.to_string(),
        })
    }
}

/// SARIF document with one result per (rule, level, message, uri, line)
pub fn sarif_doc(driver: &str, results: &[(&str, &str, &str, &str, u64)]) -> String {
    let results: Vec<serde_json::Value> = results
        .iter()
        .map(|(rule, level, message, uri, line)| {
            serde_json::json!({
                "ruleId": rule,
                "level": level,
                "message": { "text": message },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": uri },
                        "region": { "startLine": line }
                    }
                }]
            })
        })
        .collect();
    serde_json::json!({
        "version": "2.1.0",
        "runs": [{ "tool": { "driver": { "name": driver } }, "results": results }]
    })
    .to_string()
}

/// Writes `result.sarif` for every target whose working copy exists
///
/// Vulnerable targets get two findings, non-vulnerable targets none.
pub struct SarifWritingRunner {
    ctx: RunnerContext,
    log: EventLog,
}

#[async_trait::async_trait]
impl ScanRunner for SarifWritingRunner {
    fn name(&self) -> &str {
        self.ctx.name()
    }

    async fn run(&self, plan: &ScanPlan) -> RunnerResult<JoinSummary> {
        for target in plan.targets() {
            let checkout = self.ctx.layout().checkout_dir(target);
            let output = self.ctx.layout().result_dir(self.ctx.name(), target);
            let document = findings_for(self.ctx.name(), target);
            let log = self.log.clone();
            let label = format!("{} {}", self.ctx.name(), target);

            self.ctx
                .pool()
                .submit(Task::new(label.clone(), async move {
                    if !checkout.is_dir() {
                        return Err(TaskError::Precondition {
                            message: format!("working copy {} is missing", checkout.display()),
                        });
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    std::fs::create_dir_all(&output).map_err(|e| io_error(&output, e))?;
                    let file = output.join("result.sarif");
                    std::fs::write(&file, document).map_err(|e| io_error(&file, e))?;
                    log.lock().unwrap().push(label);
                    Ok(())
                }))
                .await?;
        }
        Ok(self.ctx.pool().join_all().await)
    }
}

fn findings_for(tool: &str, target: &ScanTarget) -> String {
    match target.class() {
        VulnerabilityClass::Vulnerable => sarif_doc(
            tool,
            &[
                ("injection", "error", "Tainted input reaches query", "db/query.go", 42),
                ("crypto", "warning", "Weak hash", "auth/hash.go", 7),
            ],
        ),
        VulnerabilityClass::NonVulnerable => sarif_doc(tool, &[]),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> TaskError {
    TaskError::Io {
        operation: "write result".to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    }
}

/// Registry holding one `SarifWritingRunner` per name
pub fn writing_registry(names: &[&str], log: &EventLog) -> RunnerRegistry {
    let mut registry = RunnerRegistry::new();
    for name in names {
        let log = log.clone();
        registry
            .register(*name, move |ctx| {
                Ok(Box::new(SarifWritingRunner {
                    ctx,
                    log: log.clone(),
                }) as Box<dyn ScanRunner>)
            })
            .unwrap();
    }
    registry
}

pub fn descriptors(names: &[&str]) -> Vec<RunnerDescriptor> {
    names.iter().map(|n| RunnerDescriptor::new(*n)).collect()
}

/// Go/repoA (vulnerable) and Python/repoB (non-vulnerable) under `root`
pub fn two_language_plan(root: &Path) -> ScanPlan {
    let targets = vec![
        ScanTarget::from_address(
            "https://github.com/org/repoA",
            "Go",
            VulnerabilityClass::Vulnerable,
        )
        .unwrap(),
        ScanTarget::from_address(
            "https://github.com/org/repoB.git",
            "Python",
            VulnerabilityClass::NonVulnerable,
        )
        .unwrap(),
    ];
    ScanPlan::new(
        targets,
        WorkspaceLayout::new(root.join("repositories"), root.join("scan_results")),
        BTreeMap::new(),
    )
}
