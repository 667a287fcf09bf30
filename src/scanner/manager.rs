//! Scan Orchestrator
//!
//! Drives one batch through its phases: fetch every target, wait for all
//! fetches, then run each selected runner in configured order with a barrier
//! after each one. Phases never overlap and never loop back.
//!
//! ```text
//! Prepare ──▶ Fetch ──▶ [barrier] ──▶ Scan(runner 1) ──▶ ... ──▶ Scan(runner n) ──▶ Done
//! ```
//!
//! A shutdown signal at any point cancels every in-flight task and ends the
//! batch before the next phase or runner.

use crate::pool::api::{JoinSummary, Task, WorkerPool};
use crate::runner::api::{RunnerContext, RunnerDescriptor, RunnerRegistry, ScanRunner};
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::fetch::Fetcher;
use crate::scanner::types::ScanPlan;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::RecvError};

/// Batch phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    #[default]
    Prepare,
    Fetch,
    Scan,
    Done,
}

/// Options that narrow a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Reuse existing working copies
    pub skip_fetch: bool,
    /// Run only these runners (all enabled runners when empty)
    pub runners: Vec<String>,
}

/// Outcome of one runner invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSummary {
    pub name: String,
    pub summary: JoinSummary,
    pub elapsed: Duration,
}

/// What a batch did, phase by phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// `None` when the fetch phase was skipped
    pub fetch: Option<JoinSummary>,
    pub runners: Vec<RunnerSummary>,
    /// Last phase entered
    pub phase: Phase,
    pub interrupted: bool,
}

impl BatchSummary {
    /// Task failures across every phase
    pub fn failures(&self) -> usize {
        self.fetch.map(|f| f.failures()).unwrap_or(0)
            + self
                .runners
                .iter()
                .map(|r| r.summary.failures())
                .sum::<usize>()
    }
}

/// Coordinates fetch and scan phases over a shared worker pool
pub struct ScanOrchestrator {
    pool: Arc<WorkerPool>,
    registry: RunnerRegistry,
    fetcher: Arc<dyn Fetcher>,
    options: ScanOptions,
}

impl ScanOrchestrator {
    pub fn new(
        pool: Arc<WorkerPool>,
        registry: RunnerRegistry,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            pool,
            registry,
            fetcher,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Build every selected runner, in configured order
    ///
    /// Disabled descriptors are skipped. Any resolution or construction
    /// failure is returned before a single task has been submitted.
    pub fn prepare(
        &self,
        plan: &ScanPlan,
        descriptors: &[RunnerDescriptor],
    ) -> ScanResult<Vec<Box<dyn ScanRunner>>> {
        if let Some(unknown) = self
            .options
            .runners
            .iter()
            .find(|name| !descriptors.iter().any(|d| &d.name == *name))
        {
            return Err(ScanError::Configuration {
                message: format!("Runner '{}' is not configured", unknown),
            });
        }

        let mut runners = Vec::new();
        for descriptor in descriptors {
            if !descriptor.enabled {
                log::debug!("Runner '{}' is disabled", descriptor.name);
                continue;
            }
            if !self.options.runners.is_empty() && !self.options.runners.contains(&descriptor.name)
            {
                log::debug!("Runner '{}' not selected", descriptor.name);
                continue;
            }

            let factory = self.registry.resolve(&descriptor.name)?;
            let ctx = RunnerContext::new(
                descriptor.name.clone(),
                self.pool.clone(),
                plan.layout().clone(),
                descriptor.settings.clone(),
                plan.secrets().clone(),
            );
            runners.push(factory(ctx)?);
        }

        if runners.is_empty() {
            log::warn!("No runners enabled; only the report will be produced");
        }
        Ok(runners)
    }

    /// Run the batch to completion or until `shutdown` fires
    ///
    /// Only configuration problems are returned as errors; task failures are
    /// logged by the pool and counted in the returned summary.
    pub async fn run(
        &self,
        plan: &ScanPlan,
        descriptors: &[RunnerDescriptor],
        mut shutdown: broadcast::Receiver<()>,
    ) -> ScanResult<BatchSummary> {
        let runners = self.prepare(plan, descriptors)?;
        let mut batch = BatchSummary::default();

        if self.options.skip_fetch {
            log::info!("Skipping fetch; using existing working copies");
        } else {
            batch.phase = Phase::Fetch;
            log::info!("Fetching {} repositories", plan.targets().len());
            let started = Instant::now();

            match until_shutdown(self.fetch_all(plan), &mut shutdown).await {
                Some(result) => {
                    let fetch = result?;
                    log::info!("Fetch finished in {:.1?}: {}", started.elapsed(), fetch);
                    batch.fetch = Some(fetch);
                }
                None => return Ok(self.interrupt(batch).await),
            }
            self.pool.prune();
        }

        batch.phase = Phase::Scan;
        for runner in &runners {
            let name = runner.name().to_string();
            log::info!("Running {}", name);
            let started = Instant::now();

            match until_shutdown(runner.run(plan), &mut shutdown).await {
                Some(Ok(summary)) => {
                    let elapsed = started.elapsed();
                    log::info!("Time taken by {}: {:.1?} ({})", name, elapsed, summary);
                    batch.runners.push(RunnerSummary {
                        name,
                        summary,
                        elapsed,
                    });
                }
                Some(Err(e)) => {
                    log::error!("Runner '{}' stopped early: {}", name, e);
                }
                None => return Ok(self.interrupt(batch).await),
            }
            self.pool.prune();
        }

        batch.phase = Phase::Done;
        Ok(batch)
    }

    /// Submit one fetch per target, then wait for all of them
    async fn fetch_all(&self, plan: &ScanPlan) -> ScanResult<JoinSummary> {
        for target in plan.targets() {
            let fetcher = self.fetcher.clone();
            let address = target.address().to_string();
            let destination = plan.layout().checkout_dir(target);
            log::debug!("Queueing fetch of {} [{}]", target, target.short_id());

            let task = Task::new(format!("fetch {}", target), async move {
                fetcher.fetch(&address, &destination).await
            });
            self.pool.submit(task).await?;
        }
        Ok(self.pool.join_all().await)
    }

    /// Cancel everything in flight and close out the batch
    async fn interrupt(&self, mut batch: BatchSummary) -> BatchSummary {
        let cancelled = self.pool.cancel_all();
        let reaped = self.pool.join_all().await;
        self.pool.prune();
        log::warn!(
            "Batch interrupted during {} phase; {} task(s) cancelled",
            batch.phase,
            cancelled.max(reaped.cancelled)
        );
        batch.interrupted = true;
        batch
    }
}

/// Drive `work` unless shutdown is signalled first
///
/// A closed channel means nobody can signal any more, so it never counts as
/// a shutdown.
async fn until_shutdown<F: Future>(
    work: F,
    shutdown: &mut broadcast::Receiver<()>,
) -> Option<F::Output> {
    let signalled = async {
        loop {
            match shutdown.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => return,
                Err(RecvError::Closed) => std::future::pending::<()>().await,
            }
        }
    };

    tokio::select! {
        biased;
        _ = signalled => None,
        output = work => Some(output),
    }
}
