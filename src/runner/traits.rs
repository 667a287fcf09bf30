//! Runner trait and factory type

use crate::pool::api::JoinSummary;
use crate::runner::context::RunnerContext;
use crate::runner::error::RunnerResult;
use crate::scanner::types::ScanPlan;
use std::sync::Arc;

/// One external scanner, bound to the shared pool
///
/// `run` submits one task per applicable target and waits for all of them
/// before returning, so each runner invocation is a barrier. Individual task
/// failures are counted in the returned summary, not raised.
#[async_trait::async_trait]
pub trait ScanRunner: Send + Sync {
    /// Runner identifier; also the tool directory in the results tree
    fn name(&self) -> &str;

    async fn run(&self, plan: &ScanPlan) -> RunnerResult<JoinSummary>;
}

/// Builds a runner from its context
pub type RunnerFactory =
    Arc<dyn Fn(RunnerContext) -> RunnerResult<Box<dyn ScanRunner>> + Send + Sync>;
