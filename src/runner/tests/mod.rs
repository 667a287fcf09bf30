//! Test modules for scanner runners


use crate::pool::api::WorkerPool;
use crate::runner::api::RunnerContext;
use crate::scanner::types::WorkspaceLayout;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Context with an absolute layout so command lines are predictable
pub(crate) fn test_context(name: &str, settings: toml::Table) -> RunnerContext {
    RunnerContext::new(
        name,
        Arc::new(WorkerPool::new(2).unwrap()),
        WorkspaceLayout::new("/work/repositories", "/work/results"),
        settings,
        BTreeMap::new(),
    )
}
