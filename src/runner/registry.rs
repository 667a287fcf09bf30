//! Runner Registry
//!
//! Maps runner names to factories. Built-in runners are collected from the
//! compile-time inventory; tests and embedders can add their own.

use crate::runner::builtin::api::get_all_builtin_runners;
use crate::runner::context::RunnerContext;
use crate::runner::error::{RunnerError, RunnerResult};
use crate::runner::traits::{RunnerFactory, ScanRunner};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name-to-factory registry for scan runners
#[derive(Clone, Default)]
pub struct RunnerRegistry {
    factories: BTreeMap<String, RunnerFactory>,
}

impl std::fmt::Debug for RunnerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerRegistry")
            .field("runners", &self.names())
            .finish()
    }
}

impl RunnerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in runner
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for entry in get_all_builtin_runners() {
            let factory = entry.factory;
            registry
                .factories
                .insert(entry.name.to_string(), Arc::new(factory));
        }
        registry
    }

    /// Add a factory under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> RunnerResult<()>
    where
        F: Fn(RunnerContext) -> RunnerResult<Box<dyn ScanRunner>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RunnerError::Duplicate { name });
        }
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Look up the factory for `name`
    pub fn resolve(&self, name: &str) -> RunnerResult<RunnerFactory> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| RunnerError::NotFound {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
