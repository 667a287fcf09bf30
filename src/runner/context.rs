//! Runner descriptors and construction context

use crate::pool::api::WorkerPool;
use crate::runner::error::{RunnerError, RunnerResult};
use crate::scanner::types::WorkspaceLayout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One `[[runners]]` entry from the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerDescriptor {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Runner-specific settings, e.g. `image`
    #[serde(default)]
    pub settings: toml::Table,
}

fn default_enabled() -> bool {
    true
}

impl RunnerDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            settings: toml::Table::new(),
        }
    }

    pub fn with_setting(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }
}

/// Everything a factory needs to build a runner
#[derive(Debug, Clone)]
pub struct RunnerContext {
    name: String,
    pool: Arc<WorkerPool>,
    layout: WorkspaceLayout,
    settings: toml::Table,
    secrets: BTreeMap<String, String>,
}

impl RunnerContext {
    pub fn new(
        name: impl Into<String>,
        pool: Arc<WorkerPool>,
        layout: WorkspaceLayout,
        settings: toml::Table,
        secrets: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            layout,
            settings,
            secrets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn settings(&self) -> &toml::Table {
        &self.settings
    }

    /// String setting; present but not a string is a configuration error
    pub fn setting_str(&self, key: &str) -> RunnerResult<Option<&str>> {
        match self.settings.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.wrong_type(key, "a string", other)),
        }
    }

    /// Boolean setting; present but not a boolean is a configuration error
    pub fn setting_bool(&self, key: &str) -> RunnerResult<Option<bool>> {
        match self.settings.get(key) {
            None => Ok(None),
            Some(toml::Value::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(self.wrong_type(key, "a boolean", other)),
        }
    }

    /// Non-negative integer setting
    pub fn setting_u64(&self, key: &str) -> RunnerResult<Option<u64>> {
        match self.settings.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(n)) => u64::try_from(*n).map(Some).map_err(|_| {
                RunnerError::Configuration {
                    runner: self.name.clone(),
                    message: format!("setting '{}' must not be negative", key),
                }
            }),
            Some(other) => Err(self.wrong_type(key, "an integer", other)),
        }
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &toml::Value) -> RunnerError {
        RunnerError::Configuration {
            runner: self.name.clone(),
            message: format!(
                "setting '{}' must be {}, found {}",
                key,
                expected,
                found.type_str()
            ),
        }
    }

    pub fn secret(&self, name: &str) -> Option<&str> {
        self.secrets
            .get(name)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}
