//! Repository fetching
//!
//! The fetch phase clones each target into its working-copy directory, or
//! updates it when a previous batch already cloned it.

use crate::core::retry::{retry_async, RetryPolicy};
use crate::pool::api::{TaskError, TaskResult};
use crate::scanner::process::CommandSpec;
use async_trait::async_trait;
use std::path::Path;

/// Brings a repository to a local working copy
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Clone `address` into `destination`, or update it if already present
    ///
    /// Must be idempotent: fetching twice leaves one up-to-date working copy.
    async fn fetch(&self, address: &str, destination: &Path) -> TaskResult<()>;
}

/// Fetcher backed by the `git` command line
#[derive(Debug, Clone)]
pub struct GitFetcher {
    program: String,
    policy: RetryPolicy,
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            policy: RetryPolicy::default(),
        }
    }
}

impl GitFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Command that brings `destination` up to date with `address`
    pub fn command_for(&self, address: &str, destination: &Path) -> CommandSpec {
        if destination.join(".git").exists() {
            CommandSpec::new(&self.program)
                .arg("-C")
                .arg(destination.display().to_string())
                .args(["pull", "--ff-only", "--quiet"])
        } else {
            CommandSpec::new(&self.program)
                .args(["clone", "--quiet", address])
                .arg(destination.display().to_string())
        }
    }
}

#[async_trait]
impl Fetcher for GitFetcher {
    async fn fetch(&self, address: &str, destination: &Path) -> TaskResult<()> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TaskError::Io {
                    operation: "create checkout directory".to_string(),
                    path: parent.display().to_string(),
                    cause: e.to_string(),
                })?;
        }

        let operation = format!("fetch {}", address);
        retry_async(&operation, self.policy.clone(), || async move {
            // Re-evaluated per attempt: a failed clone may have left nothing behind
            self.command_for(address, destination).run().await
        })
        .await?;

        log::info!("Fetched {} into {}", address, destination.display());
        Ok(())
    }
}
