//! Public API for scanner runners
//!
//! External modules should import from here rather than directly from internal modules.

pub use crate::runner::builtin::container::{submit_targets, ContainerSettings};
pub use crate::runner::context::{RunnerContext, RunnerDescriptor};
pub use crate::runner::error::{RunnerError, RunnerResult};
pub use crate::runner::registry::RunnerRegistry;
pub use crate::runner::traits::{RunnerFactory, ScanRunner};

pub use crate::runner::builtin::codeql::CodeQlRunner;
pub use crate::runner::builtin::horusec::HorusecRunner;
pub use crate::runner::builtin::semgrep::SemgrepRunner;
pub use crate::runner::builtin::snyk::SnykRunner;
pub use crate::runner::builtin::sonarqube::SonarQubeRunner;
pub use crate::runner::builtin::trivy::TrivyRunner;
