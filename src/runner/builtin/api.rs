//! API for builtin runner registration and discovery
//!
//! Runners use the `runner!` macro to register themselves for automatic discovery.

use crate::runner::context::RunnerContext;
use crate::runner::error::RunnerResult;
use crate::runner::traits::ScanRunner;

/// Entry for a builtin runner in the static registry
pub struct BuiltinRunnerEntry {
    pub name: &'static str,
    pub factory: fn(RunnerContext) -> RunnerResult<Box<dyn ScanRunner>>,
}

inventory::collect!(BuiltinRunnerEntry);

/// Macro for registering builtin runners
#[macro_export]
macro_rules! runner {
    ($name:expr, $factory:expr) => {
        inventory::submit!($crate::runner::builtin::api::BuiltinRunnerEntry {
            name: $name,
            factory: $factory
        });
    };
}

/// Get all registered builtin runners
pub fn get_all_builtin_runners() -> Vec<&'static BuiltinRunnerEntry> {
    inventory::iter::<BuiltinRunnerEntry>().collect()
}
