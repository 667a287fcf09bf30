//! TOML configuration loading and validation
//!
//! The file is deserialised into `ConfigFile`, command-line flags are laid
//! over it and the merged result is validated into a `ResolvedConfig`. All
//! problems are reported before a single task is submitted.

use crate::app::cli::args::Args;
use crate::core::error_handling::ContextualError;
use crate::report::api::{ResultAggregator, DEFAULT_PATTERN};
use crate::runner::api::{RunnerDescriptor, RunnerRegistry};
use crate::scanner::api::{ScanOptions, ScanPlan, ScanTarget, VulnerabilityClass, WorkspaceLayout};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// File name looked up when no `--config-file` is given
pub const CONFIG_FILE_NAME: &str = "sastbench.toml";
const CONFIG_DIR_NAME: &str = "Sastbench";

const DEFAULT_MAX_WORKERS: usize = 4;
const DEFAULT_REPOSITORIES_DIR: &str = "repositories";
const DEFAULT_RESULTS_DIR: &str = "scan_results";
const DEFAULT_REPORT_FILE: &str = "SARIF_Analysis_Report.html";

/// Errors from locating, reading or validating the configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Cannot read configuration file {path}: {cause}")]
    Io { path: String, cause: String },

    #[error("Invalid configuration file {path}: {cause}")]
    Parse { path: String, cause: String },

    #[error("{message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ConfigError::Invalid { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { message } => Some(message),
            _ => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// `[application]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ApplicationSection {
    #[serde(default)]
    pub filter_languages: Vec<String>,
    pub max_workers: Option<usize>,
    pub repositories_dir: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
    pub report_file: Option<String>,
    /// Seconds; absent means no deadline
    pub task_timeout: Option<u64>,
    #[serde(default)]
    pub result_patterns: Vec<String>,
    pub template: Option<String>,
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
}

/// The whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub application: ApplicationSection,
    /// Runners in execution order
    #[serde(default)]
    pub runners: Vec<RunnerDescriptor>,
    /// class → language → repository addresses
    #[serde(default)]
    pub repos: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str, origin: &Path) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.display().to_string(),
            cause: e.to_string(),
        })
    }

    /// Locate and load the configuration file
    ///
    /// An explicit path must exist. Otherwise the user config directory is
    /// tried first, then the current directory.
    pub async fn load(explicit: Option<&Path>) -> ConfigResult<(Self, PathBuf)> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.display().to_string(),
                    });
                }
                path.to_path_buf()
            }
            None => default_config_path().ok_or_else(|| {
                ConfigError::invalid(format!(
                    "No configuration file found; create {} or pass --config-file",
                    CONFIG_FILE_NAME
                ))
            })?,
        };

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?;

        log::debug!("Loading configuration from {}", path.display());
        Ok((Self::from_toml(&content, &path)?, path))
    }

    /// Merge command-line overrides and validate
    pub fn resolve(self, args: &Args, registry: &RunnerRegistry) -> ConfigResult<ResolvedConfig> {
        let app = self.application;

        let max_workers = args
            .max_workers
            .or(app.max_workers)
            .unwrap_or(DEFAULT_MAX_WORKERS);
        if max_workers == 0 {
            return Err(ConfigError::invalid("max-workers must be at least 1"));
        }

        let task_timeout = match args.task_timeout.or(app.task_timeout) {
            Some(0) => return Err(ConfigError::invalid("task-timeout must be at least 1 second")),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        if app.filter_languages.is_empty() {
            return Err(ConfigError::invalid(
                "filter-languages must list at least one language",
            ));
        }

        validate_runners(&self.runners, registry)?;
        validate_selection(&args.runners, &self.runners)?;

        let result_patterns = if app.result_patterns.is_empty() {
            vec![DEFAULT_PATTERN.to_string()]
        } else {
            app.result_patterns
        };
        ResultAggregator::with_patterns(&result_patterns)
            .map_err(|e| ConfigError::invalid(e.to_string()))?;

        let targets = expand_targets(&self.repos, &app.filter_languages)?;

        let layout = WorkspaceLayout::new(
            app.repositories_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPOSITORIES_DIR)),
            app.results_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
        );
        let report_file = args
            .report_file
            .clone()
            .or(app.report_file)
            .unwrap_or_else(|| DEFAULT_REPORT_FILE.to_string());
        let report_path = layout.results_dir().join(report_file);

        Ok(ResolvedConfig {
            max_workers,
            task_timeout,
            report_path,
            json_path: args.json.clone(),
            template: args.template.clone().or(app.template),
            result_patterns,
            runners: self.runners,
            options: ScanOptions {
                skip_fetch: args.skip_fetch,
                runners: args.runners.clone(),
            },
            report_only: args.report_only,
            plan: ScanPlan::new(targets, layout, self.secrets),
        })
    }
}

/// Validated, merged settings for one invocation
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub max_workers: usize,
    pub task_timeout: Option<Duration>,
    pub report_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub template: Option<String>,
    pub result_patterns: Vec<String>,
    pub runners: Vec<RunnerDescriptor>,
    pub options: ScanOptions,
    pub report_only: bool,
    pub plan: ScanPlan,
}

/// Presentation settings that must be known before logging starts
///
/// Read leniently: a file that fails full validation still contributes its
/// log settings so the validation error is logged the way the user asked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<String>,
    pub color: Option<bool>,
}

impl LogSettings {
    pub fn from_table(table: &toml::Table) -> Self {
        let app = table.get("application").and_then(|v| v.as_table());
        let get = |key: &str| {
            app.and_then(|a| a.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Self {
            level: get("log-level"),
            format: get("log-format"),
            file: get("log-file"),
            color: app.and_then(|a| a.get("color")).and_then(|v| v.as_bool()),
        }
    }
}

/// First existing default configuration file
pub fn default_config_path() -> Option<PathBuf> {
    let user = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    let local = PathBuf::from(CONFIG_FILE_NAME);
    user.into_iter().chain(Some(local)).find(|p| p.is_file())
}

fn validate_runners(runners: &[RunnerDescriptor], registry: &RunnerRegistry) -> ConfigResult<()> {
    let mut seen = BTreeSet::new();
    for descriptor in runners {
        if !seen.insert(descriptor.name.as_str()) {
            return Err(ConfigError::invalid(format!(
                "Runner '{}' is configured more than once",
                descriptor.name
            )));
        }
        if descriptor.enabled && !registry.contains(&descriptor.name) {
            return Err(ConfigError::invalid(format!(
                "Unknown runner '{}' (available: {})",
                descriptor.name,
                registry.names().join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_selection(selected: &[String], runners: &[RunnerDescriptor]) -> ConfigResult<()> {
    for name in selected {
        match runners.iter().find(|d| &d.name == name) {
            None => {
                return Err(ConfigError::invalid(format!(
                    "Runner '{}' is not configured",
                    name
                )))
            }
            Some(d) if !d.enabled => {
                return Err(ConfigError::invalid(format!(
                    "Runner '{}' is disabled in the configuration",
                    name
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Expand `[repos]` through the language filter
///
/// Vulnerable targets come first, then non-vulnerable; within a class,
/// languages follow `filter-languages` order and repositories their
/// configured order.
fn expand_targets(
    repos: &BTreeMap<String, BTreeMap<String, Vec<String>>>,
    languages: &[String],
) -> ConfigResult<Vec<ScanTarget>> {
    let mut by_class: BTreeMap<VulnerabilityClass, &BTreeMap<String, Vec<String>>> =
        BTreeMap::new();
    for (class_name, by_language) in repos {
        let class = VulnerabilityClass::from_str(class_name).map_err(|_| {
            ConfigError::invalid(format!(
                "Unknown repository class '{}' (expected vulnerable or non_vulnerable)",
                class_name
            ))
        })?;
        if by_class.insert(class, by_language).is_some() {
            return Err(ConfigError::invalid(format!(
                "Repository class '{}' is configured more than once",
                class.dir_name()
            )));
        }
    }

    let mut targets = Vec::new();
    let mut keys = BTreeSet::new();
    for (class, by_language) in by_class {
        for language in languages {
            for address in by_language.get(language).into_iter().flatten() {
                let target = ScanTarget::from_address(address, language, class).ok_or_else(|| {
                    ConfigError::invalid(format!(
                        "Cannot derive a repository name from '{}'",
                        address
                    ))
                })?;
                if !keys.insert((class, language.clone(), target.repository().to_string())) {
                    return Err(ConfigError::invalid(format!(
                        "Repository '{}' collides with another {} {} repository of the same name",
                        address,
                        class.dir_name(),
                        language
                    )));
                }
                targets.push(target);
            }
        }
    }

    log::debug!("Expanded {} scan target(s)", targets.len());
    Ok(targets)
}
