//! Drive `execute` from a configuration file with fake fetch and scan

use crate::common::{event_log, writing_registry, FakeFetcher};
use sastbench::app::cli::api::{Args, ConfigFile, ResolvedConfig};
use sastbench::app::startup::{execute, EXIT_FAILURE, EXIT_SUCCESS};
use sastbench::core::shutdown::{ShutdownCoordinator, INTERRUPTED_EXIT_CODE};
use sastbench::runner::api::RunnerRegistry;
use serial_test::serial;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn config_text(root: &Path) -> String {
    format!(
        r#"
[application]
filter-languages = ["Go", "Python"]
max-workers = 2
repositories-dir = "{root}/repositories"
results-dir = "{root}/scan_results"

[[runners]]
name = "toolX"

[repos.vulnerable]
Go = ["https://github.com/org/repoA"]

[repos.non_vulnerable]
Python = ["https://github.com/org/repoB"]
"#,
        root = root.display()
    )
}

fn resolve(root: &Path, args: &Args, registry: &RunnerRegistry) -> ResolvedConfig {
    ConfigFile::from_toml(&config_text(root), Path::new("bench.toml"))
        .unwrap()
        .resolve(args, registry)
        .unwrap()
}

#[tokio::test]
#[serial]
async fn test_batch_writes_html_and_json_reports() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let registry = writing_registry(&["toolX"], &log);
    let args = Args {
        json: Some(dir.path().join("tree.json")),
        ..Args::new()
    };
    let config = resolve(dir.path(), &args, &registry);
    let (coordinator, _rx) = ShutdownCoordinator::new();

    let code = execute(
        &config,
        registry,
        Arc::new(FakeFetcher { log: log.clone() }),
        &coordinator,
        false,
    )
    .await;
    assert_eq!(code, EXIT_SUCCESS);

    let html = std::fs::read_to_string(
        dir.path().join("scan_results/SARIF_Analysis_Report.html"),
    )
    .unwrap();
    assert!(html.contains("Language: Go"));
    assert!(html.contains("Tool: toolX. Number of findings: 2"));
    assert!(html.contains("Tool: toolX. Number of findings: 0"));
    assert!(html.find("Language: Go").unwrap() < html.find("Language: Python").unwrap());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("tree.json")).unwrap())
            .unwrap();
    assert_eq!(
        json["Go"]["repoA"]["vulnerable"]["toolX"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
    assert_eq!(json["Python"]["repoB"]["non_vulnerable"]["toolX"], serde_json::json!([]));
}

#[tokio::test]
#[serial]
async fn test_report_only_reuses_results_without_scanning() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let registry = writing_registry(&["toolX"], &log);
    let (coordinator, _rx) = ShutdownCoordinator::new();

    let first = resolve(dir.path(), &Args::new(), &registry);
    let code = execute(
        &first,
        registry.clone(),
        Arc::new(FakeFetcher { log: log.clone() }),
        &coordinator,
        false,
    )
    .await;
    assert_eq!(code, EXIT_SUCCESS);
    let report = dir.path().join("scan_results/SARIF_Analysis_Report.html");
    std::fs::remove_file(&report).unwrap();
    let events_before = log.lock().unwrap().len();

    let args = Args {
        report_only: true,
        ..Args::new()
    };
    let config = resolve(dir.path(), &args, &registry);
    let code = execute(
        &config,
        registry,
        Arc::new(FakeFetcher { log: log.clone() }),
        &coordinator,
        false,
    )
    .await;

    assert_eq!(code, EXIT_SUCCESS);
    assert!(report.is_file());
    assert_eq!(log.lock().unwrap().len(), events_before);
}

#[tokio::test]
#[serial]
async fn test_runner_construction_failure_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut registry = RunnerRegistry::new();
    registry
        .register("toolX", |_ctx| {
            Err(sastbench::runner::api::RunnerError::Configuration {
                runner: "toolX".to_string(),
                message: "missing credentials".to_string(),
            })
        })
        .unwrap();
    let config = resolve(dir.path(), &Args::new(), &registry);
    let (coordinator, _rx) = ShutdownCoordinator::new();

    let code = execute(
        &config,
        registry,
        Arc::new(FakeFetcher { log: log.clone() }),
        &coordinator,
        false,
    )
    .await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(log.lock().unwrap().is_empty());
    assert!(!dir.path().join("scan_results").exists());
}

#[tokio::test]
#[serial]
async fn test_shutdown_request_exits_interrupted_without_report() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let registry = writing_registry(&["toolX"], &log);
    let config = resolve(dir.path(), &Args::new(), &registry);
    let (coordinator, _rx) = ShutdownCoordinator::new();
    coordinator.trigger_shutdown();

    let code = execute(
        &config,
        registry,
        Arc::new(FakeFetcher { log: log.clone() }),
        &coordinator,
        false,
    )
    .await;

    assert_eq!(code, INTERRUPTED_EXIT_CODE);
    assert!(!dir
        .path()
        .join("scan_results/SARIF_Analysis_Report.html")
        .exists());
}

#[tokio::test]
#[serial]
async fn test_bad_template_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let registry = writing_registry(&["toolX"], &log);
    let args = Args {
        report_only: true,
        template: Some(dir.path().join("missing.tera").display().to_string()),
        ..Args::new()
    };
    let config = resolve(dir.path(), &args, &registry);
    let (coordinator, _rx) = ShutdownCoordinator::new();

    let code = execute(
        &config,
        registry,
        Arc::new(FakeFetcher { log }),
        &coordinator,
        false,
    )
    .await;
    assert_eq!(code, EXIT_FAILURE);
}

#[tokio::test]
#[serial]
async fn test_config_discovered_in_current_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(sastbench::app::cli::api::CONFIG_FILE_NAME),
        config_text(dir.path()),
    )
    .unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let found = sastbench::app::cli::api::default_config_path();
    let loaded = ConfigFile::load(None).await;
    std::env::set_current_dir(previous).unwrap();

    // a user-level config, when present, takes precedence
    let found = found.unwrap();
    assert!(found.ends_with(sastbench::app::cli::api::CONFIG_FILE_NAME));
    assert!(loaded.is_ok());
}
