//! Application startup
//!
//! Parses arguments, starts logging, loads the configuration and drives one
//! batch: fetch, scan, aggregate, report. Exit status is 1 for configuration
//! or report errors, 130 when interrupted and 0 otherwise, however many
//! individual tasks failed.

use crate::app::cli::api::{Args, ConfigFile, LogSettings, ResolvedConfig};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{adjust_level, init_logging, set_log_level};
use crate::core::shutdown::{ShutdownCoordinator, INTERRUPTED_EXIT_CODE};
use crate::core::styles::{palette_to_clap, StyleRole};
use crate::core::version;
use crate::pool::api::WorkerPool;
use crate::report::api::{print_summary, write_json, ReportRenderer, ResultAggregator};
use crate::runner::api::RunnerRegistry;
use crate::scanner::api::{BatchSummary, Fetcher, GitFetcher, ScanOrchestrator};
use clap::{CommandFactory, FromArgMatches};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Entry point used by the binary; returns the process exit status
pub async fn startup() -> i32 {
    let args = parse_args();

    let log_settings = peek_log_settings(args.config_file.as_deref()).await;
    let use_color = args
        .color_choice()
        .or(log_settings.color)
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    let base_level = args
        .log_level
        .clone()
        .or(log_settings.level)
        .unwrap_or_else(|| "info".to_string());

    if let Err(e) = init_logging(
        Some(&base_level),
        args.log_format.as_deref().or(log_settings.format.as_deref()),
        args.log_file.as_deref().or(log_settings.file.as_deref()),
        use_color,
    ) {
        eprintln!("Failed to initialise logging: {}", e);
    }
    if args.verbosity() != 0 {
        let level = adjust_level(&base_level, args.verbosity());
        if let Err(e) = set_log_level(level) {
            eprintln!("Failed to adjust log level: {}", e);
        }
    }

    log::info!("sastbench {} starting", version::long_version());

    let registry = RunnerRegistry::builtin();
    let config = match load_config(&args, &registry).await {
        Ok(config) => config,
        Err(code) => return code,
    };

    let (coordinator, _shutdown_rx) = ShutdownCoordinator::new();
    coordinator.install_signal_handlers();

    let fetcher: Arc<dyn Fetcher> = Arc::new(GitFetcher::new());
    execute(&config, registry, fetcher, &coordinator, use_color).await
}

/// Run the batch described by `config`
///
/// Separate from `startup` so the whole pipeline can be driven with a custom
/// registry and fetcher.
pub async fn execute(
    config: &ResolvedConfig,
    registry: RunnerRegistry,
    fetcher: Arc<dyn Fetcher>,
    coordinator: &ShutdownCoordinator,
    use_color: bool,
) -> i32 {
    let started = Instant::now();

    if config.report_only {
        log::info!("Report-only mode; skipping fetch and scan");
    } else {
        let pool = match WorkerPool::new(config.max_workers) {
            Ok(pool) => Arc::new(pool.with_default_timeout(config.task_timeout)),
            Err(e) => {
                log_error_with_context(&e, "Worker pool setup");
                return EXIT_FAILURE;
            }
        };

        let orchestrator =
            ScanOrchestrator::new(pool, registry, fetcher).with_options(config.options.clone());
        let batch = match orchestrator
            .run(&config.plan, &config.runners, coordinator.subscribe())
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                log_error_with_context(&e, "Scan preparation");
                return EXIT_FAILURE;
            }
        };

        log_batch(&batch, use_color);
        if batch.interrupted || coordinator.is_shutdown_requested() {
            return INTERRUPTED_EXIT_CODE;
        }
    }

    match build_report(config, use_color).await {
        Ok(()) => {
            log::info!("Finished in {:.1?}", started.elapsed());
            EXIT_SUCCESS
        }
        Err(code) => code,
    }
}

async fn build_report(config: &ResolvedConfig, use_color: bool) -> Result<(), i32> {
    let aggregator = ResultAggregator::with_patterns(&config.result_patterns).map_err(|e| {
        log_error_with_context(&e, "Result pattern setup");
        EXIT_FAILURE
    })?;

    let renderer = match &config.template {
        Some(source) => ReportRenderer::from_source(source).await,
        None => Ok(ReportRenderer::new()),
    }
    .map_err(|e| {
        log_error_with_context(&e, "Template loading");
        EXIT_FAILURE
    })?;

    let tree = aggregator.aggregate(config.plan.layout().results_dir());

    renderer.write(&tree, &config.report_path).map_err(|e| {
        log_error_with_context(&e, "Report generation");
        EXIT_FAILURE
    })?;

    if let Some(json_path) = &config.json_path {
        write_json(&tree, json_path).map_err(|e| {
            log_error_with_context(&e, "JSON export");
            EXIT_FAILURE
        })?;
    }

    print_summary(&tree, use_color);
    Ok(())
}

fn log_batch(batch: &BatchSummary, use_color: bool) {
    if let Some(fetch) = &batch.fetch {
        log::info!("{} {}", StyleRole::Header.paint("fetch:", use_color), fetch);
    }
    for runner in &batch.runners {
        log::info!(
            "{} {} in {:.1?}",
            StyleRole::Tool.paint(&format!("{}:", runner.name), use_color),
            runner.summary,
            runner.elapsed
        );
    }
    let failures = batch.failures();
    if failures > 0 {
        log::warn!("{} task(s) did not complete; see errors above", failures);
    }
}

async fn load_config(args: &Args, registry: &RunnerRegistry) -> Result<ResolvedConfig, i32> {
    let (file, path) = ConfigFile::load(args.config_file.as_deref())
        .await
        .map_err(|e| {
            log_error_with_context(&e, "Configuration loading");
            EXIT_FAILURE
        })?;

    let config = file.resolve(args, registry).map_err(|e| {
        log_error_with_context(&e, &format!("Configuration {}", path.display()));
        EXIT_FAILURE
    })?;

    log::debug!(
        "{} target(s), {} runner(s), {} worker(s)",
        config.plan.targets().len(),
        config.runners.len(),
        config.max_workers
    );
    Ok(config)
}

/// Parse the command line with the style palette applied to help output
fn parse_args() -> Args {
    let styled =
        std::io::stdout().is_terminal() && !std::env::args().any(|a| a == "--no-color");
    let matches = Args::command()
        .styles(palette_to_clap(styled))
        .long_version(version::long_version())
        .get_matches();
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Log settings from the config file, ignoring anything unreadable
async fn peek_log_settings(explicit: Option<&Path>) -> LogSettings {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match crate::app::cli::api::default_config_path() {
            Some(path) => path,
            None => return LogSettings::default(),
        },
    };
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => toml::from_str::<toml::Table>(&content)
            .map(|table| LogSettings::from_table(&table))
            .unwrap_or_default(),
        Err(_) => LogSettings::default(),
    }
}
