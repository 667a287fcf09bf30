//! Whole-batch tests: orchestrator, fake runner and aggregator together

use crate::common::{descriptors, event_log, two_language_plan, writing_registry, FakeFetcher};
use sastbench::core::shutdown::ShutdownCoordinator;
use sastbench::pool::api::WorkerPool;
use sastbench::report::api::ResultAggregator;
use sastbench::scanner::api::{Phase, ScanOptions, ScanOrchestrator, VulnerabilityClass};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_two_language_batch_end_to_end() {
    let dir = TempDir::new().unwrap();
    let plan = two_language_plan(dir.path());
    let log = event_log();

    let orchestrator = ScanOrchestrator::new(
        Arc::new(WorkerPool::new(2).unwrap()),
        writing_registry(&["toolX"], &log),
        Arc::new(FakeFetcher { log: log.clone() }),
    );
    let (_coordinator, shutdown) = ShutdownCoordinator::new();

    let batch = orchestrator
        .run(&plan, &descriptors(&["toolX"]), shutdown)
        .await
        .unwrap();

    assert_eq!(batch.phase, Phase::Done);
    assert_eq!(batch.fetch.unwrap().completed, 2);
    assert_eq!(batch.runners.len(), 1);
    assert_eq!(batch.runners[0].summary.completed, 2);
    assert_eq!(batch.failures(), 0);
    assert_eq!(orchestrator.pool().tracked(), 0);

    // every fetch precedes every scan
    let events = log.lock().unwrap().clone();
    let last_fetch = events.iter().rposition(|e| e.starts_with("fetch ")).unwrap();
    let first_scan = events.iter().position(|e| e.starts_with("toolX ")).unwrap();
    assert!(last_fetch < first_scan, "events: {:?}", events);

    let tree = ResultAggregator::new().aggregate(plan.layout().results_dir());
    assert_eq!(tree.languages().collect::<Vec<_>>(), vec!["Go", "Python"]);

    let go = tree
        .leaf("Go", "repoA", VulnerabilityClass::Vulnerable, "toolX")
        .unwrap();
    assert_eq!(go.len(), 2);
    assert_eq!(
        go[0].to_string(),
        "[error] Rule injection: Tainted input reaches query At db/query.go , Line 42"
    );
    assert_eq!(
        go[1].to_string(),
        "[warning] Rule crypto: Weak hash At auth/hash.go , Line 7"
    );

    let python = tree
        .leaf("Python", "repoB", VulnerabilityClass::NonVulnerable, "toolX")
        .unwrap();
    assert!(python.is_empty());
}

#[tokio::test]
async fn test_failed_fetch_is_counted_and_scan_continues() {
    let dir = TempDir::new().unwrap();
    let mut targets = two_language_plan(dir.path()).targets().to_vec();
    targets.push(
        sastbench::scanner::api::ScanTarget::from_address(
            "https://unreachable.example/org/repoC",
            "Go",
            VulnerabilityClass::Vulnerable,
        )
        .unwrap(),
    );
    let plan = sastbench::scanner::api::ScanPlan::new(
        targets,
        two_language_plan(dir.path()).layout().clone(),
        Default::default(),
    );
    let log = event_log();

    let orchestrator = ScanOrchestrator::new(
        Arc::new(WorkerPool::new(3).unwrap()),
        writing_registry(&["toolX", "toolY"], &log),
        Arc::new(FakeFetcher { log: log.clone() }),
    );
    let (_coordinator, shutdown) = ShutdownCoordinator::new();

    let batch = orchestrator
        .run(&plan, &descriptors(&["toolX", "toolY"]), shutdown)
        .await
        .unwrap();

    assert_eq!(batch.fetch.unwrap().failed, 1);
    assert_eq!(
        batch.runners.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["toolX", "toolY"]
    );
    // repoC has no working copy, so each runner fails it once
    assert!(batch.runners.iter().all(|r| r.summary.failed == 1));
    assert_eq!(batch.failures(), 3);

    let tree = ResultAggregator::new().aggregate(plan.layout().results_dir());
    assert_eq!(tree.repositories("Go").collect::<Vec<_>>(), vec!["repoA"]);
    assert_eq!(tree.total_findings(), 4);
}

#[tokio::test]
async fn test_skip_fetch_reuses_existing_working_copies() {
    let dir = TempDir::new().unwrap();
    let plan = two_language_plan(dir.path());
    for target in plan.targets() {
        std::fs::create_dir_all(plan.layout().checkout_dir(target)).unwrap();
    }
    let log = event_log();

    let orchestrator = ScanOrchestrator::new(
        Arc::new(WorkerPool::new(1).unwrap()),
        writing_registry(&["toolX"], &log),
        Arc::new(FakeFetcher { log: log.clone() }),
    )
    .with_options(ScanOptions {
        skip_fetch: true,
        runners: Vec::new(),
    });
    let (_coordinator, shutdown) = ShutdownCoordinator::new();

    let batch = orchestrator
        .run(&plan, &descriptors(&["toolX"]), shutdown)
        .await
        .unwrap();

    assert!(batch.fetch.is_none());
    assert_eq!(batch.runners[0].summary.completed, 2);
    assert!(log.lock().unwrap().iter().all(|e| !e.starts_with("fetch ")));
}
