//! Tests for scanner types
//!
//! Tests for data structures shared by the orchestrator, runners and report.

use crate::scanner::types::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

#[test]
fn test_repository_name_from_addresses() {
    assert_eq!(
        repository_name("https://github.com/org/repoA").as_deref(),
        Some("repoA")
    );
    assert_eq!(
        repository_name("https://github.com/org/repoA.git").as_deref(),
        Some("repoA")
    );
    assert_eq!(
        repository_name("https://github.com/org/repoA/").as_deref(),
        Some("repoA")
    );
    assert_eq!(
        repository_name("git@github.com:org/repoB.git").as_deref(),
        Some("repoB")
    );
    assert_eq!(repository_name("/srv/git/local").as_deref(), Some("local"));
    assert_eq!(repository_name("   "), None);
}

#[test]
fn test_vulnerability_class_parsing() {
    assert_eq!(
        VulnerabilityClass::from_str("vulnerable").unwrap(),
        VulnerabilityClass::Vulnerable
    );
    assert_eq!(
        VulnerabilityClass::from_str("non_vulnerable").unwrap(),
        VulnerabilityClass::NonVulnerable
    );
    assert_eq!(
        VulnerabilityClass::from_str("non-vulnerable").unwrap(),
        VulnerabilityClass::NonVulnerable
    );
    assert!(VulnerabilityClass::from_str("unknown").is_err());

    assert_eq!(VulnerabilityClass::NonVulnerable.to_string(), "non_vulnerable");
    assert_eq!(VulnerabilityClass::NonVulnerable.label(), "Non vulnerable");
}

#[test]
fn test_vulnerability_class_serde() {
    let json = serde_json::to_string(&VulnerabilityClass::NonVulnerable).unwrap();
    assert_eq!(json, "\"non_vulnerable\"");
}

#[test]
fn test_scan_target_identity() {
    let target = ScanTarget::from_address(
        "https://github.com/org/repoA",
        "Go",
        VulnerabilityClass::Vulnerable,
    )
    .unwrap();

    assert_eq!(target.repository(), "repoA");
    assert_eq!(target.to_string(), "vulnerable/Go/repoA");
    assert_eq!(target.short_id().len(), 16);
    assert_eq!(target.short_id(), target.clone().short_id());

    let other_class = ScanTarget::from_address(
        "https://github.com/org/repoA",
        "Go",
        VulnerabilityClass::NonVulnerable,
    )
    .unwrap();
    assert_ne!(target.short_id(), other_class.short_id());
}

#[test]
fn test_workspace_layout_paths() {
    let layout = WorkspaceLayout::new("/data/repositories", "/data/scan_results");
    let target = ScanTarget::new(
        "https://github.com/org/repoB",
        "repoB",
        "Python",
        VulnerabilityClass::NonVulnerable,
    );

    assert_eq!(
        layout.checkout_dir(&target),
        Path::new("/data/repositories/non_vulnerable/Python/repoB")
    );
    assert_eq!(
        layout.checkout_parent(&target),
        Path::new("/data/repositories/non_vulnerable/Python")
    );
    assert_eq!(
        layout.result_dir("semgrep", &target),
        Path::new("/data/scan_results/semgrep/non_vulnerable/Python/repoB")
    );
}

#[test]
fn test_workspace_layout_absolutizes_relative_paths() {
    let layout = WorkspaceLayout::new("repositories", "scan_results");
    assert!(layout.repositories_dir().is_absolute());
    assert!(layout.results_dir().ends_with("scan_results"));
}

#[test]
fn test_scan_plan_accessors() {
    let layout = WorkspaceLayout::new("/r", "/s");
    let targets = vec![
        ScanTarget::new("a", "a", "Go", VulnerabilityClass::Vulnerable),
        ScanTarget::new("b", "b", "Go", VulnerabilityClass::NonVulnerable),
    ];
    let mut secrets = BTreeMap::new();
    secrets.insert("snyk-token".to_string(), "t".to_string());
    let plan = ScanPlan::new(targets, layout, secrets);

    assert!(!plan.is_empty());
    assert_eq!(plan.targets_in(VulnerabilityClass::Vulnerable).count(), 1);
    assert_eq!(plan.secret("snyk-token"), Some("t"));
    assert_eq!(plan.secret("missing"), None);
}
