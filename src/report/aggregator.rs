//! Result aggregation
//!
//! Walks `{root}/{tool}/{class}/{language}/{repository}/` and folds every
//! matching result file into one ordered tree. Directory listings are sorted
//! at every level and each leaf is sorted by rendered text, so identical
//! inputs always give identical trees. Unreadable or malformed files are
//! logged and skipped; they never abort the walk.

use crate::report::error::{ReportError, ReportResult};
use crate::report::finding::Finding;
use crate::report::sarif::parse_sarif_file;
use crate::scanner::types::VulnerabilityClass;
use glob::Pattern;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Result file pattern used when none is configured
pub const DEFAULT_PATTERN: &str = "*.sarif";

type ToolMap = BTreeMap<String, Vec<Finding>>;
type ClassMap = BTreeMap<VulnerabilityClass, ToolMap>;
type RepositoryMap = BTreeMap<String, ClassMap>;

/// language → repository → class → tool → sorted findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregationTree {
    languages: BTreeMap<String, RepositoryMap>,
}

/// One leaf of the tree, flattened for tables and templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafRow<'a> {
    pub language: &'a str,
    pub repository: &'a str,
    pub class: VulnerabilityClass,
    pub tool: &'a str,
    pub findings: &'a [Finding],
}

impl AggregationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaf for a key, created empty if absent
    pub fn ensure_leaf(
        &mut self,
        language: &str,
        repository: &str,
        class: VulnerabilityClass,
        tool: &str,
    ) -> &mut Vec<Finding> {
        self.languages
            .entry(language.to_string())
            .or_default()
            .entry(repository.to_string())
            .or_default()
            .entry(class)
            .or_default()
            .entry(tool.to_string())
            .or_default()
    }

    /// Append a finding under its key
    pub fn insert(
        &mut self,
        language: &str,
        repository: &str,
        class: VulnerabilityClass,
        finding: Finding,
    ) {
        let tool = finding.tool.clone();
        self.ensure_leaf(language, repository, class, &tool)
            .push(finding);
    }

    pub fn leaf(
        &self,
        language: &str,
        repository: &str,
        class: VulnerabilityClass,
        tool: &str,
    ) -> Option<&[Finding]> {
        self.languages
            .get(language)?
            .get(repository)?
            .get(&class)?
            .get(tool)
            .map(Vec::as_slice)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn repositories(&self, language: &str) -> impl Iterator<Item = &str> {
        self.languages
            .get(language)
            .into_iter()
            .flat_map(|repos| repos.keys().map(String::as_str))
    }

    /// Every leaf in key order
    pub fn rows(&self) -> Vec<LeafRow<'_>> {
        let mut rows = Vec::new();
        for (language, repositories) in &self.languages {
            for (repository, classes) in repositories {
                for (class, tools) in classes {
                    for (tool, findings) in tools {
                        rows.push(LeafRow {
                            language,
                            repository,
                            class: *class,
                            tool,
                            findings,
                        });
                    }
                }
            }
        }
        rows
    }

    pub fn total_findings(&self) -> usize {
        self.rows().iter().map(|r| r.findings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Sort every leaf by rendered text
    fn sort_leaves(&mut self) {
        for repositories in self.languages.values_mut() {
            for classes in repositories.values_mut() {
                for tools in classes.values_mut() {
                    for findings in tools.values_mut() {
                        findings.sort_by_cached_key(|f| f.to_string());
                    }
                }
            }
        }
    }
}

/// Builds an `AggregationTree` from a results directory
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    patterns: Vec<Pattern>,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self {
            patterns: vec![Pattern::new(DEFAULT_PATTERN).unwrap_or_default()],
        }
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator matching result files against `patterns`
    ///
    /// An empty list keeps the default `*.sarif`.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> ReportResult<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| ReportError::Pattern {
                    pattern: p.as_ref().to_string(),
                    cause: e.to_string(),
                })
            })
            .collect::<ReportResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// True if a file name matches any configured pattern
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }

    /// Walk `root` and fold every result file into a tree
    pub fn aggregate(&self, root: &Path) -> AggregationTree {
        let mut tree = AggregationTree::new();

        if !root.is_dir() {
            log::warn!(
                "Results directory {} does not exist; report will be empty",
                root.display()
            );
            return tree;
        }

        let mut files = 0usize;
        for (tool, tool_dir) in subdirectories(root) {
            for (class_name, class_dir) in subdirectories(&tool_dir) {
                let class = match VulnerabilityClass::from_str(&class_name) {
                    Ok(class) => class,
                    Err(_) => {
                        log::warn!(
                            "Skipping {}: '{}' is not a vulnerability class",
                            class_dir.display(),
                            class_name
                        );
                        continue;
                    }
                };

                for (language, language_dir) in subdirectories(&class_dir) {
                    for (repository, repository_dir) in subdirectories(&language_dir) {
                        let leaf = tree.ensure_leaf(&language, &repository, class, &tool);
                        for file in self.result_files(&repository_dir) {
                            files += 1;
                            match parse_sarif_file(&file, &tool) {
                                Ok(findings) => {
                                    log::trace!(
                                        "{}: {} finding(s)",
                                        file.display(),
                                        findings.len()
                                    );
                                    leaf.extend(findings);
                                }
                                Err(e) => log::warn!("Skipping result file: {}", e),
                            }
                        }
                    }
                }
            }
        }

        tree.sort_leaves();
        log::info!(
            "Aggregated {} finding(s) from {} result file(s)",
            tree.total_findings(),
            files
        );
        tree
    }

    /// Matching regular files directly inside `dir`, sorted by name
    fn result_files(&self, dir: &Path) -> Vec<PathBuf> {
        sorted_entries(dir)
            .into_iter()
            .filter(|(name, path)| path.is_file() && self.matches(name))
            .map(|(_, path)| path)
            .collect()
    }
}

/// Subdirectories of `dir` as (name, path), sorted by name
fn subdirectories(dir: &Path) -> Vec<(String, PathBuf)> {
    sorted_entries(dir)
        .into_iter()
        .filter(|(_, path)| path.is_dir())
        .collect()
}

fn sorted_entries(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut entries: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            Some((name, entry.path()))
        })
        .collect();
    entries.sort();
    entries
}
