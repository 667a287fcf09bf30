//! Scan data model
//!
//! Targets, workspace layout and the plan handed to every runner.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter, EnumString};

/// Whether a repository is known to contain vulnerabilities
///
/// The on-disk and serialised form is `vulnerable` / `non_vulnerable`; the
/// legacy `non-vulnerable` spelling is accepted when parsing directory names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityClass {
    #[strum(serialize = "vulnerable")]
    Vulnerable,
    #[strum(serialize = "non_vulnerable", serialize = "non-vulnerable")]
    NonVulnerable,
}

impl VulnerabilityClass {
    /// Directory component used in both the repositories and results trees
    pub fn dir_name(self) -> &'static str {
        match self {
            VulnerabilityClass::Vulnerable => "vulnerable",
            VulnerabilityClass::NonVulnerable => "non_vulnerable",
        }
    }

    /// Human label used in reports ("Vulnerable", "Non vulnerable")
    pub fn label(self) -> &'static str {
        match self {
            VulnerabilityClass::Vulnerable => "Vulnerable",
            VulnerabilityClass::NonVulnerable => "Non vulnerable",
        }
    }
}

/// One unit of scan work: a repository of a given language and class
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScanTarget {
    address: String,
    repository: String,
    language: String,
    class: VulnerabilityClass,
}

impl ScanTarget {
    pub fn new(
        address: impl Into<String>,
        repository: impl Into<String>,
        language: impl Into<String>,
        class: VulnerabilityClass,
    ) -> Self {
        Self {
            address: address.into(),
            repository: repository.into(),
            language: language.into(),
            class,
        }
    }

    /// Build a target, deriving the repository name from the address
    pub fn from_address(
        address: &str,
        language: &str,
        class: VulnerabilityClass,
    ) -> Option<Self> {
        let repository = repository_name(address)?;
        Some(Self::new(address, repository, language, class))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn class(&self) -> VulnerabilityClass {
        self.class
    }

    /// Short stable identifier used to correlate log lines
    ///
    /// Truncated SHA256 over the target's keys, 16 hex characters.
    pub fn short_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.address.as_bytes());
        hasher.update([0]);
        hasher.update(self.language.as_bytes());
        hasher.update([0]);
        hasher.update(self.class.dir_name().as_bytes());
        let digest = hasher.finalize();
        digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.class, self.language, self.repository)
    }
}

/// Derive the working-copy directory name from a git address
///
/// Accepts URLs, scp-like addresses and local paths; strips a trailing
/// `.git`. Returns `None` when no name can be derived.
pub fn repository_name(address: &str) -> Option<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return None;
    }

    let path = match gix_url::parse(trimmed.as_bytes().into()) {
        Ok(url) => url.path.to_string(),
        Err(_) => trimmed.to_string(),
    };

    let name = path
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .map(|segment| segment.trim_end_matches(".git"))
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")?;

    Some(name.to_string())
}

/// Filesystem layout shared by fetch, scan and report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    repositories_dir: PathBuf,
    results_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Create a layout; relative paths are resolved against the current directory
    ///
    /// Container mounts need absolute host paths.
    pub fn new(repositories_dir: impl AsRef<Path>, results_dir: impl AsRef<Path>) -> Self {
        Self {
            repositories_dir: absolutize(repositories_dir.as_ref()),
            results_dir: absolutize(results_dir.as_ref()),
        }
    }

    pub fn repositories_dir(&self) -> &Path {
        &self.repositories_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Directory the fetcher clones into: `{repositories}/{class}/{language}`
    pub fn checkout_parent(&self, target: &ScanTarget) -> PathBuf {
        self.repositories_dir
            .join(target.class().dir_name())
            .join(target.language())
    }

    /// Working copy: `{repositories}/{class}/{language}/{repository}`
    pub fn checkout_dir(&self, target: &ScanTarget) -> PathBuf {
        self.checkout_parent(target).join(target.repository())
    }

    /// Result directory: `{results}/{tool}/{class}/{language}/{repository}`
    pub fn result_dir(&self, tool: &str, target: &ScanTarget) -> PathBuf {
        self.results_dir
            .join(tool)
            .join(target.class().dir_name())
            .join(target.language())
            .join(target.repository())
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Everything a runner needs to scan the batch
///
/// Targets are ordered: all vulnerable targets first, then non-vulnerable,
/// each in configured language and repository order.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    targets: Vec<ScanTarget>,
    layout: WorkspaceLayout,
    secrets: BTreeMap<String, String>,
}

impl ScanPlan {
    pub fn new(
        targets: Vec<ScanTarget>,
        layout: WorkspaceLayout,
        secrets: BTreeMap<String, String>,
    ) -> Self {
        Self {
            targets,
            layout,
            secrets,
        }
    }

    pub fn targets(&self) -> &[ScanTarget] {
        &self.targets
    }

    pub fn targets_in(&self, class: VulnerabilityClass) -> impl Iterator<Item = &ScanTarget> {
        self.targets.iter().filter(move |t| t.class() == class)
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn secret(&self, name: &str) -> Option<&str> {
        self.secrets.get(name).map(String::as_str)
    }

    pub fn secrets(&self) -> &BTreeMap<String, String> {
        &self.secrets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
