//! Report rendering
//!
//! HTML goes through a tera template with autoescaping on. The embedded
//! default can be replaced by a template loaded from a file or an http(s)
//! URL. JSON export serialises the tree as-is.

use crate::core::version;
use crate::report::aggregator::AggregationTree;
use crate::report::error::{ReportError, ReportResult};
use serde::Serialize;
use std::path::Path;

/// Default timeout for HTTP requests when loading templates from URLs
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

const DEFAULT_TEMPLATE: &str = include_str!("templates/report.html.tera");
const REPORT_TITLE: &str = "SARIF Analysis Report";

#[derive(Serialize)]
struct LanguageView<'a> {
    name: &'a str,
    repositories: Vec<RepositoryView<'a>>,
}

#[derive(Serialize)]
struct RepositoryView<'a> {
    name: &'a str,
    classes: Vec<ClassView<'a>>,
}

#[derive(Serialize)]
struct ClassView<'a> {
    key: &'static str,
    label: &'static str,
    tools: Vec<ToolView<'a>>,
}

#[derive(Serialize)]
struct ToolView<'a> {
    name: &'a str,
    count: usize,
    findings: Vec<String>,
}

/// Nest the flat leaf rows back into the heading hierarchy
fn build_view(tree: &AggregationTree) -> Vec<LanguageView<'_>> {
    let mut languages: Vec<LanguageView<'_>> = Vec::new();

    for row in tree.rows() {
        if languages.last().map(|l| l.name) != Some(row.language) {
            languages.push(LanguageView {
                name: row.language,
                repositories: Vec::new(),
            });
        }
        let Some(language) = languages.last_mut() else {
            continue;
        };

        if language.repositories.last().map(|r| r.name) != Some(row.repository) {
            language.repositories.push(RepositoryView {
                name: row.repository,
                classes: Vec::new(),
            });
        }
        let Some(repository) = language.repositories.last_mut() else {
            continue;
        };

        if repository.classes.last().map(|c| c.key) != Some(row.class.dir_name()) {
            repository.classes.push(ClassView {
                key: row.class.dir_name(),
                label: row.class.label(),
                tools: Vec::new(),
            });
        }
        let Some(class) = repository.classes.last_mut() else {
            continue;
        };

        class.tools.push(ToolView {
            name: row.tool,
            count: row.findings.len(),
            findings: row.findings.iter().map(ToString::to_string).collect(),
        });
    }

    languages
}

/// Renders an `AggregationTree` through a tera template
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    template: String,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::with_template(DEFAULT_TEMPLATE)
    }
}

impl ReportRenderer {
    /// Renderer using the embedded template
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load template from file path
    pub fn from_file(path: &str) -> ReportResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReportError::Io {
            operation: "read template".to_string(),
            path: path.to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::with_template(content))
    }

    /// Load template from URL with custom timeout
    pub async fn from_url_with_timeout(url: &str, timeout_secs: u64) -> ReportResult<Self> {
        if !is_url(url) {
            return Err(ReportError::Template {
                cause: format!(
                    "Invalid URL scheme. Only http:// and https:// are supported: {}",
                    url
                ),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReportError::Template {
                cause: format!("Failed to create HTTP client: {}", e),
            })?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| ReportError::Io {
                operation: "fetch template".to_string(),
                path: url.to_string(),
                cause: format!("Network request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(ReportError::Io {
                operation: "fetch template".to_string(),
                path: url.to_string(),
                cause: format!(
                    "HTTP {} - {}",
                    response.status().as_u16(),
                    response
                        .status()
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                ),
            });
        }

        let content = response.text().await.map_err(|e| ReportError::Io {
            operation: "read template response".to_string(),
            path: url.to_string(),
            cause: format!("Failed to read response body: {}", e),
        })?;

        Ok(Self::with_template(content))
    }

    /// Load template from path or URL (auto-detect) with default timeout
    pub async fn from_source(source: &str) -> ReportResult<Self> {
        if is_url(source) {
            Self::from_url_with_timeout(source, DEFAULT_HTTP_TIMEOUT_SECS).await
        } else {
            Self::from_file(source)
        }
    }

    /// Render the tree to HTML
    pub fn render(&self, tree: &AggregationTree) -> ReportResult<String> {
        let mut context = tera::Context::new();
        context.insert("title", REPORT_TITLE);
        context.insert("languages", &build_view(tree));
        context.insert("total_findings", &tree.total_findings());
        context.insert(
            "generated_at",
            &chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        context.insert("generator", &version::long_version());

        tera::Tera::one_off(&self.template, &context, true).map_err(|e| ReportError::Template {
            cause: error_chain(&e),
        })
    }

    /// Render the tree and write it to `path`
    pub fn write(&self, tree: &AggregationTree, path: &Path) -> ReportResult<()> {
        let html = self.render(tree)?;
        write_file(path, html.as_bytes(), "write report")?;
        log::info!("Report generated: {}", path.display());
        Ok(())
    }
}

/// Write the tree as pretty-printed JSON
pub fn write_json(tree: &AggregationTree, path: &Path) -> ReportResult<()> {
    let json = serde_json::to_string_pretty(tree).map_err(|e| ReportError::Io {
        operation: "serialise report".to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;
    write_file(path, json.as_bytes(), "write JSON report")?;
    log::info!("JSON report written: {}", path.display());
    Ok(())
}

fn write_file(path: &Path, content: &[u8], operation: &str) -> ReportResult<()> {
    let io_error = |e: std::io::Error| ReportError::Io {
        operation: operation.to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Tera reports the useful detail in the source chain
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
