//! SARIF 2.1.0 parsing
//!
//! Only the fields needed for a `Finding` are modelled; everything else in
//! the document is ignored. Severity lookup differs per tool family and is
//! chosen from `runs[].tool.driver.name`.

use crate::report::error::{ReportError, ReportResult};
use crate::report::finding::Finding;
use serde::Deserialize;
use std::path::Path;

/// Message used when a result carries no text
const NO_MESSAGE: &str = "No message provided";

#[derive(Debug, Default, Deserialize)]
struct SarifLog {
    #[serde(default)]
    runs: Vec<Run>,
}

#[derive(Debug, Default, Deserialize)]
struct Run {
    #[serde(default)]
    tool: Tool,
    #[serde(default)]
    results: Option<Vec<SarifResult>>,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    #[serde(default)]
    driver: Driver,
}

#[derive(Debug, Default, Deserialize)]
struct Driver {
    #[serde(default)]
    name: String,
    #[serde(default)]
    rules: Vec<ReportingDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportingDescriptor {
    id: String,
    #[serde(default)]
    default_configuration: Option<ReportingConfiguration>,
}

#[derive(Debug, Deserialize)]
struct ReportingConfiguration {
    #[serde(default)]
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    rule: Option<RuleReference>,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    locations: Vec<Location>,
}

impl SarifResult {
    /// `ruleId`, falling back to `rule.id`
    fn rule_id(&self) -> Option<&str> {
        self.rule_id
            .as_deref()
            .or_else(|| self.rule.as_ref().and_then(|r| r.id.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct RuleReference {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    #[serde(default)]
    physical_location: Option<PhysicalLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhysicalLocation {
    #[serde(default)]
    artifact_location: Option<ArtifactLocation>,
    #[serde(default)]
    region: Option<Region>,
}

#[derive(Debug, Deserialize)]
struct ArtifactLocation {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Region {
    #[serde(default)]
    start_line: Option<u64>,
}

/// Where a tool family records a result's severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityStrategy {
    /// `result.level`
    Inline,
    /// `tool.driver.rules[id == ruleId].defaultConfiguration.level`
    RuleTable,
}

impl SeverityStrategy {
    /// Strategy for a `tool.driver.name`
    pub fn for_driver(name: &str) -> Self {
        if name.eq_ignore_ascii_case("codeql") {
            SeverityStrategy::RuleTable
        } else {
            SeverityStrategy::Inline
        }
    }

    fn level(self, driver: &Driver, result: &SarifResult) -> Option<String> {
        match self {
            SeverityStrategy::Inline => result.level.clone(),
            SeverityStrategy::RuleTable => {
                let rule_id = result.rule_id()?;
                driver
                    .rules
                    .iter()
                    .find(|rule| rule.id == rule_id)
                    .and_then(|rule| rule.default_configuration.as_ref())
                    .and_then(|config| config.level.clone())
            }
        }
    }
}

/// Parse a SARIF document into findings attributed to `tool`
pub fn parse_sarif(content: &str, tool: &str) -> Result<Vec<Finding>, serde_json::Error> {
    let log: SarifLog = serde_json::from_str(content)?;
    let mut findings = Vec::new();

    for run in &log.runs {
        let strategy = SeverityStrategy::for_driver(&run.tool.driver.name);
        for result in run.results.iter().flatten() {
            let physical = result
                .locations
                .first()
                .and_then(|l| l.physical_location.as_ref());

            findings.push(Finding {
                tool: tool.to_string(),
                rule_id: result.rule_id().map(str::to_string),
                level: strategy.level(&run.tool.driver, result),
                message: result
                    .message
                    .as_ref()
                    .and_then(|m| m.text.clone())
                    .unwrap_or_else(|| NO_MESSAGE.to_string()),
                path: physical
                    .and_then(|p| p.artifact_location.as_ref())
                    .and_then(|a| a.uri.clone()),
                line: physical
                    .and_then(|p| p.region.as_ref())
                    .and_then(|r| r.start_line),
            });
        }
    }

    Ok(findings)
}

/// Read and parse one result file
pub fn parse_sarif_file(path: &Path, tool: &str) -> ReportResult<Vec<Finding>> {
    let content = std::fs::read_to_string(path).map_err(|e| ReportError::Io {
        operation: "read result file".to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;

    parse_sarif(&content, tool).map_err(|e| ReportError::Parse {
        path: path.display().to_string(),
        cause: e.to_string(),
    })
}
