//! SonarQube issues as a SARIF 2.1.0 document

use crate::runner::builtin::sonarqube::client::{Issue, Rule};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const DRIVER_NAME: &str = "SonarQube";

const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

/// Path of an issue's file relative to the project root
///
/// Components are reported as `{projectKey}:{path}`.
pub fn component_path<'a>(component: &'a str, project_key: &str) -> &'a str {
    component
        .strip_prefix(project_key)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(component)
}

/// Issue message followed by its tags
fn issue_message(issue: &Issue) -> String {
    if issue.tags.is_empty() {
        issue.message.clone()
    } else {
        format!("{} {}", issue.message, issue.tags.join(", "))
    }
}

/// Build a SARIF log from the issues of one project
///
/// Severity is carried inline on each result; `rules` fills the driver's
/// rule table where a rule could be looked up.
pub fn issues_to_sarif(
    project_key: &str,
    issues: &[Issue],
    rules: &BTreeMap<String, Rule>,
) -> Value {
    let results: Vec<Value> = issues
        .iter()
        .map(|issue| {
            let mut region = json!({});
            if let Some(line) = issue.line {
                region["startLine"] = json!(line);
            }
            let mut result = json!({
                "ruleId": issue.rule,
                "message": { "text": issue_message(issue) },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": component_path(&issue.component, project_key) },
                        "region": region,
                    }
                }],
            });
            if let Some(severity) = &issue.severity {
                result["level"] = json!(severity);
            }
            result
        })
        .collect();

    let rule_table: Vec<Value> = rules
        .values()
        .map(|rule| {
            json!({
                "id": rule.key,
                "name": rule.name,
                "shortDescription": { "text": rule.name },
                "defaultConfiguration": { "level": rule.severity },
            })
        })
        .collect();

    json!({
        "$schema": SARIF_SCHEMA,
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": DRIVER_NAME,
                    "fullName": "SonarQube Community Edition",
                    "rules": rule_table,
                }
            },
            "results": results,
        }]
    })
}
