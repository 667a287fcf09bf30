//! Test modules for result aggregation and reporting


use std::fs;
use std::path::Path;

/// Minimal SARIF document with one result per (rule, level, message, uri, line)
pub(crate) fn sarif_with(driver: &str, results: &[(&str, &str, &str, &str, u64)]) -> String {
    let results: Vec<serde_json::Value> = results
        .iter()
        .map(|(rule, level, message, uri, line)| {
            serde_json::json!({
                "ruleId": rule,
                "level": level,
                "message": { "text": message },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": uri },
                        "region": { "startLine": line }
                    }
                }]
            })
        })
        .collect();

    serde_json::json!({
        "version": "2.1.0",
        "runs": [{ "tool": { "driver": { "name": driver } }, "results": results }]
    })
    .to_string()
}

/// Write `content` to `{root}/{tool}/{class}/{language}/{repository}/{file}`
pub(crate) fn write_result(
    root: &Path,
    tool: &str,
    class: &str,
    language: &str,
    repository: &str,
    file: &str,
    content: &str,
) {
    let dir = root.join(tool).join(class).join(language).join(repository);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), content).unwrap();
}
