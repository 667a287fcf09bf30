//! Minimal SonarQube web API client

use crate::pool::api::{TaskError, TaskResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const HTTP_TIMEOUT_SECS: u64 = 60;

/// Page size for issue search; the server caps it at 500
const ISSUE_PAGE_SIZE: usize = 500;

/// The server refuses to page past this many issues
const ISSUE_SEARCH_LIMIT: usize = 10_000;

/// One issue from `/api/issues/search`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub rule: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: Option<String>,
    /// `{projectKey}:{path}`
    pub component: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One rule from `/api/rules/search`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub severity: Option<String>,
}

/// Background analysis state of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    /// Report submitted but not processed yet
    Pending,
    Succeeded,
    /// Processing ended with another status, e.g. `FAILED`
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct Health {
    health: String,
}

#[derive(Debug, Deserialize)]
struct ComponentTasks {
    #[serde(default)]
    queue: Vec<serde_json::Value>,
    #[serde(default)]
    current: Option<CeTask>,
}

#[derive(Debug, Deserialize)]
struct CeTask {
    status: String,
}

#[derive(Debug, Deserialize)]
struct IssuePage {
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    total: usize,
}

#[derive(Debug, Deserialize)]
struct RulePage {
    #[serde(default)]
    rules: Vec<Rule>,
}

/// Authenticated client for one SonarQube server
#[derive(Clone)]
pub struct SonarQubeClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

impl std::fmt::Debug for SonarQubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonarQubeClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish()
    }
}

impl SonarQubeClient {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Server health colour (`GREEN` once it accepts analyses)
    pub async fn health(&self) -> TaskResult<String> {
        let health: Health = self.get("/api/system/health", &[]).await?;
        Ok(health.health)
    }

    pub async fn create_project(&self, key: &str, name: &str) -> TaskResult<()> {
        let url = self.endpoint("/api/projects/create");
        self.http
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .form(&[("project", key), ("name", name)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| service_error(&url, e))?;
        log::debug!("Created SonarQube project {}", key);
        Ok(())
    }

    pub async fn analysis_state(&self, key: &str) -> TaskResult<AnalysisState> {
        let tasks: ComponentTasks = self
            .get("/api/ce/component", &[("component", key.to_string())])
            .await?;
        if !tasks.queue.is_empty() {
            return Ok(AnalysisState::Pending);
        }
        Ok(match tasks.current {
            None => AnalysisState::Pending,
            Some(task) if task.status == "SUCCESS" => AnalysisState::Succeeded,
            Some(task) => AnalysisState::Failed(task.status),
        })
    }

    /// Every vulnerability reported for a project
    pub async fn vulnerabilities(&self, key: &str) -> TaskResult<Vec<Issue>> {
        let mut issues = Vec::new();
        for page in 1.. {
            let batch: IssuePage = self
                .get(
                    "/api/issues/search",
                    &[
                        ("componentKeys", key.to_string()),
                        ("types", "VULNERABILITY".to_string()),
                        ("ps", ISSUE_PAGE_SIZE.to_string()),
                        ("p", page.to_string()),
                    ],
                )
                .await?;
            let total = batch.paging.map_or(0, |p| p.total);
            let received = batch.issues.len();
            issues.extend(batch.issues);

            if received == 0 || issues.len() >= total {
                break;
            }
            if issues.len() >= ISSUE_SEARCH_LIMIT {
                log::warn!(
                    "Project {} has {} vulnerabilities; only the first {} are reported",
                    key,
                    total,
                    issues.len()
                );
                break;
            }
        }
        Ok(issues)
    }

    pub async fn rule(&self, key: &str) -> TaskResult<Option<Rule>> {
        let page: RulePage = self
            .get("/api/rules/search", &[("rule_key", key.to_string())])
            .await?;
        Ok(page.rules.into_iter().find(|r| r.key == key))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> TaskResult<T> {
        let url = self.endpoint(path);
        let body = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| service_error(&url, e))?
            .text()
            .await
            .map_err(|e| service_error(&url, e))?;

        serde_json::from_str(&body).map_err(|e| TaskError::Service {
            endpoint: url,
            cause: format!("unexpected response: {}", e),
        })
    }
}

fn service_error(url: &str, e: reqwest::Error) -> TaskError {
    TaskError::Service {
        endpoint: url.to_string(),
        cause: e.to_string(),
    }
}
