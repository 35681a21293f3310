use crate::adapters::http::{build_client, ensure_success, normalize_base_url, request_error};
use crate::domain::model::{NewIssue, VersionRecord};
use crate::domain::ports::TicketSystem;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SERVICE: &str = "jira";

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    fields: IssueFields,
}

/// Jira REST v2 client.
pub struct JiraClient {
    base_url: String,
    username: String,
    api_token: String,
    timeout: Duration,
    client: Client,
}

impl JiraClient {
    pub fn new(base_url: &str, username: &str, api_token: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url),
            username: username.to_string(),
            api_token: api_token.to_string(),
            timeout,
            client: build_client(timeout)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.base_url, path)
    }

    async fn send(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .basic_auth(&self.username, Some(&self.api_token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| request_error(operation, self.timeout, e))?;
        ensure_success(SERVICE, response).await
    }
}

#[async_trait]
impl TicketSystem for JiraClient {
    async fn create_issue(&self, issue: &NewIssue) -> Result<String> {
        let body = json!({
            "fields": {
                "project": { "key": issue.project },
                "summary": issue.summary,
                "description": issue.description,
                "issuetype": { "name": issue.issue_type },
            }
        });
        tracing::debug!("Creating issue in project {}", issue.project);

        let response = self
            .send("create issue", self.client.post(self.url("issue")).json(&body))
            .await?;
        let created: CreatedIssue = response.json().await?;
        Ok(created.key)
    }

    async fn issue_description(&self, key: &str) -> Result<String> {
        let response = self
            .send(
                "read issue",
                self.client
                    .get(self.url(&format!("issue/{}", key)))
                    .query(&[("fields", "description")]),
            )
            .await?;
        let issue: Issue = response.json().await?;
        Ok(issue.fields.description.unwrap_or_default())
    }

    async fn update_description(&self, key: &str, description: &str) -> Result<()> {
        let body = json!({ "fields": { "description": description } });
        self.send(
            "update issue",
            self.client
                .put(self.url(&format!("issue/{}", key)))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn project_versions(&self, project: &str) -> Result<Vec<VersionRecord>> {
        let response = self
            .send(
                "list versions",
                self.client
                    .get(self.url(&format!("project/{}/versions", project))),
            )
            .await?;
        let versions: Vec<VersionRecord> = response.json().await?;
        tracing::debug!("Project {} has {} versions", project, versions.len());
        Ok(versions)
    }

    async fn update_version(&self, id: &str, released: bool, description: &str) -> Result<()> {
        let body = json!({
            "id": id,
            "released": released,
            "description": description,
        });
        self.send(
            "update version",
            self.client
                .put(self.url(&format!("version/{}", id)))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }
}
