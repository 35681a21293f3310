use crate::adapters::http::{build_client, ensure_success, normalize_base_url, request_error};
use crate::domain::model::{NewPage, PageCreation};
use crate::domain::ports::WikiSystem;
use crate::utils::error::{ReleaseError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SERVICE: &str = "confluence";

#[derive(Debug, Deserialize)]
struct Links {
    webui: String,
}

#[derive(Debug, Deserialize)]
struct CreatedContent {
    #[serde(rename = "_links")]
    links: Links,
}

#[derive(Debug, Deserialize)]
struct ContentRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ContentSearch {
    #[serde(default)]
    results: Vec<ContentRef>,
}

fn is_duplicate_title(message: &str) -> bool {
    message.to_lowercase().contains("already exists")
}

pub struct ConfluenceClient {
    base_url: String,
    username: String,
    api_token: String,
    space_key: String,
    parent_page_id: Option<String>,
    timeout: Duration,
    client: Client,
}

impl ConfluenceClient {
    pub fn new(
        base_url: &str,
        username: &str,
        api_token: &str,
        space_key: &str,
        parent_page_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url),
            username: username.to_string(),
            api_token: api_token.to_string(),
            space_key: space_key.to_string(),
            parent_page_id,
            timeout,
            client: build_client(timeout)?,
        })
    }

    fn content_url(&self) -> String {
        format!("{}/rest/api/content", self.base_url)
    }

    fn page_link(&self, id: &str) -> String {
        format!("{}/spaces/{}/pages/{}", self.base_url, self.space_key, id)
    }
}

#[async_trait]
impl WikiSystem for ConfluenceClient {
    async fn create_page(&self, page: &NewPage) -> Result<PageCreation> {
        let ancestors: Vec<_> = self
            .parent_page_id
            .iter()
            .map(|id| json!({ "id": id }))
            .collect();
        let body = json!({
            "ancestors": ancestors,
            "body": {
                "editor2": {
                    "representation": "editor2",
                    "value": page.body,
                }
            },
            "space": { "key": self.space_key },
            "status": "current",
            "title": page.title,
            "type": "page",
        });

        let response = self
            .client
            .post(self.content_url())
            .basic_auth(&self.username, Some(&self.api_token))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("create page", self.timeout, e))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            tracing::debug!("Create page rejected with {}", status);
            return Ok(PageCreation::AlreadyExists);
        }

        // Confluence 對重複標題回傳 400，其他 400 原樣回報
        if status == StatusCode::BAD_REQUEST {
            let message = response.text().await.unwrap_or_default();
            if is_duplicate_title(&message) {
                tracing::debug!("Create page rejected with {}: {}", status, message);
                return Ok(PageCreation::AlreadyExists);
            }
            return Err(ReleaseError::ExternalService {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedContent = ensure_success(SERVICE, response).await?.json().await?;
        Ok(PageCreation::Created {
            link: format!("{}{}", self.base_url, created.links.webui),
        })
    }

    async fn find_page(&self, title: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.content_url())
            .basic_auth(&self.username, Some(&self.api_token))
            .header("Accept", "application/json")
            .query(&[("spaceKey", self.space_key.as_str()), ("title", title)])
            .send()
            .await
            .map_err(|e| request_error("find page", self.timeout, e))?;

        let search: ContentSearch = ensure_success(SERVICE, response).await?.json().await?;
        Ok(search.results.first().map(|content| self.page_link(&content.id)))
    }
}
