use crate::domain::model::{NewIssue, NewPage, PageCreation, VersionRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TicketSystem: Send + Sync {
    /// Creates an issue and returns its key.
    async fn create_issue(&self, issue: &NewIssue) -> Result<String>;
    async fn issue_description(&self, key: &str) -> Result<String>;
    async fn update_description(&self, key: &str, description: &str) -> Result<()>;
    async fn project_versions(&self, project: &str) -> Result<Vec<VersionRecord>>;
    async fn update_version(&self, id: &str, released: bool, description: &str) -> Result<()>;
    fn browse_url(&self, key: &str) -> String;
}

#[async_trait]
pub trait WikiSystem: Send + Sync {
    async fn create_page(&self, page: &NewPage) -> Result<PageCreation>;
    async fn find_page(&self, title: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch_lines(&self) -> Result<Vec<String>>;
}
