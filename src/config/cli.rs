use crate::domain::ports::LogSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Release log already present on the local disk.
#[derive(Debug, Clone)]
pub struct LocalLogSource {
    path: PathBuf,
}

impl LocalLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogSource for LocalLogSource {
    async fn fetch_lines(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read(&self.path).await?;
        // release.log 可能含有非 UTF-8 的建置輸出
        let text = String::from_utf8_lossy(&content);
        Ok(text.lines().map(str::to_string).collect())
    }
}
