use crate::config::cli::LocalLogSource;
use crate::domain::ports::LogSource;
use crate::utils::error::{ReleaseError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Copies the release log from the build host with the system `scp` client,
/// authenticating with the caller's username and private key.
#[derive(Debug, Clone)]
pub struct ScpLogSource {
    pub program: String,
    pub host: String,
    pub port: u16,
    pub remote_path: String,
    pub username: String,
    pub key_path: PathBuf,
    pub local_path: PathBuf,
    pub timeout: Duration,
}

impl ScpLogSource {
    pub fn args(&self) -> Vec<String> {
        vec![
            "-B".to_string(),
            "-q".to_string(),
            "-P".to_string(),
            self.port.to_string(),
            "-i".to_string(),
            self.key_path.display().to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.timeout.as_secs().max(1)),
            format!("{}@{}:{}", self.username, self.host, self.remote_path),
            self.local_path.display().to_string(),
        ]
    }

    fn fetch_error(&self, message: String) -> ReleaseError {
        ReleaseError::RemoteFetch {
            host: self.host.clone(),
            message,
        }
    }

    async fn download(&self) -> Result<()> {
        tracing::info!(
            "📥 Fetching {} from {}@{}",
            self.remote_path,
            self.username,
            self.host
        );

        let mut command = Command::new(&self.program);
        command.args(self.args()).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                self.fetch_error(format!(
                    "transfer did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| self.fetch_error(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(self.fetch_error(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        tracing::debug!("Release log saved to {}", self.local_path.display());
        Ok(())
    }
}

#[async_trait]
impl LogSource for ScpLogSource {
    async fn fetch_lines(&self) -> Result<Vec<String>> {
        self.download().await?;
        LocalLogSource::new(self.local_path.clone())
            .fetch_lines()
            .await
            .map_err(|e| self.fetch_error(format!("downloaded log is unreadable: {}", e)))
    }
}
