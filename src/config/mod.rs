pub mod cli;
pub mod toml_config;

use crate::core::reconciler::ReleaseRequest;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "release-ticket")]
#[command(about = "Create a release ticket from the services that changed between two deployments")]
pub struct CliConfig {
    /// User performing the release (also used for the build host)
    #[arg(short, long)]
    pub user: String,

    /// Private key used to reach the build host
    #[arg(short, long)]
    pub keys: String,

    /// Summary of the release ticket
    #[arg(short, long)]
    pub summary: String,

    /// Deployment manifest with the versions to be deployed
    #[arg(short, long)]
    pub current: String,

    /// Deployment manifest with the versions deployed on the environment
    #[arg(short, long)]
    pub previous: String,

    #[arg(short, long)]
    pub environment: String,

    /// Mark every released version on the version project
    #[arg(short = 'r', long = "released")]
    pub released: bool,

    /// Augment this existing ticket instead of creating a new one
    #[arg(long)]
    pub ticket: Option<String>,

    /// Read the release log from a local file instead of the build host
    #[arg(long)]
    pub release_log: Option<String>,

    #[arg(long, default_value = toml_config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn release_request(&self) -> ReleaseRequest {
        ReleaseRequest {
            summary: self.summary.clone(),
            environment: self.environment.clone(),
            triggered_by: self.user.clone(),
            mark_released: self.released,
            existing_ticket: self.ticket.clone(),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("user", &self.user)?;
        validate_non_empty_string("summary", &self.summary)?;
        validate_non_empty_string("environment", &self.environment)?;
        validate_path("current", &self.current)?;
        validate_path("previous", &self.previous)?;
        if self.release_log.is_none() {
            validate_path("keys", &self.keys)?;
        }
        if let Some(ticket) = &self.ticket {
            validate_non_empty_string("ticket", ticket)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let config = CliConfig::try_parse_from([
            "release-ticket",
            "-u",
            "queca",
            "-k",
            "/home/.ssh/id_rsa",
            "-s",
            "sprint 30",
            "-c",
            "current.json",
            "-p",
            "previous.json",
            "-e",
            "prod",
            "-r",
        ])
        .unwrap();

        assert!(config.released);
        assert_eq!(config.config, "release-config.toml");
        assert!(config.validate().is_ok());

        let request = config.release_request();
        assert_eq!(request.triggered_by, "queca");
        assert!(request.mark_released);
        assert_eq!(request.existing_ticket, None);
    }

    #[test]
    fn test_required_arguments() {
        assert!(CliConfig::try_parse_from(["release-ticket", "-u", "queca"]).is_err());
    }

    #[test]
    fn test_blank_summary_is_rejected() {
        let config = CliConfig::try_parse_from([
            "release-ticket",
            "--user",
            "queca",
            "--keys",
            "key",
            "--summary",
            "  ",
            "--current",
            "c.json",
            "--previous",
            "p.json",
            "--environment",
            "prod",
            "--ticket",
            "REL-9",
        ])
        .unwrap();
        assert!(config.validate().is_err());
        assert_eq!(config.release_request().existing_ticket.as_deref(), Some("REL-9"));
    }
}
