use crate::core::reconciler::ReconcileSettings;
use crate::core::release_notes::{MacroSettings, DEFAULT_MACRO_COLUMNS, DEFAULT_ORDER_BY};
use crate::domain::model::ServiceNameMap;
use crate::utils::error::{ReleaseError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_project_key,
    validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "release-config.toml";

fn env_placeholder() -> &'static Regex {
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env regex"))
}

/// 替換後仍留有 `${VAR}` 代表環境變數未設定
fn validate_resolved(field: &str, value: &str) -> Result<()> {
    match env_placeholder().captures(value) {
        Some(caps) => Err(ReleaseError::ConfigValidationError {
            field: field.to_string(),
            message: format!("environment variable {} is not set", &caps[1]),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    pub jira: Option<JiraConfig>,
    pub confluence: Option<ConfluenceConfig>,
    pub log_source: Option<LogSourceConfig>,
    #[serde(default)]
    pub labels: LabelsConfig,
    /// Deployment name -> source repository name.
    #[serde(default)]
    pub services: ServiceNameMap,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
    #[serde(default = "default_ticket_project")]
    pub ticket_project: String,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    #[serde(default = "default_version_project")]
    pub version_project: String,
    #[serde(default = "default_release_state")]
    pub release_state: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
    pub space_key: String,
    pub parent_page_id: Option<String>,
    pub macro_columns: Option<String>,
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSourceConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub remote_path: String,
    #[serde(default = "default_local_path")]
    pub local_path: String,
    #[serde(default = "default_program")]
    pub program: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsConfig {
    pub allowed_years: Vec<i32>,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            allowed_years: vec![2018],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

fn default_ticket_project() -> String {
    "REL".to_string()
}

fn default_issue_type() -> String {
    "Task".to_string()
}

fn default_version_project() -> String {
    "X".to_string()
}

fn default_release_state() -> bool {
    true
}

fn default_ssh_port() -> u16 {
    22
}

fn default_local_path() -> String {
    "release.log".to_string()
}

fn default_program() -> String {
    "scp".to_string()
}

impl ReleaseConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReleaseError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ReleaseError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${JIRA_TOKEN})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder().replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn require_jira(&self) -> Result<&JiraConfig> {
        validate_required_field("jira", &self.jira)
    }

    pub fn require_confluence(&self) -> Result<&ConfluenceConfig> {
        validate_required_field("confluence", &self.confluence)
    }

    pub fn require_log_source(&self) -> Result<&LogSourceConfig> {
        validate_required_field("log_source", &self.log_source)
    }

    pub fn require_services(&self) -> Result<&ServiceNameMap> {
        if self.services.is_empty() {
            return Err(ReleaseError::MissingConfigError {
                field: "services".to_string(),
            });
        }
        Ok(&self.services)
    }

    pub fn reconcile_settings(&self) -> Result<ReconcileSettings> {
        let jira = self.require_jira()?;
        Ok(ReconcileSettings {
            ticket_project: jira.ticket_project.clone(),
            issue_type: jira.issue_type.clone(),
            version_project: jira.version_project.clone(),
            release_state: jira.release_state,
        })
    }

    pub fn macro_settings(&self) -> MacroSettings {
        let confluence = self.confluence.as_ref();
        MacroSettings {
            columns: confluence
                .and_then(|c| c.macro_columns.clone())
                .unwrap_or_else(|| DEFAULT_MACRO_COLUMNS.to_string()),
            order_by: confluence
                .and_then(|c| c.order_by.clone())
                .unwrap_or_else(|| DEFAULT_ORDER_BY.to_string()),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_positive_number("http.timeout_seconds", self.http.timeout_seconds, 1)?;

        if self.labels.allowed_years.is_empty() {
            return Err(ReleaseError::ConfigValidationError {
                field: "labels.allowed_years".to_string(),
                message: "at least one year must be allowed".to_string(),
            });
        }

        if let Some(jira) = &self.jira {
            validate_resolved("jira.base_url", &jira.base_url)?;
            validate_resolved("jira.username", &jira.username)?;
            validate_resolved("jira.api_token", &jira.api_token)?;
            validate_url("jira.base_url", &jira.base_url)?;
            validate_non_empty_string("jira.username", &jira.username)?;
            validate_non_empty_string("jira.api_token", &jira.api_token)?;
            validate_project_key("jira.ticket_project", &jira.ticket_project)?;
            validate_project_key("jira.version_project", &jira.version_project)?;
            validate_non_empty_string("jira.issue_type", &jira.issue_type)?;
        }

        if let Some(confluence) = &self.confluence {
            validate_resolved("confluence.base_url", &confluence.base_url)?;
            validate_resolved("confluence.username", &confluence.username)?;
            validate_resolved("confluence.api_token", &confluence.api_token)?;
            validate_resolved("confluence.space_key", &confluence.space_key)?;
            if let Some(parent) = &confluence.parent_page_id {
                validate_resolved("confluence.parent_page_id", parent)?;
            }
            validate_url("confluence.base_url", &confluence.base_url)?;
            validate_non_empty_string("confluence.username", &confluence.username)?;
            validate_non_empty_string("confluence.api_token", &confluence.api_token)?;
            validate_non_empty_string("confluence.space_key", &confluence.space_key)?;
        }

        if let Some(log_source) = &self.log_source {
            validate_resolved("log_source.host", &log_source.host)?;
            validate_non_empty_string("log_source.host", &log_source.host)?;
            validate_path("log_source.remote_path", &log_source.remote_path)?;
            validate_path("log_source.local_path", &log_source.local_path)?;
            validate_non_empty_string("log_source.program", &log_source.program)?;
        }

        for (name, source) in &self.services {
            validate_non_empty_string(&format!("services.{}", name), source)?;
        }

        Ok(())
    }
}

impl Validate for ReleaseConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
