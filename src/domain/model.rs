use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One `{name, version}` entry of a deployment manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDeployment {
    pub name: String,
    pub version: String,
}

/// Snapshot of what is deployed on an environment (`deploy.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    pub deployment: Vec<ServiceDeployment>,
}

/// Deployment name -> source repository name.
pub type ServiceNameMap = BTreeMap<String, String>;

/// Unique `<source>-<version>` identifiers. Ordered so that reports are stable.
pub type ReleaseSet = BTreeSet<String>;

/// A service whose version differs between the previous and current manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceChange {
    pub name: String,
    pub previous_version: String,
    pub current_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum PeriodKind {
    Year,
    Month,
    Week,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Year => "year",
            PeriodKind::Month => "month",
            PeriodKind::Week => "week",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `RY.<year>`, `RM.<year>.<mm>` or `RW.<year>.<ww>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseLabel(String);

impl ReleaseLabel {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTicket {
    pub key: String,
    pub description: String,
}

/// Per-service version entity of the ticketing system, named `<service>_<major.minor.patch>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub project: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCreation {
    Created { link: String },
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPage {
    pub title: String,
    pub link: String,
    pub already_existed: bool,
}

/// Non-fatal per-identifier outcomes reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseWarning {
    /// No `REL-` tagged log line corroborates this release.
    UnmatchedIdentifier(String),
    /// No version record with this name in the target project.
    UnmappedVersion(String),
    VersionUpdateFailed { version: String, reason: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::UnmatchedIdentifier(id) => {
                write!(f, "{} not found in release log", id)
            }
            ReleaseWarning::UnmappedVersion(version) => {
                write!(f, "{} not found on the version project", version)
            }
            ReleaseWarning::VersionUpdateFailed { version, reason } => {
                write!(f, "{} could not be updated: {}", version, reason)
            }
        }
    }
}
