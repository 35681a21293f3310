pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{ConfluenceClient, JiraClient, ScpLogSource};
pub use config::{cli::LocalLogSource, toml_config::ReleaseConfig, CliConfig};
pub use core::engine::{ReleaseEngine, ReleaseOutcome};
pub use core::label::LabelFormatter;
pub use core::log_matcher::LogMatcher;
pub use core::reconciler::{ReconcileSettings, ReleaseReconciler, ReleaseRequest};
pub use utils::error::{ReleaseError, Result};
