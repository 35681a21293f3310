pub mod engine;
pub mod label;
pub mod log_matcher;
pub mod manifest_diff;
pub mod reconciler;
pub mod release_notes;

pub use crate::domain::model::{DeploymentManifest, ReleaseSet, ServiceNameMap};
pub use crate::domain::ports::{LogSource, TicketSystem, WikiSystem};
pub use crate::utils::error::Result;
