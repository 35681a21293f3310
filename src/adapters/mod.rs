// Adapters layer: concrete implementations of the domain ports (Jira, Confluence, remote log).

pub mod confluence;
pub mod http;
pub mod jira;
pub mod scp;

pub use confluence::ConfluenceClient;
pub use jira::JiraClient;
pub use scp::ScpLogSource;
