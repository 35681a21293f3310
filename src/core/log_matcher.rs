use crate::domain::model::{ReleaseSet, ReleaseWarning};
use crate::utils::error::{ReleaseError, Result};
use regex::Regex;

pub const DEFAULT_TICKET_PROJECT: &str = "REL";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMatch {
    pub found: ReleaseSet,
    /// Ticket-tagged lines, once per identifier they mention.
    pub annotated_lines: Vec<String>,
}

impl LogMatch {
    /// Identifiers of the release set that no ticket-tagged line corroborates.
    pub fn missing(&self, release_set: &ReleaseSet) -> Vec<ReleaseWarning> {
        release_set
            .difference(&self.found)
            .map(|id| ReleaseWarning::UnmatchedIdentifier(id.clone()))
            .collect()
    }
}

/// Correlates release identifiers with ticket references in the release log.
///
/// Identifiers are matched as plain substrings, so `svc-1.0.1` also fires on a
/// line that mentions `svc-1.0.10`.
#[derive(Debug, Clone)]
pub struct LogMatcher {
    ticket_reference: Regex,
}

impl LogMatcher {
    pub fn new(ticket_project: &str) -> Result<Self> {
        let pattern = format!(r"^{}-\d+", regex::escape(ticket_project));
        let ticket_reference = Regex::new(&pattern).map_err(|e| ReleaseError::ConfigError {
            message: format!("invalid ticket reference pattern '{}': {}", pattern, e),
        })?;
        Ok(Self { ticket_reference })
    }

    pub fn scan<I, S>(&self, log_lines: I, release_set: &ReleaseSet) -> LogMatch
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = LogMatch::default();

        for line in log_lines {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);
            for id in release_set {
                if !line.contains(id.as_str()) {
                    continue;
                }
                tracing::info!("[JIRA]:  -->:{}", line);

                if self.ticket_reference.is_match(line) {
                    outcome.annotated_lines.push(line.to_string());
                    outcome.found.insert(id.clone());
                }
            }
        }

        outcome
    }
}

impl Default for LogMatcher {
    fn default() -> Self {
        Self {
            ticket_reference: Regex::new(r"^REL-\d+").expect("valid ticket regex"),
        }
    }
}
