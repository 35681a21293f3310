use crate::core::log_matcher::{LogMatch, LogMatcher};
use crate::core::manifest_diff::version_record_name;
use crate::domain::model::{NewIssue, ReleaseSet, ReleaseTicket, ReleaseWarning};
use crate::domain::ports::TicketSystem;
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub ticket_project: String,
    pub issue_type: String,
    /// Project holding the per-service version records.
    pub version_project: String,
    /// Value written to the `released` flag of matched version records.
    pub release_state: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub summary: String,
    pub environment: String,
    pub triggered_by: String,
    pub mark_released: bool,
    /// Augment this ticket instead of creating a new one.
    pub existing_ticket: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMarking {
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub warnings: Vec<ReleaseWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub ticket: ReleaseTicket,
    pub ticket_url: String,
    pub created: bool,
    pub log_match: LogMatch,
    pub versions: Option<VersionMarking>,
    pub warnings: Vec<ReleaseWarning>,
}

/// Drives a release ticket through `created -> description-augmented [-> versions-marked]`.
pub struct ReleaseReconciler<'a, T: TicketSystem + ?Sized> {
    tickets: &'a T,
    settings: &'a ReconcileSettings,
    matcher: LogMatcher,
}

impl<'a, T: TicketSystem + ?Sized> ReleaseReconciler<'a, T> {
    pub fn new(tickets: &'a T, settings: &'a ReconcileSettings) -> Result<Self> {
        let matcher = LogMatcher::new(&settings.ticket_project)?;
        Ok(Self {
            tickets,
            settings,
            matcher,
        })
    }

    pub async fn reconcile(
        &self,
        request: &ReleaseRequest,
        release_set: &ReleaseSet,
        log_lines: &[String],
    ) -> Result<ReconcileReport> {
        let (key, created) = match &request.existing_ticket {
            Some(key) => {
                tracing::info!("📌 Reusing release ticket {}", key);
                (key.clone(), false)
            }
            None => (self.create_ticket(request).await?, true),
        };
        let ticket_url = self.tickets.browse_url(&key);
        tracing::info!("[JIRA]: Release ticket: {}", ticket_url);

        let current_description = self.tickets.issue_description(&key).await?;

        let log_match = self.matcher.scan(log_lines, release_set);
        let mut warnings = log_match.missing(release_set);
        tracing::info!("Found in release log: {:?}", log_match.found);
        for warning in &warnings {
            tracing::warn!("[WARNING] {}", warning);
        }

        let description = append_log_lines(&current_description, &log_match.annotated_lines);
        if description != current_description {
            self.tickets.update_description(&key, &description).await?;
            tracing::debug!("Description of {} updated", key);
        } else {
            tracing::info!("Description of {} already up to date", key);
        }

        let versions = if request.mark_released {
            let marking = self
                .mark_versions(release_set, &request.triggered_by)
                .await?;
            warnings.extend(marking.warnings.iter().cloned());
            Some(marking)
        } else {
            None
        };

        Ok(ReconcileReport {
            ticket: ReleaseTicket { key, description },
            ticket_url,
            created,
            log_match,
            versions,
            warnings,
        })
    }

    async fn create_ticket(&self, request: &ReleaseRequest) -> Result<String> {
        let issue = NewIssue {
            project: self.settings.ticket_project.clone(),
            summary: format!("Release of {} on {}", request.summary, request.environment),
            description: format!(
                "Automatically created by DevOps build team \n triggered by {}\n",
                request.triggered_by
            ),
            issue_type: self.settings.issue_type.clone(),
        };
        let key = self.tickets.create_issue(&issue).await?;
        tracing::info!("🎫 Created release ticket {}", key);
        Ok(key)
    }

    /// Sets the released flag on the version record of every identifier.
    ///
    /// Each identifier is handled on its own: a missing record or a failed update
    /// becomes a warning and the remaining identifiers are still processed.
    pub async fn mark_versions(
        &self,
        release_set: &ReleaseSet,
        triggered_by: &str,
    ) -> Result<VersionMarking> {
        let records = self
            .tickets
            .project_versions(&self.settings.version_project)
            .await?;
        let description = format!(
            "Transition performed by DevOps team triggered by :{}",
            triggered_by
        );
        let mut marking = VersionMarking::default();

        for id in release_set {
            let name = version_record_name(id);
            let Some(record) = records.iter().find(|record| record.name == name) else {
                tracing::warn!(
                    "[WARNING] {} not found on Jira {} project",
                    name,
                    self.settings.version_project
                );
                marking.warnings.push(ReleaseWarning::UnmappedVersion(name));
                continue;
            };

            if record.released == self.settings.release_state {
                tracing::info!(
                    "[JIRA] {} already has released={}",
                    record.name,
                    record.released
                );
                marking.unchanged.push(name);
                continue;
            }

            match self
                .tickets
                .update_version(&record.id, self.settings.release_state, &description)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        "[JIRA] {} \"released\" on Jira (released={})",
                        record.name,
                        self.settings.release_state
                    );
                    marking.updated.push(name);
                }
                Err(e) => {
                    tracing::warn!("[WARNING] {} could not be updated: {}", name, e);
                    marking.warnings.push(ReleaseWarning::VersionUpdateFailed {
                        version: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(marking)
    }
}

/// Appends log lines that the description does not contain yet.
pub fn append_log_lines(description: &str, lines: &[String]) -> String {
    let existing: Vec<&str> = description.lines().collect();
    let new_lines: Vec<&String> = lines
        .iter()
        .filter(|line| !existing.contains(&line.as_str()))
        .collect();

    if new_lines.is_empty() {
        return description.to_string();
    }

    // 原有內容保留不動，只在後面空一行接上
    let mut updated = description.to_string();
    if !updated.is_empty() {
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push('\n');
    }
    for line in new_lines {
        updated.push_str(line);
        updated.push('\n');
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::VersionRecord;
    use crate::utils::error::ReleaseError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        issues: HashMap<String, String>,
        created: Vec<NewIssue>,
        versions: Vec<VersionRecord>,
        version_updates: Vec<(String, bool, String)>,
        description_updates: usize,
    }

    #[derive(Clone, Default)]
    struct MockTickets {
        state: Arc<Mutex<State>>,
        failing_version_ids: Vec<String>,
    }

    impl MockTickets {
        fn with_versions(versions: Vec<VersionRecord>) -> Self {
            let tickets = Self::default();
            tickets.state.try_lock().unwrap().versions = versions;
            tickets
        }
    }

    #[async_trait]
    impl TicketSystem for MockTickets {
        async fn create_issue(&self, issue: &NewIssue) -> Result<String> {
            let mut state = self.state.lock().await;
            let key = format!("{}-{}", issue.project, state.created.len() + 1);
            state.issues.insert(key.clone(), issue.description.clone());
            state.created.push(issue.clone());
            Ok(key)
        }

        async fn issue_description(&self, key: &str) -> Result<String> {
            let state = self.state.lock().await;
            state
                .issues
                .get(key)
                .cloned()
                .ok_or_else(|| ReleaseError::ExternalService {
                    service: "jira".to_string(),
                    status: 404,
                    message: format!("Issue {} does not exist", key),
                })
        }

        async fn update_description(&self, key: &str, description: &str) -> Result<()> {
            let mut state = self.state.lock().await;
            state.issues.insert(key.to_string(), description.to_string());
            state.description_updates += 1;
            Ok(())
        }

        async fn project_versions(&self, _project: &str) -> Result<Vec<VersionRecord>> {
            Ok(self.state.lock().await.versions.clone())
        }

        async fn update_version(&self, id: &str, released: bool, description: &str) -> Result<()> {
            if self.failing_version_ids.iter().any(|failing| failing == id) {
                return Err(ReleaseError::ExternalService {
                    service: "jira".to_string(),
                    status: 500,
                    message: "version update failed".to_string(),
                });
            }
            let mut state = self.state.lock().await;
            state
                .version_updates
                .push((id.to_string(), released, description.to_string()));
            Ok(())
        }

        fn browse_url(&self, key: &str) -> String {
            format!("https://jira.test/browse/{}", key)
        }
    }

    fn settings() -> ReconcileSettings {
        ReconcileSettings {
            ticket_project: "REL".to_string(),
            issue_type: "Task".to_string(),
            version_project: "X".to_string(),
            release_state: true,
        }
    }

    fn request(mark_released: bool) -> ReleaseRequest {
        ReleaseRequest {
            summary: "sprint 30".to_string(),
            environment: "staging".to_string(),
            triggered_by: "queca".to_string(),
            mark_released,
            existing_ticket: None,
        }
    }

    fn version(id: &str, name: &str, released: bool) -> VersionRecord {
        VersionRecord {
            id: id.to_string(),
            name: name.to_string(),
            released,
            description: None,
        }
    }

    fn releases() -> ReleaseSet {
        ReleaseSet::from([
            "backend-source-1.0.1".to_string(),
            "frontend-source-2.0.0".to_string(),
        ])
    }

    fn log() -> Vec<String> {
        vec![
            "REL-42 backend-source-1.0.1 shipped".to_string(),
            "REL-43 unrelated-source-0.0.1".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_creates_ticket_and_appends_log_lines() {
        let tickets = MockTickets::default();
        let settings = settings();
        let reconciler = ReleaseReconciler::new(&tickets, &settings).unwrap();

        let report = reconciler
            .reconcile(&request(false), &releases(), &log())
            .await
            .unwrap();

        assert!(report.created);
        assert_eq!(report.ticket.key, "REL-1");
        assert_eq!(report.ticket_url, "https://jira.test/browse/REL-1");
        assert!(report
            .ticket
            .description
            .starts_with("Automatically created by DevOps build team"));
        assert!(report
            .ticket
            .description
            .ends_with("\n\nREL-42 backend-source-1.0.1 shipped\n"));
        assert_eq!(
            report.warnings,
            vec![ReleaseWarning::UnmatchedIdentifier(
                "frontend-source-2.0.0".to_string()
            )]
        );
        assert!(report.versions.is_none());

        let state = tickets.state.lock().await;
        assert_eq!(state.created[0].summary, "Release of sprint 30 on staging");
        assert_eq!(state.issues["REL-1"], report.ticket.description);
    }

    #[tokio::test]
    async fn test_existing_ticket_is_not_duplicated_on_rerun() {
        let tickets = MockTickets::default();
        let settings = settings();
        let reconciler = ReleaseReconciler::new(&tickets, &settings).unwrap();

        let first = reconciler
            .reconcile(&request(false), &releases(), &log())
            .await
            .unwrap();

        let mut rerun = request(false);
        rerun.existing_ticket = Some(first.ticket.key.clone());
        let second = reconciler.reconcile(&rerun, &releases(), &log()).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.ticket.description, first.ticket.description);

        let state = tickets.state.lock().await;
        assert_eq!(state.created.len(), 1);
        assert_eq!(state.description_updates, 1);
    }

    #[tokio::test]
    async fn test_marks_matching_versions_and_warns_for_missing() {
        let tickets = MockTickets::with_versions(vec![
            version("100", "backend-source_1.0.1", false),
            version("101", "backend-source_1.0.0", false),
        ]);
        let settings = settings();
        let reconciler = ReleaseReconciler::new(&tickets, &settings).unwrap();

        let report = reconciler
            .reconcile(&request(true), &releases(), &log())
            .await
            .unwrap();

        let marking = report.versions.unwrap();
        assert_eq!(marking.updated, vec!["backend-source_1.0.1"]);
        assert_eq!(
            marking.warnings,
            vec![ReleaseWarning::UnmappedVersion(
                "frontend-source_2.0.0".to_string()
            )]
        );
        assert_eq!(report.warnings.len(), 2);

        let state = tickets.state.lock().await;
        assert_eq!(state.version_updates.len(), 1);
        assert_eq!(state.version_updates[0].0, "100");
        assert!(state.version_updates[0].1);
        assert!(state.version_updates[0].2.ends_with(":queca"));
    }

    #[tokio::test]
    async fn test_failed_version_update_does_not_block_others() {
        let mut tickets = MockTickets::with_versions(vec![
            version("100", "backend-source_1.0.1", false),
            version("200", "frontend-source_2.0.0", false),
        ]);
        tickets.failing_version_ids = vec!["100".to_string()];
        let settings = settings();
        let reconciler = ReleaseReconciler::new(&tickets, &settings).unwrap();

        let marking = reconciler.mark_versions(&releases(), "queca").await.unwrap();

        assert_eq!(marking.updated, vec!["frontend-source_2.0.0"]);
        assert!(matches!(
            &marking.warnings[..],
            [ReleaseWarning::VersionUpdateFailed { version, .. }] if version == "backend-source_1.0.1"
        ));
    }

    #[tokio::test]
    async fn test_versions_already_in_state_are_skipped() {
        let tickets = MockTickets::with_versions(vec![version(
            "100",
            "backend-source_1.0.1",
            true,
        )]);
        let settings = settings();
        let reconciler = ReleaseReconciler::new(&tickets, &settings).unwrap();

        let release_set = ReleaseSet::from(["backend-source-1.0.1".to_string()]);
        let marking = reconciler.mark_versions(&release_set, "queca").await.unwrap();

        assert!(marking.updated.is_empty());
        assert_eq!(marking.unchanged, vec!["backend-source_1.0.1"]);
        assert!(tickets.state.lock().await.version_updates.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_existing_ticket_fails() {
        let tickets = MockTickets::default();
        let settings = settings();
        let reconciler = ReleaseReconciler::new(&tickets, &settings).unwrap();

        let mut req = request(false);
        req.existing_ticket = Some("REL-999".to_string());
        let err = reconciler.reconcile(&req, &releases(), &log()).await.unwrap_err();

        assert!(matches!(err, ReleaseError::ExternalService { status: 404, .. }));
    }

    #[test]
    fn test_append_log_lines() {
        let lines = vec!["REL-1 a-1.0.0".to_string()];
        assert_eq!(append_log_lines("", &lines), "REL-1 a-1.0.0\n");
        assert_eq!(append_log_lines("created\n", &lines), "created\n\nREL-1 a-1.0.0\n");

        let once = append_log_lines("created\n", &lines);
        assert_eq!(append_log_lines(&once, &lines), once);
        assert_eq!(append_log_lines("created", &[]), "created");
    }

    #[test]
    fn test_append_keeps_existing_description_verbatim() {
        let lines = vec!["REL-1 a-1.0.0".to_string()];
        assert_eq!(append_log_lines("created  \n", &lines), "created  \n\nREL-1 a-1.0.0\n");
        assert_eq!(append_log_lines("created", &lines), "created\n\nREL-1 a-1.0.0\n");
        assert_eq!(
            append_log_lines("created\n\n\n", &lines),
            "created\n\n\n\nREL-1 a-1.0.0\n"
        );
    }
}
