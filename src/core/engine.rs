use crate::core::manifest_diff;
use crate::core::reconciler::{
    ReconcileReport, ReconcileSettings, ReleaseReconciler, ReleaseRequest,
};
use crate::domain::model::{DeploymentManifest, ReleaseSet, ServiceNameMap};
use crate::domain::ports::{LogSource, TicketSystem};
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub release_set: ReleaseSet,
    pub report: ReconcileReport,
}

/// Runs diff, log fetch and reconciliation strictly in that order.
pub struct ReleaseEngine<'a, L: LogSource + ?Sized, T: TicketSystem + ?Sized> {
    log_source: &'a L,
    tickets: &'a T,
    name_map: &'a ServiceNameMap,
    settings: &'a ReconcileSettings,
}

impl<'a, L: LogSource + ?Sized, T: TicketSystem + ?Sized> ReleaseEngine<'a, L, T> {
    pub fn new(
        log_source: &'a L,
        tickets: &'a T,
        name_map: &'a ServiceNameMap,
        settings: &'a ReconcileSettings,
    ) -> Self {
        Self {
            log_source,
            tickets,
            name_map,
            settings,
        }
    }

    pub async fn run(
        &self,
        previous: &DeploymentManifest,
        current: &DeploymentManifest,
        request: &ReleaseRequest,
    ) -> Result<ReleaseOutcome> {
        println!("Comparing deployment manifests...");
        let release_set = manifest_diff::diff(previous, current, self.name_map)?;
        println!("{} service(s) changed version", release_set.len());
        if release_set.is_empty() {
            tracing::warn!("No service changed version between the two manifests");
        }

        // 先取得 release.log，失敗時不會建立任何 ticket
        println!("Fetching release log...");
        let log_lines = self.log_source.fetch_lines().await?;
        println!("Read {} log lines", log_lines.len());

        let reconciler = ReleaseReconciler::new(self.tickets, self.settings)?;
        let report = reconciler
            .reconcile(request, &release_set, &log_lines)
            .await?;

        Ok(ReleaseOutcome {
            release_set,
            report,
        })
    }
}
