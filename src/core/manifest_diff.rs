use crate::domain::model::{
    DeploymentManifest, ReleaseSet, ServiceChange, ServiceNameMap,
};
use crate::utils::error::{ReleaseError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const RELEASE_SUFFIX: &str = ".RELEASE";

impl DeploymentManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Drops every `.RELEASE` marker from a version string.
pub fn strip_release_suffix(version: &str) -> String {
    version.replace(RELEASE_SUFFIX, "")
}

pub fn release_identifier(source: &str, version: &str) -> String {
    format!("{}-{}", source, strip_release_suffix(version))
}

/// Rewrites the first `-<major.minor.patch>` separator to `_`, the naming used by
/// version records (`backend-source-1.0.1` -> `backend-source_1.0.1`).
pub fn version_record_name(identifier: &str) -> String {
    static SEMVER_SEPARATOR: OnceLock<Regex> = OnceLock::new();
    let re = SEMVER_SEPARATOR
        .get_or_init(|| Regex::new(r"-([0-9]+\.[0-9]+\.[0-9]+)").expect("valid semver regex"));
    re.replacen(identifier, 1, "_$1").into_owned()
}

/// Every (current, previous) pair with the same name and a different version.
///
/// All cross pairs are considered, so a name listed twice on either side can
/// yield several changes.
pub fn changed_services(
    previous: &DeploymentManifest,
    current: &DeploymentManifest,
) -> Vec<ServiceChange> {
    let mut changes = Vec::new();

    for c in &current.deployment {
        for p in &previous.deployment {
            if c.name == p.name && c.version != p.version {
                changes.push(ServiceChange {
                    name: c.name.clone(),
                    previous_version: p.version.clone(),
                    current_version: c.version.clone(),
                });
            }
        }
    }

    changes
}

pub fn diff(
    previous: &DeploymentManifest,
    current: &DeploymentManifest,
    name_map: &ServiceNameMap,
) -> Result<ReleaseSet> {
    ensure_mapped(current, name_map)?;

    let mut releases = ReleaseSet::new();
    for change in changed_services(previous, current) {
        tracing::info!(
            " {} {} -->  {}",
            change.name,
            change.previous_version,
            change.current_version
        );
        let source = name_map
            .get(&change.name)
            .ok_or_else(|| ReleaseError::UnmappedService {
                service: change.name.clone(),
            })?;
        releases.insert(release_identifier(source, &change.current_version));
    }

    tracing::debug!("Release set: {:?}", releases);
    Ok(releases)
}

/// Every service of the current manifest must have a source repository.
fn ensure_mapped(current: &DeploymentManifest, name_map: &ServiceNameMap) -> Result<()> {
    match current
        .deployment
        .iter()
        .find(|service| !name_map.contains_key(&service.name))
    {
        Some(service) => Err(ReleaseError::UnmappedService {
            service: service.name.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ServiceDeployment;

    fn manifest(entries: &[(&str, &str)]) -> DeploymentManifest {
        DeploymentManifest {
            deployment: entries
                .iter()
                .map(|(name, version)| ServiceDeployment {
                    name: name.to_string(),
                    version: version.to_string(),
                })
                .collect(),
        }
    }

    fn name_map() -> ServiceNameMap {
        ServiceNameMap::from([
            ("backend-srv".to_string(), "backend-source".to_string()),
            ("frontend-srv".to_string(), "frontend-source".to_string()),
        ])
    }

    #[test]
    fn test_diff_strips_release_suffix() {
        let previous = manifest(&[("backend-srv", "1.0.0")]);
        let current = manifest(&[("backend-srv", "1.0.1.RELEASE")]);

        let releases = diff(&previous, &current, &name_map()).unwrap();

        assert_eq!(releases, ReleaseSet::from(["backend-source-1.0.1".to_string()]));
    }

    #[test]
    fn test_unchanged_and_one_sided_services_are_excluded() {
        let previous = manifest(&[("backend-srv", "1.0.0"), ("frontend-srv", "2.0.0")]);
        let current = manifest(&[
            ("backend-srv", "1.0.0"),
            ("frontend-srv", "2.1.0"),
        ]);
        let releases = diff(&previous, &current, &name_map()).unwrap();
        assert_eq!(releases, ReleaseSet::from(["frontend-source-2.1.0".to_string()]));

        // 只出現在 current 的服務不算變更
        let previous = manifest(&[("frontend-srv", "2.0.0")]);
        let current = manifest(&[("backend-srv", "9.9.9")]);
        assert!(diff(&previous, &current, &name_map()).unwrap().is_empty());
    }

    #[test]
    fn test_order_does_not_change_the_result() {
        let previous = manifest(&[("backend-srv", "1.0.0"), ("frontend-srv", "2.0.0")]);
        let current = manifest(&[("backend-srv", "1.1.0"), ("frontend-srv", "2.1.0")]);
        let reversed_previous = manifest(&[("frontend-srv", "2.0.0"), ("backend-srv", "1.0.0")]);
        let reversed_current = manifest(&[("frontend-srv", "2.1.0"), ("backend-srv", "1.1.0")]);

        assert_eq!(
            diff(&previous, &current, &name_map()).unwrap(),
            diff(&reversed_previous, &reversed_current, &name_map()).unwrap()
        );
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let previous = manifest(&[("backend-srv", "1.0.0"), ("backend-srv", "1.0.0")]);
        let current = manifest(&[("backend-srv", "1.0.1.RELEASE"), ("backend-srv", "1.0.1")]);

        assert_eq!(changed_services(&previous, &current).len(), 4);
        let releases = diff(&previous, &current, &name_map()).unwrap();
        assert_eq!(releases.len(), 1);
    }

    #[test]
    fn test_unmapped_service_fails() {
        let previous = manifest(&[("payments-srv", "1.0.0")]);
        let current = manifest(&[("payments-srv", "1.0.1")]);

        let err = diff(&previous, &current, &name_map()).unwrap_err();
        assert!(matches!(err, ReleaseError::UnmappedService { service } if service == "payments-srv"));
    }

    #[test]
    fn test_unchanged_service_missing_from_map_fails() {
        let previous = manifest(&[("backend-srv", "1.0.0"), ("payments-srv", "3.0.0")]);
        let current = manifest(&[("backend-srv", "1.0.1"), ("payments-srv", "3.0.0")]);

        let err = diff(&previous, &current, &name_map()).unwrap_err();
        assert!(matches!(err, ReleaseError::UnmappedService { service } if service == "payments-srv"));
    }

    #[test]
    fn test_strip_release_suffix_is_idempotent() {
        for version in ["1.0.1.RELEASE", "1.0.1", "2.0.RELEASE.RELEASE", ""] {
            let once = strip_release_suffix(version);
            assert_eq!(strip_release_suffix(&once), once);
        }
        assert_eq!(strip_release_suffix("1.0.1.RELEASE"), "1.0.1");
    }

    #[test]
    fn test_version_record_name() {
        let once = version_record_name("backend-source-1.0.1");
        assert_eq!(once, "backend-source_1.0.1");
        assert_eq!(version_record_name(&once), once);
        assert_eq!(version_record_name("frontend-source-10.2.33"), "frontend-source_10.2.33");
    }

    #[test]
    fn test_manifest_from_json() {
        let manifest = DeploymentManifest::from_json_str(
            r#"{"deployment": [{"name": "backend-srv", "version": "1.0.1.RELEASE", "replicas": 2}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.deployment.len(), 1);
        assert_eq!(manifest.deployment[0].version, "1.0.1.RELEASE");

        assert!(matches!(
            DeploymentManifest::from_json_str(r#"{"services": []}"#),
            Err(ReleaseError::Serialization(_))
        ));
    }
}
