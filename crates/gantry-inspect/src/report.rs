//! The inspection report.
//!
//! ```json
//! {
//!   "containers": [
//!     {"id": "8dfafdbc3a40", "image": "nginx:1.27", "status": "ok",
//!      "config": {"update": {"policy": "minor", "interval": null, "rollback": true}, "hooks": null, "notify": null}},
//!     {"id": "5e2b0c9a1f77", "image": "example/api:2", "status": "invalid",
//!      "violations": [{"path": "gantry.update.policy", "message": "required field is missing"}]}
//!   ],
//!   "settings": {"status": "ok", "settings": {"interval": 300, "cleanup": false, "concurrency": 1, "log": null}}
//! }
//! ```

use gantry_config::{ContainerConfig, DecodeError, GantryContainer, GantrySettings, InstanceDecodeError, Violation};
use serde::Serialize;

/// Whether an entry decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Labels are valid.
    Ok,
    /// Labels failed validation.
    Invalid,
}

/// One violated path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationReport {
    /// Dotted path.
    pub path: String,
    /// What is wrong there.
    pub message: String,
}

impl From<&Violation> for ViolationReport {
    fn from(violation: &Violation) -> Self {
        Self {
            path: violation.path.clone(),
            message: violation.kind.to_string(),
        }
    }
}

fn violations(error: &DecodeError) -> Vec<ViolationReport> {
    error.violations().iter().map(ViolationReport::from).collect()
}

/// Report entry for one tracked container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerReport {
    /// Container id.
    pub id: String,
    /// Image name.
    pub image: String,
    /// Outcome.
    pub status: Status,
    /// Present when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<ViolationReport>>,
    /// Present when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ContainerConfig>,
}

impl From<&Result<GantryContainer, InstanceDecodeError>> for ContainerReport {
    fn from(result: &Result<GantryContainer, InstanceDecodeError>) -> Self {
        match result {
            Ok(container) => Self {
                id: container.container.id.clone(),
                image: container.container.image.name.clone(),
                status: Status::Ok,
                violations: None,
                config: Some(container.config.clone()),
            },
            Err(err) => Self {
                id: err.container.id.clone(),
                image: err.container.image.name.clone(),
                status: Status::Invalid,
                violations: Some(violations(&err.error)),
                config: None,
            },
        }
    }
}

/// Report entry for the global settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsReport {
    /// Outcome.
    pub status: Status,
    /// Present when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<ViolationReport>>,
    /// Present when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<GantrySettings>,
}

impl From<&Result<GantrySettings, DecodeError>> for SettingsReport {
    fn from(result: &Result<GantrySettings, DecodeError>) -> Self {
        match result {
            Ok(settings) => Self {
                status: Status::Ok,
                violations: None,
                settings: Some(settings.clone()),
            },
            Err(err) => Self {
                status: Status::Invalid,
                violations: Some(violations(err)),
                settings: None,
            },
        }
    }
}

/// Full report: tracked containers in input order, then settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// One entry per running, opted-in container.
    pub containers: Vec<ContainerReport>,
    /// `null` when no running container declares settings.
    pub settings: Option<SettingsReport>,
}

impl Report {
    /// Builds the report from both query results.
    pub fn new(
        containers: &[Result<GantryContainer, InstanceDecodeError>],
        settings: Option<&Result<GantrySettings, DecodeError>>,
    ) -> Self {
        Self {
            containers: containers.iter().map(ContainerReport::from).collect(),
            settings: settings.map(SettingsReport::from),
        }
    }

    /// Number of invalid entries, settings included.
    pub fn failure_count(&self) -> usize {
        let containers = self
            .containers
            .iter()
            .filter(|c| c.status == Status::Invalid)
            .count();
        let settings = self
            .settings
            .as_ref()
            .map_or(0, |s| usize::from(s.status == Status::Invalid));
        containers + settings
    }

    /// Whether anything failed validation.
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Renders the report as JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; with these types it does not occur.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_config::{decode_instances, select_settings};
    use gantry_core::fixtures;
    use serde_json::json;

    #[test]
    fn test_report_for_valid_and_invalid() {
        let instances = [
            fixtures::tracked_container("web"),
            fixtures::misconfigured_container("api"),
        ];
        let results = decode_instances(&instances);
        let report = Report::new(&results, None);

        assert_eq!(report.containers.len(), 2);
        assert_eq!(report.containers[0].status, Status::Ok);
        assert_eq!(report.containers[1].status, Status::Invalid);
        assert_eq!(report.failure_count(), 1);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["containers"][0]["config"]["update"]["policy"], "minor");
        assert!(value["containers"][0].get("violations").is_none());
        assert_eq!(
            value["containers"][1]["violations"],
            json!([{"path": "gantry.update", "message": "required field is missing"}])
        );
        assert!(value["containers"][1].get("config").is_none());
        assert!(value["settings"].is_null());
    }

    #[test]
    fn test_settings_failure_counts() {
        let instances = [fixtures::broken_settings_container("gantry")];
        let settings = select_settings(&instances);
        let report = Report::new(&[], settings.as_ref());

        assert!(report.has_failures());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["settings"]["status"], "invalid");
        assert_eq!(value["settings"]["violations"][0]["path"], "gantry.interval");
    }

    #[test]
    fn test_clean_report() {
        let instances = [fixtures::settings_container("gantry")];
        let settings = select_settings(&instances);
        let report = Report::new(&[], settings.as_ref());

        assert!(!report.has_failures());
        let json = report.to_json(false).unwrap();
        assert!(json.contains(r#""settings":{"status":"ok""#));
        assert!(report.to_json(true).unwrap().contains('\n'));
    }
}
