//! Test fixtures for Gantry development and testing.
//!
//! Pre-built instances covering the cases the decoders distinguish: tracked,
//! untracked, stopped, and settings-carrying containers.
//!
//! # Example
//!
//! ```
//! use gantry_core::fixtures;
//! use gantry_core::Instance;
//!
//! let web = fixtures::tracked_container("web");
//! assert_eq!(web.labels().get("gantry.enable").map(String::as_str), Some("true"));
//! ```

use crate::instance::{InstanceRecord, LifecycleState};

/// A running container opting in with a minimal valid update section.
///
/// Labels: `gantry.enable=true`, `gantry.update.policy=minor`.
#[must_use]
pub fn tracked_container(id: &str) -> InstanceRecord {
    InstanceRecord::new(id, format!("registry.example.com/{id}:1.0.0"))
        .with_image_id(format!("sha256:{id}"))
        .with_labels([
            ("gantry.enable", "true"),
            ("gantry.update.policy", "minor"),
        ])
}

/// A running container that opts in but is missing `update.policy`.
#[must_use]
pub fn misconfigured_container(id: &str) -> InstanceRecord {
    InstanceRecord::new(id, format!("registry.example.com/{id}:1.0.0"))
        .with_image_id(format!("sha256:{id}"))
        .with_label("gantry.enable", "true")
}

/// A running container carrying only unrelated labels.
#[must_use]
pub fn untracked_container(id: &str) -> InstanceRecord {
    InstanceRecord::new(id, format!("docker.io/library/{id}:latest"))
        .with_image_id(format!("sha256:{id}"))
        .with_labels([
            ("com.docker.compose.project", "stack"),
            ("com.docker.compose.service", id),
        ])
}

/// A fully valid, opted-in container that is not running.
#[must_use]
pub fn stopped_container(id: &str) -> InstanceRecord {
    tracked_container(id).with_state(LifecycleState::Exited)
}

/// A running container declaring valid global settings.
///
/// Labels: `gantry.self=true`, `gantry.interval=300`.
#[must_use]
pub fn settings_container(id: &str) -> InstanceRecord {
    InstanceRecord::new(id, "ghcr.io/gantry/gantry:latest")
        .with_image_id(format!("sha256:{id}"))
        .with_labels([("gantry.self", "true"), ("gantry.interval", "300")])
}

/// A running container declaring settings without the required `interval`.
#[must_use]
pub fn broken_settings_container(id: &str) -> InstanceRecord {
    InstanceRecord::new(id, "ghcr.io/gantry/gantry:latest")
        .with_image_id(format!("sha256:{id}"))
        .with_label("gantry.self", "true")
}
