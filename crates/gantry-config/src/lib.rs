//! Schema-driven decoding of Gantry configuration from container labels.
//!
//! Containers opt in to update tracking with `gantry.enable=true` and describe
//! how they are updated with further `gantry.*` labels. The updater's own
//! container carries `gantry.self=true` and the global settings. This crate
//! turns those label maps into validated, typed records:
//!
//! - [`decode_instances`] - one result per running, opted-in container
//! - [`select_settings`] - the global settings, if any container declares them
//!
//! Decoding is split into an open-record opt-in check ([`schema::OptInGate`])
//! and a closed-record schema decode ([`schema::Record`]). A container that did
//! not opt in is skipped. A container that opted in with bad labels produces a
//! [`DecodeError`] listing every violated path, not just the first.
//!
//! # Example
//!
//! ```
//! use gantry_config::{decode_instances, select_settings, UpdatePolicy};
//! use gantry_core::InstanceRecord;
//!
//! let instances = vec![
//!     InstanceRecord::new("web", "nginx:1.27")
//!         .with_label("gantry.enable", "true")
//!         .with_label("gantry.update.policy", "patch"),
//!     InstanceRecord::new("api", "example/api:2.3")
//!         .with_label("gantry.enable", "true")
//!         .with_label("gantry.update.policy", "sometimes"),
//!     InstanceRecord::new("db", "postgres:16").with_label("gantry.enable", "false"),
//! ];
//!
//! let results = decode_instances(&instances);
//! assert_eq!(results.len(), 2);
//! assert_eq!(results[0].as_ref().unwrap().config.update.policy, UpdatePolicy::Patch);
//! assert_eq!(
//!     results[1].as_ref().unwrap_err().error.paths().collect::<Vec<_>>(),
//!     ["gantry.update.policy"],
//! );
//!
//! assert!(select_settings(&instances).is_none());
//! ```
//!
//! # Extractor configuration
//!
//! The namespace and the logging of the surrounding tooling come from an
//! [`ExtractorConfig`], loaded in layers by [`ConfigLoader`]:
//!
//! ```toml
//! [labels]
//! namespace = "gantry"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ansi_enabled = false
//! ```
//!
//! Every value can be overridden with `GANTRY__SECTION__KEY`, e.g.
//! `GANTRY__LABELS__NAMESPACE=watchtower`.

#![doc(html_root_url = "https://docs.rs/gantry-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
pub mod container;
mod decoder;
mod error;
mod loader;
pub mod schema;
pub mod settings;

pub use config::{ExtractorConfig, LabelSettings, LogFormat, LoggingConfig};
pub use container::{ContainerConfig, HookConfig, NotifyConfig, NotifyOn, UpdateConfig, UpdatePolicy};
pub use decoder::{
    decode_instances, select_settings, DecodeOutcome, GantryContainer, InstanceDecodeError, LabelDecoder,
};
pub use error::{ConfigError, DecodeError, Violation, ViolationKind};
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use settings::{GantrySettings, LogLevel, LogSettings};
