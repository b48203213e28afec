//! Inspect the Gantry configuration of a container list.
//!
//! Reads the JSON that Docker returns for `GET /containers/json`, decodes
//! every running, opted-in container and the global settings, and renders a
//! [`Report`]. Invalid containers are logged and reported, never fatal.
//!
//! ```
//! use gantry_config::LabelDecoder;
//! use gantry_inspect::{inspect, parse_instances};
//!
//! let instances = parse_instances(r#"[
//!     {"Id": "web", "Image": "nginx:1.27", "ImageID": "sha256:1", "State": "running",
//!      "Labels": {"gantry.enable": "true", "gantry.update.policy": "digest"}}
//! ]"#).unwrap();
//!
//! let report = inspect(&LabelDecoder::default(), &instances);
//! assert_eq!(report.containers.len(), 1);
//! assert!(!report.has_failures());
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-inspect/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod input;
pub mod report;

use gantry_config::{LabelDecoder, LogFormat, LoggingConfig};
use gantry_core::Instance;
use gantry_telemetry::LogConfig;
use tracing::{error, info, warn};

pub use error::InspectError;
pub use input::{parse_instances, read_instances, InputSource};
pub use report::{ContainerReport, Report, SettingsReport, Status, ViolationReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs both queries over `instances` and builds the report.
///
/// Each invalid container is logged at `warn`, invalid settings at `error`.
pub fn inspect<I: Instance>(decoder: &LabelDecoder, instances: &[I]) -> Report {
    let containers = decoder.decode_instances(instances);
    for err in containers.iter().filter_map(|result| result.as_ref().err()) {
        warn!(
            container = %err.container.id,
            image = %err.container.image.name,
            violations = err.error.violations().len(),
            error = %err.error,
            "skipping container with invalid configuration"
        );
    }

    let settings = decoder.select_settings(instances);
    match &settings {
        Some(Err(err)) => error!(error = %err, "global settings are invalid"),
        Some(Ok(_)) => {}
        None => info!(namespace = %decoder.namespace(), "no container declares global settings"),
    }

    let report = Report::new(&containers, settings.as_ref());
    info!(
        instances = instances.len(),
        tracked = report.containers.len(),
        failures = report.failure_count(),
        "inspection complete"
    );
    report
}

/// Maps the extractor's logging section onto a subscriber configuration.
pub fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        enabled: logging.enabled,
        level: logging.level.to_ascii_lowercase(),
        json_format: logging.format == LogFormat::Json,
        ansi: logging.ansi_enabled,
        ..LogConfig::default()
    }
}
