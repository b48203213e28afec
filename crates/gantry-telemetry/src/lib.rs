//! Logging setup shared by Gantry tools.
//!
//! Wraps `tracing-subscriber`: an [`EnvFilter`](tracing_subscriber::EnvFilter)
//! built from the configured level and a single fmt layer writing JSON lines
//! or human-readable output to stderr.
//!
//! ```rust,ignore
//! use gantry_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
