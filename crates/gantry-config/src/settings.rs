//! Global settings, declared on the updater's own container.
//!
//! ```text
//! gantry.self=true
//! gantry.interval=5m
//! gantry.cleanup=true
//! gantry.concurrency=4
//! gantry.log.level=debug
//! gantry.log.format=pretty
//! ```

use std::num::NonZeroU32;
use std::time::Duration;

use gantry_core::{labels_from_tree, ConfigNode, ConfigTree, LabelMap, Namespace, ENABLE_FLAG, FLAG_ON, SELF_FLAG};
use serde::Serialize;

use crate::config::LogFormat;
use crate::container;
use crate::schema::{decode_choice, DecodeContext, FromTree, ObjectDecoder, Record};

/// Top-level keys of the settings section.
pub const FIELDS: &[&str] = &[SELF_FLAG, "interval", "cleanup", "concurrency", "log"];

/// Log verbosity requested by the settings container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name, as accepted by an env filter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromTree for LogLevel {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        decode_choice(
            node,
            ctx,
            &[
                ("trace", Self::Trace),
                ("debug", Self::Debug),
                ("info", Self::Info),
                ("warn", Self::Warn),
                ("error", Self::Error),
            ],
        )
    }
}

impl FromTree for LogFormat {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        decode_choice(node, ctx, &[("json", Self::Json), ("pretty", Self::Pretty)])
    }
}

/// `log.*` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogSettings {
    /// Overrides the configured level.
    pub level: Option<LogLevel>,
    /// Overrides the configured format.
    pub format: Option<LogFormat>,
}

impl Record for LogSettings {
    fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
        let level = object.optional("level");
        let format = object.optional("format");
        Some(Self {
            level: level?,
            format: format?,
        })
    }
}

/// Validated global settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GantrySettings {
    /// Time between update checks.
    #[serde(serialize_with = "serialize_secs")]
    pub interval: Duration,
    /// Remove superseded images after an update.
    pub cleanup: bool,
    /// Containers updated in parallel.
    pub concurrency: NonZeroU32,
    /// Logging overrides.
    pub log: Option<LogSettings>,
}

impl Record for GantrySettings {
    fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
        let flag = object.literal(SELF_FLAG, FLAG_ON);
        object.tolerate_role(ENABLE_FLAG, container::FIELDS);
        let interval = object.required("interval");
        let cleanup = object.optional_or("cleanup", false);
        let concurrency = object.optional_or("concurrency", NonZeroU32::MIN);
        let log = object.optional("log");
        flag?;
        Some(Self {
            interval: interval?,
            cleanup: cleanup?,
            concurrency: concurrency?,
            log: log?,
        })
    }
}

impl GantrySettings {
    /// Settings with the given interval and every default.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cleanup: false,
            concurrency: NonZeroU32::MIN,
            log: None,
        }
    }

    /// Renders the namespace section, `self` flag included.
    pub fn to_tree(&self) -> ConfigTree {
        let mut tree = ConfigTree::new()
            .with(SELF_FLAG, FLAG_ON)
            .with("interval", self.interval.as_secs().to_string())
            .with("cleanup", self.cleanup.to_string())
            .with("concurrency", self.concurrency.to_string());
        if let Some(log) = &self.log {
            let mut section = ConfigTree::new();
            if let Some(level) = log.level {
                section.set("level", level.as_str());
            }
            if let Some(format) = log.format {
                section.set("format", format.as_str());
            }
            tree.set("log", section);
        }
        tree
    }

    /// Renders the labels that decode back into these settings.
    pub fn to_labels(&self, namespace: &Namespace) -> LabelMap {
        labels_from_tree(namespace, &self.to_tree())
    }
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}
