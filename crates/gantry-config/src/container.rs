//! Per-container update configuration.
//!
//! Read from the namespace section of a container that carries
//! `gantry.enable=true`:
//!
//! ```text
//! gantry.enable=true
//! gantry.update.policy=minor
//! gantry.update.interval=6h
//! gantry.update.rollback=false
//! gantry.hooks.pre=/usr/local/bin/drain
//! gantry.hooks.post=/usr/local/bin/warmup
//! gantry.notify.url=https://hooks.example.com/gantry
//! gantry.notify.on=failure
//! ```

use std::time::Duration;

use gantry_core::{labels_from_tree, ConfigNode, ConfigTree, LabelMap, Namespace, ENABLE_FLAG, FLAG_ON, SELF_FLAG};
use serde::Serialize;

use crate::schema::{decode_choice, DecodeContext, FromTree, ObjectDecoder, Record};
use crate::settings;

/// Top-level keys of the container section.
pub const FIELDS: &[&str] = &[ENABLE_FLAG, "update", "hooks", "notify"];

/// Which new image versions a container is moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Same tag, new digest.
    Digest,
    /// Newer patch release of the running semver tag.
    Patch,
    /// Newer minor or patch release.
    Minor,
    /// Any newer release.
    Major,
}

impl UpdatePolicy {
    const CHOICES: [(&'static str, Self); 4] = [
        ("digest", Self::Digest),
        ("patch", Self::Patch),
        ("minor", Self::Minor),
        ("major", Self::Major),
    ];

    /// Label spelling of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Digest => "digest",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl FromTree for UpdatePolicy {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        decode_choice(node, ctx, &Self::CHOICES)
    }
}

/// When a notification is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOn {
    /// After every check.
    Always,
    /// After an update was applied.
    #[default]
    Update,
    /// After an update failed or was rolled back.
    Failure,
}

impl NotifyOn {
    const CHOICES: [(&'static str, Self); 3] = [
        ("always", Self::Always),
        ("update", Self::Update),
        ("failure", Self::Failure),
    ];

    /// Label spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Update => "update",
            Self::Failure => "failure",
        }
    }
}

impl FromTree for NotifyOn {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        decode_choice(node, ctx, &Self::CHOICES)
    }
}

/// `update.*` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateConfig {
    /// Version policy. Required.
    pub policy: UpdatePolicy,
    /// Per-container check interval, overriding the global one.
    #[serde(serialize_with = "serialize_secs")]
    pub interval: Option<Duration>,
    /// Roll back to the previous image if the new one fails to start.
    pub rollback: bool,
}

impl Record for UpdateConfig {
    fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
        let policy = object.required("policy");
        let interval = object.optional("interval");
        let rollback = object.optional_or("rollback", true);
        Some(Self {
            policy: policy?,
            interval: interval?,
            rollback: rollback?,
        })
    }
}

impl UpdateConfig {
    /// Creates an update section with the given policy and defaults.
    pub fn new(policy: UpdatePolicy) -> Self {
        Self {
            policy,
            interval: None,
            rollback: true,
        }
    }

    fn to_tree(&self) -> ConfigTree {
        let mut tree = ConfigTree::new().with("policy", self.policy.as_str());
        if let Some(interval) = self.interval {
            tree.set("interval", interval.as_secs().to_string());
        }
        tree.with("rollback", self.rollback.to_string())
    }
}

/// `hooks.*` section: commands run around an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookConfig {
    /// Run before the container is replaced.
    pub pre: Option<String>,
    /// Run after the replacement is up.
    pub post: Option<String>,
}

impl Record for HookConfig {
    fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
        let pre = object.optional("pre");
        let post = object.optional("post");
        Some(Self {
            pre: pre?,
            post: post?,
        })
    }
}

impl HookConfig {
    fn to_tree(&self) -> ConfigTree {
        let mut tree = ConfigTree::new();
        if let Some(pre) = &self.pre {
            tree.set("pre", pre.as_str());
        }
        if let Some(post) = &self.post {
            tree.set("post", post.as_str());
        }
        tree
    }
}

/// `notify.*` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyConfig {
    /// Webhook receiving the notification. Required when the section exists.
    pub url: String,
    /// When to notify.
    pub on: NotifyOn,
}

impl Record for NotifyConfig {
    fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
        let url = object.required("url");
        let on = object.optional_or("on", NotifyOn::default());
        Some(Self {
            url: url?,
            on: on?,
        })
    }
}

impl NotifyConfig {
    fn to_tree(&self) -> ConfigTree {
        ConfigTree::new()
            .with("url", self.url.as_str())
            .with("on", self.on.as_str())
    }
}

/// Validated configuration of one tracked container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerConfig {
    /// Update behaviour.
    pub update: UpdateConfig,
    /// Optional update hooks.
    pub hooks: Option<HookConfig>,
    /// Optional notification target.
    pub notify: Option<NotifyConfig>,
}

impl Record for ContainerConfig {
    fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
        let enable = object.literal(ENABLE_FLAG, FLAG_ON);
        object.tolerate_role(SELF_FLAG, settings::FIELDS);
        let update = object.required("update");
        let hooks = object.optional("hooks");
        let notify = object.optional("notify");
        enable?;
        Some(Self {
            update: update?,
            hooks: hooks?,
            notify: notify?,
        })
    }
}

impl ContainerConfig {
    /// Creates a config with only an update policy.
    pub fn new(policy: UpdatePolicy) -> Self {
        Self {
            update: UpdateConfig::new(policy),
            hooks: None,
            notify: None,
        }
    }

    /// Renders the namespace section, `enable` flag included.
    pub fn to_tree(&self) -> ConfigTree {
        let mut tree = ConfigTree::new()
            .with(ENABLE_FLAG, FLAG_ON)
            .with("update", self.update.to_tree());
        if let Some(hooks) = &self.hooks {
            tree.set("hooks", hooks.to_tree());
        }
        if let Some(notify) = &self.notify {
            tree.set("notify", notify.to_tree());
        }
        tree
    }

    /// Renders the labels that decode back into this config.
    pub fn to_labels(&self, namespace: &Namespace) -> LabelMap {
        labels_from_tree(namespace, &self.to_tree())
    }
}

fn serialize_secs<S: serde::Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(duration) => serializer.serialize_some(&duration.as_secs()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::schema::decode_section;
    use gantry_core::tree_from_labels;

    fn decode(labels: &[(&str, &str)]) -> Result<ContainerConfig, crate::DecodeError> {
        let ns = Namespace::default();
        let tree = tree_from_labels(&ns, labels.iter().copied());
        let section = tree
            .get("gantry")
            .and_then(ConfigNode::as_tree)
            .cloned()
            .unwrap_or_default();
        decode_section(&ns, &section)
    }

    #[test]
    fn test_minimal_config() {
        let config = decode(&[("gantry.enable", "true"), ("gantry.update.policy", "digest")]).unwrap();
        assert_eq!(config, ContainerConfig::new(UpdatePolicy::Digest));
        assert!(config.update.rollback);
    }

    #[test]
    fn test_full_config() {
        let config = decode(&[
            ("gantry.enable", "true"),
            ("gantry.update.policy", "minor"),
            ("gantry.update.interval", "6h"),
            ("gantry.update.rollback", "false"),
            ("gantry.hooks.pre", "/usr/local/bin/drain"),
            ("gantry.notify.url", "https://hooks.example.com/gantry"),
            ("gantry.notify.on", "failure"),
        ])
        .unwrap();

        assert_eq!(config.update.policy, UpdatePolicy::Minor);
        assert_eq!(config.update.interval, Some(Duration::from_secs(6 * 3600)));
        assert!(!config.update.rollback);
        assert_eq!(
            config.hooks,
            Some(HookConfig {
                pre: Some("/usr/local/bin/drain".to_string()),
                post: None,
            })
        );
        assert_eq!(config.notify.as_ref().map(|n| n.on), Some(NotifyOn::Failure));
    }

    #[test]
    fn test_missing_update_section() {
        let err = decode(&[("gantry.enable", "true")]).unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), ["gantry.update"]);
        assert_eq!(err.violations()[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_missing_policy_inside_update() {
        let err = decode(&[("gantry.enable", "true"), ("gantry.update.interval", "60")]).unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), ["gantry.update.policy"]);
    }

    #[test]
    fn test_notify_without_url() {
        let err = decode(&[
            ("gantry.enable", "true"),
            ("gantry.update.policy", "patch"),
            ("gantry.notify.on", "always"),
        ])
        .unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), ["gantry.notify.url"]);
    }

    #[test]
    fn test_multiple_violations_reported_together() {
        let err = decode(&[
            ("gantry.enable", "true"),
            ("gantry.update.policy", "weekly"),
            ("gantry.update.interval", "soon"),
            ("gantry.update.rollback", "yes"),
            ("gantry.hooks", "echo"),
            ("gantry.notify.on", "never"),
            ("gantry.unknown", "1"),
        ])
        .unwrap_err();

        assert_eq!(
            err.paths().collect::<Vec<_>>(),
            [
                "gantry.update.policy",
                "gantry.update.interval",
                "gantry.update.rollback",
                "gantry.hooks",
                "gantry.notify.url",
                "gantry.notify.on",
                "gantry.unknown",
            ]
        );
    }

    #[test]
    fn test_settings_keys_are_tolerated() {
        let config = decode(&[
            ("gantry.enable", "true"),
            ("gantry.self", "true"),
            ("gantry.interval", "300"),
            ("gantry.update.policy", "major"),
        ])
        .unwrap();
        assert_eq!(config.update.policy, UpdatePolicy::Major);
    }

    #[test]
    fn test_settings_keys_rejected_without_self_flag() {
        let err = decode(&[
            ("gantry.enable", "true"),
            ("gantry.update.policy", "minor"),
            ("gantry.interval", "garbage"),
            ("gantry.log.level", "loud"),
        ])
        .unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), ["gantry.interval", "gantry.log"]);
        assert_eq!(err.at("gantry.interval").unwrap().kind, ViolationKind::Unexpected);

        let err = decode(&[
            ("gantry.enable", "true"),
            ("gantry.self", "false"),
            ("gantry.update.policy", "minor"),
            ("gantry.cleanup", "true"),
        ])
        .unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), ["gantry.cleanup"]);
    }

    #[test]
    fn test_to_labels_decodes_back() {
        let config = ContainerConfig {
            update: UpdateConfig {
                policy: UpdatePolicy::Patch,
                interval: Some(Duration::from_secs(90)),
                rollback: false,
            },
            hooks: Some(HookConfig {
                pre: None,
                post: Some("curl -fsS http://localhost/health".to_string()),
            }),
            notify: Some(NotifyConfig {
                url: "https://hooks.example.com".to_string(),
                on: NotifyOn::Always,
            }),
        };

        let labels = config.to_labels(&Namespace::default());
        assert_eq!(labels.get("gantry.enable").map(String::as_str), Some("true"));
        assert_eq!(labels.get("gantry.update.interval").map(String::as_str), Some("90"));

        let pairs: Vec<(&str, &str)> = labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(decode(&pairs).unwrap(), config);
    }

    #[test]
    fn test_serialize_interval_as_seconds() {
        let mut config = ContainerConfig::new(UpdatePolicy::Minor);
        config.update.interval = Some(Duration::from_secs(300));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["update"]["interval"], 300);
        assert_eq!(json["update"]["policy"], "minor");
    }
}
