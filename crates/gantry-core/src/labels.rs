//! Label filtering and tree extraction.
//!
//! Only labels whose key starts with `<namespace>.` belong to Gantry. The
//! full key, namespace included, becomes the tree path, so every extracted
//! tree has at most one root key: the namespace itself.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::NamespaceError;
use crate::tree::{build_tree, ConfigNode, ConfigTree, PathEntry, SEPARATOR};

/// Label map attached to an instance, in the order the runtime reported it.
pub type LabelMap = IndexMap<String, String>;

/// Namespace token used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "gantry";

/// Flag marking an instance whose own configuration Gantry should track.
pub const ENABLE_FLAG: &str = "enable";

/// Flag marking the instance that carries Gantry's global settings.
pub const SELF_FLAG: &str = "self";

/// The only value that turns a flag on. Compared byte for byte.
pub const FLAG_ON: &str = "true";

/// Reserved leading segment identifying Gantry labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Validates and wraps a namespace token.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError`] if the token is empty, contains the path
    /// separator, or contains whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self, NamespaceError> {
        let token = token.into();
        if token.is_empty() {
            return Err(NamespaceError::Empty);
        }
        if token.contains(SEPARATOR) {
            return Err(NamespaceError::ContainsSeparator(token));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(NamespaceError::ContainsWhitespace(token));
        }
        Ok(Self(token))
    }

    /// The bare token, e.g. `gantry`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key prefix, e.g. `gantry.`.
    pub fn prefix(&self) -> String {
        format!("{}{SEPARATOR}", self.0)
    }

    /// Whether a label key falls under this namespace.
    pub fn owns(&self, key: &str) -> bool {
        key.strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    /// Dotted key for a field inside the namespace, e.g. `gantry.enable`.
    pub fn key(&self, field: &str) -> String {
        format!("{}{SEPARATOR}{field}", self.0)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = NamespaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(namespace: Namespace) -> Self {
        namespace.0
    }
}

/// Selects the labels owned by `namespace` and splits them into path entries.
///
/// Input order is preserved; unrelated labels are dropped.
pub fn path_entries<I, K, V>(namespace: &Namespace, labels: I) -> Vec<PathEntry>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    labels
        .into_iter()
        .filter(|(key, _)| namespace.owns(key.as_ref()))
        .map(|(key, value)| PathEntry::parse(key.as_ref(), value.as_ref()))
        .collect()
}

/// Builds a fresh [`ConfigTree`] from the labels owned by `namespace`.
pub fn tree_from_labels<I, K, V>(namespace: &Namespace, labels: I) -> ConfigTree
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_tree(path_entries(namespace, labels))
}

/// Renders a namespace sub-tree back into labels, prefixing every key.
pub fn labels_from_tree(namespace: &Namespace, tree: &ConfigTree) -> LabelMap {
    ConfigTree::new()
        .with(namespace.as_str(), ConfigNode::Tree(tree.clone()))
        .flatten()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> LabelMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_default_namespace() {
        let ns = Namespace::default();
        assert_eq!(ns.as_str(), "gantry");
        assert_eq!(ns.prefix(), "gantry.");
        assert_eq!(ns.key(ENABLE_FLAG), "gantry.enable");
    }

    #[test]
    fn test_namespace_validation() {
        assert!(matches!(Namespace::new(""), Err(NamespaceError::Empty)));
        assert!(matches!(
            Namespace::new("a.b"),
            Err(NamespaceError::ContainsSeparator(_))
        ));
        assert!(matches!(
            Namespace::new("a b"),
            Err(NamespaceError::ContainsWhitespace(_))
        ));
        assert_eq!("watchtower".parse::<Namespace>().unwrap().as_str(), "watchtower");
    }

    #[test]
    fn test_owns_requires_separator() {
        let ns = Namespace::default();
        assert!(ns.owns("gantry.enable"));
        assert!(ns.owns("gantry."));
        assert!(!ns.owns("gantry"));
        assert!(!ns.owns("gantryx.enable"));
        assert!(!ns.owns("com.docker.compose.project"));
        assert!(!ns.owns("x.gantry.enable"));
    }

    #[test]
    fn test_unrelated_labels_are_dropped() {
        let tree = tree_from_labels(
            &Namespace::default(),
            &labels(&[
                ("com.docker.compose.service", "web"),
                ("gantry.enable", "true"),
                ("maintainer", "ops"),
            ]),
        );
        assert_eq!(tree.to_json(), json!({ "gantry": { "enable": "true" } }));
    }

    #[test]
    fn test_no_owned_labels_yields_empty_tree() {
        let tree = tree_from_labels(
            &Namespace::default(),
            &labels(&[("org.opencontainers.image.title", "app")]),
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn test_prefix_is_kept_in_path() {
        let entries = path_entries(&Namespace::default(), [("gantry.update.policy", "minor")]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].segments(), ["gantry", "update", "policy"]);
    }

    #[test]
    fn test_label_order_drives_precedence() {
        let ns = Namespace::default();
        let deeper_last = tree_from_labels(&ns, [("gantry.a", "1"), ("gantry.a.b", "2")]);
        let deeper_first = tree_from_labels(&ns, [("gantry.a.b", "2"), ("gantry.a", "1")]);

        assert_eq!(deeper_last.to_json(), json!({ "gantry": { "a": { "b": "2" } } }));
        assert_eq!(deeper_first.to_json(), json!({ "gantry": { "a": "1" } }));
    }

    #[test]
    fn test_custom_namespace() {
        let ns = Namespace::new("acme").unwrap();
        let tree = tree_from_labels(&ns, [("acme.enable", "true"), ("gantry.enable", "true")]);
        assert_eq!(tree.to_json(), json!({ "acme": { "enable": "true" } }));
    }

    #[test]
    fn test_labels_from_tree() {
        let ns = Namespace::default();
        let sub = ConfigTree::new()
            .with("enable", "true")
            .with("update", ConfigTree::new().with("policy", "patch"));

        let rendered = labels_from_tree(&ns, &sub);
        assert_eq!(rendered.get("gantry.enable").map(String::as_str), Some("true"));
        assert_eq!(
            rendered.get("gantry.update.policy").map(String::as_str),
            Some("patch")
        );

        let rebuilt = tree_from_labels(&ns, &rendered);
        assert_eq!(rebuilt.get("gantry"), Some(&ConfigNode::Tree(sub)));
    }

    #[test]
    fn test_namespace_serde() {
        let ns: Namespace = serde_json::from_value(json!("acme")).unwrap();
        assert_eq!(ns.as_str(), "acme");
        assert!(serde_json::from_value::<Namespace>(json!("a.b")).is_err());
        assert_eq!(serde_json::to_value(&ns).unwrap(), json!("acme"));
    }
}
