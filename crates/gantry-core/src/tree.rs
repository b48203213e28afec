//! Config trees rebuilt from dotted key paths.
//!
//! A [`ConfigTree`] is an untyped, insertion-ordered nested mapping whose
//! leaves are strings. Trees are produced by folding [`PathEntry`] values
//! into an empty tree with [`build_tree`].
//!
//! # Precedence
//!
//! Entries are applied strictly in input order:
//!
//! - Two entries with the same full path: the later value wins.
//! - A later entry that must descend through a scalar left by an earlier
//!   entry replaces that scalar with a fresh sub-tree.
//! - A later entry that terminates on a node holding a sub-tree replaces the
//!   whole sub-tree with its scalar.
//!
//! ```
//! use gantry_core::tree::{build_tree, PathEntry};
//!
//! let deeper_wins = build_tree([
//!     PathEntry::parse("a.b", "1"),
//!     PathEntry::parse("a.b.c", "2"),
//! ]);
//! assert_eq!(deeper_wins.get_path("a.b.c").and_then(|n| n.as_value()), Some("2"));
//!
//! let shallower_wins = build_tree([
//!     PathEntry::parse("a.b.c", "2"),
//!     PathEntry::parse("a.b", "1"),
//! ]);
//! assert_eq!(shallower_wins.get_path("a.b").and_then(|n| n.as_value()), Some("1"));
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separator between path segments in a label key.
pub const SEPARATOR: char = '.';

/// A node in a [`ConfigTree`]: either a scalar label value or a nested tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
    /// A terminal string value.
    Value(String),
    /// A nested sub-tree.
    Tree(ConfigTree),
}

impl ConfigNode {
    /// Returns the scalar value, if this node is one.
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value.as_str()),
            Self::Tree(_) => None,
        }
    }

    /// Returns the sub-tree, if this node is one.
    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            Self::Value(_) => None,
        }
    }

    /// Short name of the node shape, used in expectation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "string",
            Self::Tree(_) => "object",
        }
    }

    // Scalars are discarded when a deeper path has to pass through them.
    fn descend(&mut self) -> &mut ConfigTree {
        match self {
            Self::Tree(tree) => tree,
            Self::Value(_) => {
                *self = Self::Tree(ConfigTree::new());
                self.descend()
            }
        }
    }
}

impl From<&str> for ConfigNode {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for ConfigNode {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<ConfigTree> for ConfigNode {
    fn from(tree: ConfigTree) -> Self {
        Self::Tree(tree)
    }
}

/// An insertion-ordered nested mapping from segment name to [`ConfigNode`].
///
/// Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree {
    entries: IndexMap<String, ConfigNode>,
}

impl ConfigTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a direct child.
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries.get(key)
    }

    /// Looks up a node by dotted path, e.g. `"gantry.update.policy"`.
    pub fn get_path(&self, path: &str) -> Option<&ConfigNode> {
        let mut segments = path.split(SEPARATOR);
        let first = self.entries.get(segments.next()?)?;
        segments.try_fold(first, |node, segment| node.as_tree()?.get(segment))
    }

    /// Whether a direct child with this key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates direct children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Iterates the keys of direct children in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Sets a direct child, replacing any previous node under `key`.
    pub fn set(&mut self, key: impl Into<String>, node: impl Into<ConfigNode>) {
        self.entries.insert(key.into(), node.into());
    }

    /// Builder-style variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, node: impl Into<ConfigNode>) -> Self {
        self.set(key, node);
        self
    }

    /// Writes `value` at the end of `segments`, creating intermediate trees.
    ///
    /// Follows the precedence rules in the [module docs](self). An empty
    /// segment slice is ignored.
    pub fn insert_path<S: AsRef<str>>(&mut self, segments: &[S], value: impl Into<String>) {
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let target = parents.iter().fold(self, |tree, step| {
            tree.entries
                .entry(step.as_ref().to_string())
                .or_insert_with(|| ConfigNode::Tree(ConfigTree::new()))
                .descend()
        });

        target
            .entries
            .insert(last.as_ref().to_string(), ConfigNode::Value(value.into()));
    }

    /// Flattens the tree back into `(dotted-key, value)` pairs, depth first.
    ///
    /// Empty sub-trees produce no pairs, so the result only round-trips
    /// through [`build_tree`] for trees without empty branches.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        self.flatten_into(None, &mut pairs);
        pairs
    }

    fn flatten_into(&self, prefix: Option<&str>, pairs: &mut Vec<(String, String)>) {
        for (key, node) in &self.entries {
            let path = match prefix {
                Some(prefix) => format!("{prefix}{SEPARATOR}{key}"),
                None => key.clone(),
            };
            match node {
                ConfigNode::Value(value) => pairs.push((path, value.clone())),
                ConfigNode::Tree(tree) => tree.flatten_into(Some(&path), pairs),
            }
        }
    }

    /// Converts the tree into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| {
                    let value = match node {
                        ConfigNode::Value(value) => serde_json::Value::String(value.clone()),
                        ConfigNode::Tree(tree) => tree.to_json(),
                    };
                    (key.clone(), value)
                })
                .collect(),
        )
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl<'a> IntoIterator for &'a ConfigTree {
    type Item = (&'a String, &'a ConfigNode);
    type IntoIter = indexmap::map::Iter<'a, String, ConfigNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A label key split into path segments, paired with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    segments: Vec<String>,
    value: String,
}

impl PathEntry {
    /// Creates an entry from explicit segments.
    ///
    /// Returns `None` when `segments` is empty.
    pub fn new(segments: Vec<String>, value: impl Into<String>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            segments,
            value: value.into(),
        })
    }

    /// Splits `key` on [`SEPARATOR`]. Always yields at least one segment.
    pub fn parse(key: &str, value: impl Into<String>) -> Self {
        Self {
            segments: key.split(SEPARATOR).map(str::to_string).collect(),
            value: value.into(),
        }
    }

    /// The path segments, never empty.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The scalar value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Folds path entries, in order, into a fresh [`ConfigTree`].
///
/// Never fails; conflicting shapes are resolved by the precedence rules in
/// the [module docs](self) and left to schema validation.
pub fn build_tree<I>(entries: I) -> ConfigTree
where
    I: IntoIterator<Item = PathEntry>,
{
    entries.into_iter().fold(ConfigTree::new(), |mut tree, entry| {
        tree.insert_path(&entry.segments, entry.value);
        tree
    })
}
