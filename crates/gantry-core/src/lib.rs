//! # Gantry Core
//!
//! Core types for reading Gantry configuration out of container labels.
//!
//! - [`ConfigTree`] - Nested tree rebuilt from dotted label keys
//! - [`build_tree`] - Order-sensitive fold of [`PathEntry`] values into a tree
//! - [`tree_from_labels`] - Filters labels by [`Namespace`] and builds the tree
//! - [`InstanceRecord`] / [`Instance`] - What the runtime reports per container
//!
//! ```
//! use gantry_core::{tree_from_labels, Namespace};
//!
//! let labels = [
//!     ("gantry.enable", "true"),
//!     ("gantry.update.interval", "300"),
//!     ("com.docker.compose.service", "web"),
//! ];
//!
//! let tree = tree_from_labels(&Namespace::default(), labels);
//! assert_eq!(
//!     tree.get_path("gantry.update.interval").and_then(|n| n.as_value()),
//!     Some("300"),
//! );
//! assert!(tree.get("com").is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fixtures;
mod instance;
pub mod labels;
pub mod tree;

pub use error::NamespaceError;
pub use instance::{ImageRef, Instance, InstanceIdentity, InstanceRecord, LifecycleState};
pub use labels::{
    labels_from_tree, path_entries, tree_from_labels, LabelMap, Namespace, DEFAULT_NAMESPACE,
    ENABLE_FLAG, FLAG_ON, SELF_FLAG,
};
pub use tree::{build_tree, ConfigNode, ConfigTree, PathEntry, SEPARATOR};
