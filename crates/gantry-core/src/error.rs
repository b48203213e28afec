//! Core error types.

use thiserror::Error;

/// Errors raised when constructing a [`Namespace`](crate::Namespace).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    /// The namespace token is empty.
    #[error("namespace must not be empty")]
    Empty,

    /// The namespace token contains the path separator.
    #[error("namespace '{0}' must not contain '.'")]
    ContainsSeparator(String),

    /// The namespace token contains whitespace.
    #[error("namespace '{0}' must not contain whitespace")]
    ContainsWhitespace(String),
}
