//! Reading the instance list.
//!
//! The list is the body of Docker's `GET /containers/json`, e.g. the output of
//! `curl --unix-socket /var/run/docker.sock http://localhost/containers/json?all=1`.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use gantry_core::InstanceRecord;

use crate::InspectError;

/// Where the instance list is read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Standard input.
    #[default]
    Stdin,
    /// A file.
    File(PathBuf),
}

impl InputSource {
    /// `-` means stdin, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Reads the whole source.
    ///
    /// # Errors
    ///
    /// Returns `InspectError::ReadInput` on I/O failure.
    pub fn read_to_string(&self) -> Result<String, InspectError> {
        match self {
            Self::Stdin => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| InspectError::read_input("-", e))?;
                Ok(buf)
            }
            Self::File(path) => fs::read_to_string(path).map_err(|e| InspectError::read_input(path, e)),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("-"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parses a JSON array of Docker container objects.
///
/// # Errors
///
/// Returns `InspectError::ParseInput` if the JSON is malformed or an entry
/// lacks `Id`, `Image`, `ImageID` or `State`.
pub fn parse_instances(json: &str) -> Result<Vec<InstanceRecord>, InspectError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses the instance list from `source`.
///
/// # Errors
///
/// See [`InputSource::read_to_string`] and [`parse_instances`].
pub fn read_instances(source: &InputSource) -> Result<Vec<InstanceRecord>, InspectError> {
    parse_instances(&source.read_to_string()?)
}
