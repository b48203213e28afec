//! Workload instance model.
//!
//! Instances are supplied by whatever talks to the container runtime. The
//! decoders only read three things from them: the lifecycle state, the label
//! map, and an identity that is passed through untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::labels::LabelMap;

/// Lifecycle state reported by the runtime.
///
/// Parsing is exact: `"running"` is [`LifecycleState::Running`], while
/// `"Running"` is kept verbatim as [`LifecycleState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    /// Created but never started.
    Created,
    /// Restarting after an exit.
    Restarting,
    /// Running.
    Running,
    /// Being removed.
    Removing,
    /// Paused.
    Paused,
    /// Exited.
    Exited,
    /// Dead.
    Dead,
    /// Any state string the runtime reports that is not listed above.
    Other(String),
}

impl LifecycleState {
    /// The state string as the runtime spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Restarting => "restarting",
            Self::Running => "running",
            Self::Removing => "removing",
            Self::Paused => "paused",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Other(state) => state,
        }
    }

    /// Whether the instance participates in decoding.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl From<&str> for LifecycleState {
    fn from(state: &str) -> Self {
        match state {
            "created" => Self::Created,
            "restarting" => Self::Restarting,
            "running" => Self::Running,
            "removing" => Self::Removing,
            "paused" => Self::Paused,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for LifecycleState {
    fn from(state: String) -> Self {
        Self::from(state.as_str())
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        state.as_str().to_string()
    }
}

impl FromStr for LifecycleState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image reference of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image name as the instance was started with, e.g. `nginx:1.27`.
    pub name: String,
    /// Content identity of the image, e.g. `sha256:...`.
    pub id: String,
}

/// Identity of one instance, passed through into decoded records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIdentity {
    /// Opaque instance id.
    pub id: String,
    /// Image the instance runs.
    pub image: ImageRef,
    /// Lifecycle state at the time the list was taken.
    pub state: LifecycleState,
}

/// Read access the decoders need from an instance.
///
/// Implemented for [`InstanceRecord`]; runtimes with their own container type
/// can implement it directly instead of converting.
pub trait Instance {
    /// Opaque instance id, used for log fields.
    fn id(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> &LifecycleState;

    /// Label map, in runtime order.
    fn labels(&self) -> &LabelMap;

    /// Identity to attach to a successfully decoded record.
    fn identity(&self) -> InstanceIdentity;
}

/// One entry of the runtime's instance list.
///
/// Field names follow the Docker Engine `GET /containers/json` response, so
/// the list can be deserialized as-is. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceRecord {
    /// Instance id.
    pub id: String,
    /// Image name.
    pub image: String,
    /// Image identity.
    #[serde(rename = "ImageID")]
    pub image_id: String,
    /// Lifecycle state.
    pub state: LifecycleState,
    /// Labels. Docker sends `null` for an instance without any.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: LabelMap,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LabelMap, D::Error> {
    Ok(Option::<LabelMap>::deserialize(deserializer)?.unwrap_or_default())
}

impl InstanceRecord {
    /// Creates a running instance with no labels.
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
            image_id: String::new(),
            state: LifecycleState::Running,
            labels: LabelMap::new(),
        }
    }

    /// Sets the image identity.
    #[must_use]
    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = image_id.into();
        self
    }

    /// Sets the lifecycle state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<LifecycleState>) -> Self {
        self.state = state.into();
        self
    }

    /// Appends a label. A repeated key keeps its original position.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Appends several labels in order.
    #[must_use]
    pub fn with_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl Instance for InstanceRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> &LifecycleState {
        &self.state
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }

    fn identity(&self) -> InstanceIdentity {
        InstanceIdentity {
            id: self.id.clone(),
            image: ImageRef {
                name: self.image.clone(),
                id: self.image_id.clone(),
            },
            state: self.state.clone(),
        }
    }
}
