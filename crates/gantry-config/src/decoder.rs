//! Per-instance decoding, batch decoding and settings selection.
//!
//! Both queries only look at running instances. A running instance that did
//! not opt in is skipped without a trace beyond a `debug!` event. Everything
//! past the opt-in gate is returned as data; nothing here logs a failure.

use gantry_core::{tree_from_labels, Instance, InstanceIdentity, LabelMap, Namespace};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::schema::{decode_section, OptInGate, Record};
use crate::{ConfigError, ContainerConfig, DecodeError, ExtractorConfig, GantrySettings};

/// Result of decoding one instance for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome<T> {
    /// The instance did not opt in. Not an error.
    Skip,
    /// The instance opted in but its configuration is invalid.
    Failure(DecodeError),
    /// The instance opted in with a valid configuration.
    Success(T),
}

impl<T> DecodeOutcome<T> {
    /// `None` for [`Skip`](Self::Skip), otherwise the decode result.
    pub fn into_result(self) -> Option<Result<T, DecodeError>> {
        match self {
            Self::Skip => None,
            Self::Failure(error) => Some(Err(error)),
            Self::Success(value) => Some(Ok(value)),
        }
    }

    /// Whether the instance was skipped.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// Maps the success payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodeOutcome<U> {
        match self {
            Self::Skip => DecodeOutcome::Skip,
            Self::Failure(error) => DecodeOutcome::Failure(error),
            Self::Success(value) => DecodeOutcome::Success(f(value)),
        }
    }
}

/// A tracked container together with its validated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GantryContainer<C = ContainerConfig> {
    /// Identity of the container, as reported by the runtime.
    pub container: InstanceIdentity,
    /// Validated configuration.
    pub config: C,
}

/// A tracked container whose labels failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("container {}: {error}", .container.id)]
pub struct InstanceDecodeError {
    /// The failing container.
    pub container: InstanceIdentity,
    /// What is wrong with its labels.
    #[source]
    pub error: DecodeError,
}

/// Decodes label maps under one namespace.
///
/// # Example
///
/// ```
/// use gantry_config::LabelDecoder;
/// use gantry_core::fixtures;
///
/// let decoder = LabelDecoder::default();
/// let instances = [
///     fixtures::tracked_container("web"),
///     fixtures::untracked_container("db"),
///     fixtures::settings_container("gantry"),
/// ];
///
/// let containers = decoder.decode_instances(&instances);
/// assert_eq!(containers.len(), 1);
///
/// let settings = decoder.select_settings(&instances).unwrap().unwrap();
/// assert_eq!(settings.interval.as_secs(), 300);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDecoder {
    namespace: Namespace,
}

impl LabelDecoder {
    /// Creates a decoder for `namespace`.
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Creates a decoder for the namespace configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the namespace token is invalid.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        config.namespace().map(Self::new)
    }

    /// The namespace labels are read from.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Gates `labels` on `gate`, then decodes the namespace section as `T`.
    pub fn decode_labels<T: Record>(&self, labels: &LabelMap, gate: OptInGate) -> DecodeOutcome<T> {
        let tree = tree_from_labels(&self.namespace, labels);
        let Some(section) = gate.narrow(&self.namespace, &tree) else {
            return DecodeOutcome::Skip;
        };
        match decode_section(&self.namespace, section) {
            Ok(value) => DecodeOutcome::Success(value),
            Err(error) => DecodeOutcome::Failure(error),
        }
    }

    /// Decodes one container's labels, attaching `identity` on success.
    ///
    /// Does not look at the lifecycle state.
    pub fn decode_container<C: Record>(
        &self,
        labels: &LabelMap,
        identity: InstanceIdentity,
    ) -> DecodeOutcome<GantryContainer<C>> {
        self.decode_labels(labels, OptInGate::ENABLE)
            .map(|config| GantryContainer {
                container: identity,
                config,
            })
    }

    /// Decodes every running, opted-in instance, in input order.
    pub fn decode_instances_with<C, I>(&self, instances: &[I]) -> Vec<Result<GantryContainer<C>, InstanceDecodeError>>
    where
        C: Record,
        I: Instance,
    {
        running(instances)
            .filter_map(|instance| match self.decode_labels::<C>(instance.labels(), OptInGate::ENABLE) {
                DecodeOutcome::Skip => {
                    debug!(container = instance.id(), "container not opted in, skipping");
                    None
                }
                DecodeOutcome::Failure(error) => Some(Err(InstanceDecodeError {
                    container: instance.identity(),
                    error,
                })),
                DecodeOutcome::Success(config) => Some(Ok(GantryContainer {
                    container: instance.identity(),
                    config,
                })),
            })
            .collect()
    }

    /// [`decode_instances_with`](Self::decode_instances_with) using
    /// [`ContainerConfig`].
    pub fn decode_instances<I: Instance>(&self, instances: &[I]) -> Vec<Result<GantryContainer, InstanceDecodeError>> {
        self.decode_instances_with(instances)
    }

    /// Decodes the settings of the first running instance that carries the
    /// `self` flag.
    ///
    /// Later instances are never consulted, even if the first one fails.
    /// `None` if no running instance carries the flag.
    pub fn select_settings_with<S, I>(&self, instances: &[I]) -> Option<Result<S, DecodeError>>
    where
        S: Record,
        I: Instance,
    {
        running(instances).find_map(|instance| {
            let outcome = self.decode_labels::<S>(instance.labels(), OptInGate::SELF);
            if outcome.is_skip() {
                debug!(container = instance.id(), "no settings on container");
            } else {
                debug!(container = instance.id(), "selected settings container");
            }
            outcome.into_result()
        })
    }

    /// [`select_settings_with`](Self::select_settings_with) using
    /// [`GantrySettings`].
    pub fn select_settings<I: Instance>(&self, instances: &[I]) -> Option<Result<GantrySettings, DecodeError>> {
        self.select_settings_with(instances)
    }
}

fn running<I: Instance>(instances: &[I]) -> impl Iterator<Item = &I> {
    instances.iter().filter(|instance| {
        let running = instance.state().is_running();
        if !running {
            debug!(
                container = instance.id(),
                state = %instance.state(),
                "container not running, skipping"
            );
        }
        running
    })
}

/// Decodes running, opted-in instances under the default namespace.
pub fn decode_instances<I: Instance>(instances: &[I]) -> Vec<Result<GantryContainer, InstanceDecodeError>> {
    LabelDecoder::default().decode_instances(instances)
}

/// Selects global settings under the default namespace.
pub fn select_settings<I: Instance>(instances: &[I]) -> Option<Result<GantrySettings, DecodeError>> {
    LabelDecoder::default().select_settings(instances)
}
