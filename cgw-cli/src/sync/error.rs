//! Domain errors raised while reconciling a batch

use thiserror::Error;

use crate::api::{ClientError, RecordId};

use super::keys::NaturalKey;
use super::session::BatchState;
use super::types::{Action, EntityKind};

#[derive(Debug, Error)]
pub enum SyncError {
    /// A create targets a natural key that already has a remote record
    #[error("Cannot create the {} {key}, record already present with id {id}", .key.kind())]
    AlreadyPresent { key: NaturalKey, id: RecordId },

    /// An update or delete could not find the record it targets
    #[error("Cannot {action} the {} {key}, id is not set", .key.kind())]
    IdNotSet { action: Action, key: NaturalKey },

    /// The parent product or version of a version/file item does not exist
    #[error("{} {key} not found", .key.kind().title())]
    ParentNotFound { key: NaturalKey },

    /// `resolve` was asked for a key that does not exist remotely
    #[error("{} {key} does not exist", .key.kind().title())]
    NotFound { key: NaturalKey },

    /// A natural key of the wrong shape reached an identity map
    #[error("invalid {kind} key: expected {expected} components, got {actual}")]
    KeyArity {
        kind: EntityKind,
        expected: usize,
        actual: usize,
    },

    /// Item metadata lacks a field the engine needs
    #[error("{kind} metadata is missing required field '{field}'")]
    MissingField { kind: EntityKind, field: &'static str },

    /// A session was driven outside its state machine
    #[error("batch cannot run from state {0:?}")]
    InvalidState(BatchState),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SyncError {
    /// Whether the Gateway itself rejected a call
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Client(_))
    }

    /// Errors caused by the caller using the engine wrongly rather than by
    /// input data or remote state
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::KeyArity { .. } | Self::InvalidState(_))
    }
}
