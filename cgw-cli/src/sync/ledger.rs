//! Operation ledger
//!
//! Every remote change that succeeded during a batch is appended here. The
//! ledger is read back to front by finalize and rollback.

use crate::api::{Metadata, RecordId};

use super::keys::NaturalKey;
use super::types::EntityKind;

/// Remote IDs of the records above an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParentIds {
    pub product_id: Option<RecordId>,
    pub version_id: Option<RecordId>,
}

impl ParentIds {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn product(product_id: RecordId) -> Self {
        Self {
            product_id: Some(product_id),
            version_id: None,
        }
    }

    pub fn version(product_id: RecordId, version_id: RecordId) -> Self {
        Self {
            product_id: Some(product_id),
            version_id: Some(version_id),
        }
    }
}

/// One applied change plus what is needed to undo or complete it
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEntry {
    Created {
        key: NaturalKey,
        id: RecordId,
        parents: ParentIds,
        /// Visibility to apply on finalize
        invisible: bool,
    },
    Updated {
        key: NaturalKey,
        id: RecordId,
        parents: ParentIds,
        /// Remote record as it was before the update
        pre_image: Metadata,
    },
    Deleted {
        key: NaturalKey,
        id: RecordId,
        parents: ParentIds,
    },
}

impl LedgerEntry {
    pub fn kind(&self) -> EntityKind {
        self.key().kind()
    }

    pub fn id(&self) -> RecordId {
        match self {
            Self::Created { id, .. } | Self::Updated { id, .. } | Self::Deleted { id, .. } => *id,
        }
    }

    pub fn key(&self) -> &NaturalKey {
        match self {
            Self::Created { key, .. } | Self::Updated { key, .. } | Self::Deleted { key, .. } => key,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "create",
            Self::Updated { .. } => "update",
            Self::Deleted { .. } => "delete",
        }
    }
}

#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Drop earlier entries for a record that has since been deleted.
    /// Returns how many entries were removed.
    pub fn prune(&mut self, kind: EntityKind, id: RecordId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.kind() == kind && entry.id() == id));
        before - self.entries.len()
    }

    /// Entries newest first
    pub fn iter_rev(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
