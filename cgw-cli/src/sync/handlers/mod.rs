//! Per-kind reconciliation handlers
//!
//! Each handler resolves the parent and self IDs of one item, decides what
//! remote call the item's action maps to, performs it and records the
//! outcome in the identity index and the ledger.

pub mod file;
pub mod product;
pub mod version;

use crate::api::{CatalogApi, RecordId};

use super::error::SyncError;
use super::identity::CatalogIndex;
use super::keys::NaturalKey;
use super::ledger::Ledger;
use super::log::SyncLog;
use super::types::{Action, CatalogItem, EntityKind};

/// Borrowed run state a handler works against
pub struct HandlerContext<'a, C: CatalogApi + ?Sized> {
    pub client: &'a C,
    pub index: &'a mut CatalogIndex,
    pub ledger: &'a mut Ledger,
    pub log: &'a dyn SyncLog,
}

/// What resolving an item against the index found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The record exists and the action targets it
    Found(RecordId),
    /// A create targets a key that already has a record
    AlreadyPresent(RecordId),
    NotFound,
}

impl Lookup {
    pub fn for_action(action: Action, id: Option<RecordId>) -> Self {
        match (action, id) {
            (Action::Create, Some(id)) => Self::AlreadyPresent(id),
            (_, Some(id)) => Self::Found(id),
            (_, None) => Self::NotFound,
        }
    }
}

/// Remote call an item maps to once resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Create,
    Update(RecordId),
    Delete(RecordId),
}

/// Turn a lookup into a step, or into the domain error that blocks it
pub fn plan_step(action: Action, key: &NaturalKey, lookup: Lookup) -> Result<Step, SyncError> {
    match (lookup, action) {
        (Lookup::AlreadyPresent(id), _) | (Lookup::Found(id), Action::Create) => {
            Err(SyncError::AlreadyPresent {
                key: key.clone(),
                id,
            })
        }
        (Lookup::NotFound, Action::Create) => Ok(Step::Create),
        (Lookup::NotFound, action) => Err(SyncError::IdNotSet {
            action,
            key: key.clone(),
        }),
        (Lookup::Found(id), Action::Update) => Ok(Step::Update(id)),
        (Lookup::Found(id), Action::Delete) => Ok(Step::Delete(id)),
    }
}

/// Summary of one applied item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub kind: EntityKind,
    pub action: Action,
    pub id: RecordId,
}

/// Apply one item with the handler for its kind
pub async fn apply<C>(
    ctx: &mut HandlerContext<'_, C>,
    item: &mut CatalogItem,
) -> Result<Applied, SyncError>
where
    C: CatalogApi + ?Sized,
{
    match item.kind {
        EntityKind::Product => product::apply(ctx, item).await,
        EntityKind::Version => version::apply(ctx, item).await,
        EntityKind::File => file::apply(ctx, item).await,
    }
}
