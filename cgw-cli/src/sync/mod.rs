//! Catalog reconciliation engine
//!
//! Converges the Content Gateway towards a declarative list of
//! [`CatalogItem`]s:
//! - natural keys are resolved to remote IDs through a lazily filled
//!   [`CatalogIndex`](identity::CatalogIndex)
//! - items are sequenced so parents exist before children and children are
//!   gone before parents
//! - every applied change is recorded in a [`Ledger`](ledger::Ledger) that drives the
//!   finalize (make visible) and rollback protocols of a [`SyncSession`]

pub mod error;
pub mod handlers;
pub mod identity;
pub mod keys;
pub mod ledger;
pub mod log;
pub mod sequencer;
pub mod session;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use error::SyncError;
pub use log::LogFacade;
pub use sequencer::sort_items;
pub use session::{BatchReport, SyncSession};
pub use types::{CatalogItem, EntityKind};
