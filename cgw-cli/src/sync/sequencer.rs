//! Batch sequencing
//!
//! Parents must exist before their children are created, and children must
//! be gone before their parent is deleted. Six buckets concatenated in a
//! fixed order satisfy both for the two-level hierarchy.

use super::types::{CatalogItem, EntityKind};

/// Bucket position of an item: creates/updates top-down, deletes bottom-up
fn bucket(item: &CatalogItem) -> usize {
    match (item.kind, item.action.is_delete()) {
        (EntityKind::Product, false) => 0,
        (EntityKind::Version, false) => 1,
        (EntityKind::File, false) => 2,
        (EntityKind::File, true) => 3,
        (EntityKind::Version, true) => 4,
        (EntityKind::Product, true) => 5,
    }
}

/// Order a batch so referential constraints hold.
///
/// The sort is stable: items of the same bucket keep their input order.
pub fn sort_items(mut items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    items.sort_by_key(bucket);
    items
}
