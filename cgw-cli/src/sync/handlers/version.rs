//! Version handler
//!
//! Versions are addressed by product name and code in item metadata; the
//! Gateway wants the product's ID instead, so those fields are swapped for
//! `productId` before any call.

use crate::api::CatalogApi;

use super::{Applied, HandlerContext, Lookup, Step, plan_step};
use crate::sync::error::SyncError;
use crate::sync::ledger::{LedgerEntry, ParentIds};
use crate::sync::types::{CatalogItem, EntityKind};

const PARENT_FIELDS: [&str; 2] = ["productName", "productCode"];

pub async fn apply<C>(
    ctx: &mut HandlerContext<'_, C>,
    item: &mut CatalogItem,
) -> Result<Applied, SyncError>
where
    C: CatalogApi + ?Sized,
{
    let key = item.natural_key()?;
    let product_id = ctx
        .index
        .parent_product_id(ctx.client, &key.product_key())
        .await?;
    let found = ctx
        .index
        .version_id(ctx.client, product_id, &key)
        .await?
        .or_else(|| item.explicit_id());
    let step = plan_step(item.action, &key, Lookup::for_action(item.action, found))?;
    let parents = ParentIds::product(product_id);

    item.strip_fields(&PARENT_FIELDS);
    item.set_field("productId", product_id);

    let id = match step {
        Step::Create => {
            let invisible = item.requested_invisible();
            item.set_field("invisible", true);
            ctx.log.info(&format!("Creating version {}", key));
            let id = ctx.client.create_version(product_id, &item.metadata).await?;
            ctx.index.record_created(&key, id)?;
            ctx.log.debug(&format!("Version {} created with id {}", key, id));
            ctx.ledger.push(LedgerEntry::Created {
                key,
                id,
                parents,
                invisible,
            });
            id
        }
        Step::Update(id) => {
            ctx.log.info(&format!("Updating version {} (id {})", key, id));
            let pre_image = ctx.client.get_version(product_id, id).await?;
            item.set_field("id", id);
            ctx.client.update_version(product_id, &item.metadata).await?;
            ctx.ledger.push(LedgerEntry::Updated {
                key,
                id,
                parents,
                pre_image,
            });
            id
        }
        Step::Delete(id) => {
            ctx.log.info(&format!("Deleting version {} (id {})", key, id));
            ctx.client.delete_version(product_id, id).await?;
            ctx.index.record_deleted(&key)?;
            ctx.ledger.prune(EntityKind::Version, id);
            ctx.ledger.push(LedgerEntry::Deleted { key, id, parents });
            id
        }
    };

    Ok(Applied {
        kind: EntityKind::Version,
        action: item.action,
        id,
    })
}
