//! Product handler

use crate::api::CatalogApi;

use super::{Applied, HandlerContext, Lookup, Step, plan_step};
use crate::sync::error::SyncError;
use crate::sync::ledger::{LedgerEntry, ParentIds};
use crate::sync::types::{CatalogItem, EntityKind};

pub async fn apply<C>(
    ctx: &mut HandlerContext<'_, C>,
    item: &mut CatalogItem,
) -> Result<Applied, SyncError>
where
    C: CatalogApi + ?Sized,
{
    let key = item.natural_key()?;
    let found = ctx
        .index
        .product_id(ctx.client, &key)
        .await?
        .or_else(|| item.explicit_id());
    let step = plan_step(item.action, &key, Lookup::for_action(item.action, found))?;

    let id = match step {
        Step::Create => {
            ctx.log.info(&format!("Creating product {}", key));
            let id = ctx.client.create_product(&item.metadata).await?;
            ctx.index.record_created(&key, id)?;
            ctx.log.debug(&format!("Product {} created with id {}", key, id));
            ctx.ledger.push(LedgerEntry::Created {
                key,
                id,
                parents: ParentIds::none(),
                invisible: item.requested_invisible(),
            });
            id
        }
        Step::Update(id) => {
            ctx.log.info(&format!("Updating product {} (id {})", key, id));
            let pre_image = ctx.client.get_product(id).await?;
            item.set_field("id", id);
            ctx.client.update_product(&item.metadata).await?;
            ctx.ledger.push(LedgerEntry::Updated {
                key,
                id,
                parents: ParentIds::none(),
                pre_image,
            });
            id
        }
        Step::Delete(id) => {
            ctx.log.info(&format!("Deleting product {} (id {})", key, id));
            ctx.client.delete_product(id).await?;
            ctx.index.record_deleted(&key)?;
            ctx.ledger.prune(EntityKind::Product, id);
            ctx.ledger.push(LedgerEntry::Deleted {
                key,
                id,
                parents: ParentIds::none(),
            });
            id
        }
    };

    Ok(Applied {
        kind: EntityKind::Product,
        action: item.action,
        id,
    })
}
