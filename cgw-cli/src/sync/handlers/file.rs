//! File handler

use crate::api::CatalogApi;

use super::{Applied, HandlerContext, Lookup, Step, plan_step};
use crate::sync::error::SyncError;
use crate::sync::ledger::{LedgerEntry, ParentIds};
use crate::sync::types::{CatalogItem, EntityKind};

const PARENT_FIELDS: [&str; 3] = ["productName", "productCode", "productVersionName"];

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
    let version_key = key.parent().ok_or(SyncError::KeyArity {
        kind: EntityKind::File,
        expected: EntityKind::File.key_arity(),
        actual: key.parts().len(),
    })?;
    let version_id = ctx
        .index
        .parent_version_id(ctx.client, product_id, &version_key)
        .await?;
    let found = ctx
        .index
        .file_id(ctx.client, product_id, version_id, &key)
        .await?
        .or_else(|| item.explicit_id());
    let step = plan_step(item.action, &key, Lookup::for_action(item.action, found))?;
    let parents = ParentIds::version(product_id, version_id);

    item.strip_fields(&PARENT_FIELDS);
    item.set_field("productVersionId", version_id);

    let id = match step {
        Step::Create => {
            let invisible = item.requested_invisible();
            item.set_field("invisible", true);
            ctx.log.info(&format!("Creating file {}", key));
            let id = ctx
                .client
                .create_file(product_id, version_id, &item.metadata)
                .await?;
            ctx.index.record_created(&key, id)?;
            ctx.log.debug(&format!("File {} created with id {}", key, id));
            ctx.ledger.push(LedgerEntry::Created {
                key,
                id,
                parents,
                invisible,
            });
            id
        }
        Step::Update(id) => {
            ctx.log.info(&format!("Updating file {} (id {})", key, id));
            let pre_image = ctx.client.get_file(product_id, version_id, id).await?;
            item.set_field("id", id);
            ctx.client
                .update_file(product_id, version_id, &item.metadata)
                .await?;
            ctx.ledger.push(LedgerEntry::Updated {
                key,
                id,
                parents,
                pre_image,
            });
            id
        }
        Step::Delete(id) => {
            ctx.log.info(&format!("Deleting file {} (id {})", key, id));
            ctx.client.delete_file(product_id, version_id, id).await?;
            ctx.index.record_deleted(&key)?;
            ctx.ledger.prune(EntityKind::File, id);
            ctx.ledger.push(LedgerEntry::Deleted { key, id, parents });
            id
        }
    };

    Ok(Applied {
        kind: EntityKind::File,
        action: item.action,
        id,
    })
}
