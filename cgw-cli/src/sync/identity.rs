//! Identity resolution: natural key to remote record ID
//!
//! Each [`IdentityMap`] caches the IDs of one entity kind. A miss triggers a
//! single listing of the key's parent scope, and every record of that
//! listing is cached, so a batch touching N versions of one product lists
//! that product's versions once.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use serde_json::Value;

use crate::api::models::record_id;
use crate::api::{CatalogApi, Record, RecordId};

use super::error::SyncError;
use super::keys::{NaturalKey, key_part};
use super::types::EntityKind;

/// Lazily populated cache of natural key to record ID for one entity kind
#[derive(Debug)]
pub struct IdentityMap {
    kind: EntityKind,
    entries: HashMap<NaturalKey, RecordId>,
    /// Parent scopes already listed from the Gateway
    loaded_scopes: HashSet<Vec<String>>,
}

impl IdentityMap {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            loaded_scopes: HashSet::new(),
        }
    }

    fn check(&self, key: &NaturalKey) -> Result<(), SyncError> {
        if key.kind() != self.kind || key.parts().len() != self.kind.key_arity() {
            return Err(SyncError::KeyArity {
                kind: self.kind,
                expected: self.kind.key_arity(),
                actual: key.parts().len(),
            });
        }
        Ok(())
    }

    /// Cached value only; never fetches
    pub fn get(&self, key: &NaturalKey) -> Option<RecordId> {
        self.entries.get(key).copied()
    }

    pub fn is_scope_loaded(&self, scope: &[String]) -> bool {
        self.loaded_scopes.contains(scope)
    }

    /// Look `key` up, listing its scope through `fetch` on the first miss.
    ///
    /// `fetch` receives the scope (the key's leading components) and returns
    /// every `(key, id)` pair found remotely in it.
    pub async fn lookup<F, Fut>(
        &mut self,
        key: &NaturalKey,
        fetch: F,
    ) -> Result<Option<RecordId>, SyncError>
    where
        F: FnOnce(Vec<String>) -> Fut,
        Fut: Future<Output = Result<Vec<(NaturalKey, RecordId)>, SyncError>>,
    {
        self.check(key)?;

        if let Some(id) = self.get(key) {
            return Ok(Some(id));
        }
        if self.is_scope_loaded(key.scope()) {
            return Ok(None);
        }

        let scope = key.scope().to_vec();
        let fetched = fetch(scope.clone()).await?;
        for (fetched_key, id) in fetched {
            self.check(&fetched_key)?;
            self.entries.insert(fetched_key, id);
        }
        self.loaded_scopes.insert(scope);

        Ok(self.get(key))
    }

    /// Like [`lookup`](Self::lookup) but absence is an error
    pub async fn resolve<F, Fut>(&mut self, key: &NaturalKey, fetch: F) -> Result<RecordId, SyncError>
    where
        F: FnOnce(Vec<String>) -> Fut,
        Fut: Future<Output = Result<Vec<(NaturalKey, RecordId)>, SyncError>>,
    {
        self.lookup(key, fetch)
            .await?
            .ok_or_else(|| SyncError::NotFound { key: key.clone() })
    }

    pub fn set(&mut self, key: NaturalKey, id: RecordId) -> Result<(), SyncError> {
        self.check(&key)?;
        self.entries.insert(key, id);
        Ok(())
    }

    pub fn remove(&mut self, key: &NaturalKey) -> Result<Option<RecordId>, SyncError> {
        self.check(key)?;
        Ok(self.entries.remove(key))
    }

    /// Record that `scope` has no remote records beyond those cached
    pub fn mark_scope_loaded(&mut self, scope: Vec<String>) {
        self.loaded_scopes.insert(scope);
    }

    /// Drop every cached entry and listing under `prefix`
    pub fn forget_scope(&mut self, prefix: &[String]) {
        self.entries.retain(|key, _| !key.parts().starts_with(prefix));
        self.loaded_scopes.retain(|scope| !scope.starts_with(prefix));
    }
}

/// The three identity maps of a batch run plus the listing calls behind them
#[derive(Debug)]
pub struct CatalogIndex {
    products: IdentityMap,
    versions: IdentityMap,
    files: IdentityMap,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self {
            products: IdentityMap::new(EntityKind::Product),
            versions: IdentityMap::new(EntityKind::Version),
            files: IdentityMap::new(EntityKind::File),
        }
    }

    fn map_mut(&mut self, kind: EntityKind) -> &mut IdentityMap {
        match kind {
            EntityKind::Product => &mut self.products,
            EntityKind::Version => &mut self.versions,
            EntityKind::File => &mut self.files,
        }
    }

    /// Product ID for `key`; lists all products on the first miss
    pub async fn product_id<C>(
        &mut self,
        client: &C,
        key: &NaturalKey,
    ) -> Result<Option<RecordId>, SyncError>
    where
        C: CatalogApi + ?Sized,
    {
        self.products.lookup(key, |_| list_products(client)).await
    }

    /// Version ID for `key` under the already resolved `product_id`
    pub async fn version_id<C>(
        &mut self,
        client: &C,
        product_id: RecordId,
        key: &NaturalKey,
    ) -> Result<Option<RecordId>, SyncError>
    where
        C: CatalogApi + ?Sized,
    {
        let parent = parent_key(key)?;
        self.versions
            .lookup(key, |_| list_versions(client, product_id, parent))
            .await
    }

    /// File ID for `key` under the already resolved product and version
    pub async fn file_id<C>(
        &mut self,
        client: &C,
        product_id: RecordId,
        version_id: RecordId,
        key: &NaturalKey,
    ) -> Result<Option<RecordId>, SyncError>
    where
        C: CatalogApi + ?Sized,
    {
        let parent = parent_key(key)?;
        self.files
            .lookup(key, |_| list_files(client, product_id, version_id, parent))
            .await
    }

    /// ID of the product a version or file lives under
    pub async fn parent_product_id<C>(
        &mut self,
        client: &C,
        key: &NaturalKey,
    ) -> Result<RecordId, SyncError>
    where
        C: CatalogApi + ?Sized,
    {
        self.products
            .resolve(key, |_| list_products(client))
            .await
            .map_err(parent_missing)
    }

    /// ID of the version a file lives under
    pub async fn parent_version_id<C>(
        &mut self,
        client: &C,
        product_id: RecordId,
        key: &NaturalKey,
    ) -> Result<RecordId, SyncError>
    where
        C: CatalogApi + ?Sized,
    {
        let parent = parent_key(key)?;
        self.versions
            .resolve(key, |_| list_versions(client, product_id, parent))
            .await
            .map_err(parent_missing)
    }

    /// Cache a freshly created record. Its child scope is known to be empty,
    /// so no listing is needed for children created later in the batch.
    pub fn record_created(&mut self, key: &NaturalKey, id: RecordId) -> Result<(), SyncError> {
        self.map_mut(key.kind()).set(key.clone(), id)?;
        match key.kind() {
            EntityKind::Product => self.versions.mark_scope_loaded(key.parts().to_vec()),
            EntityKind::Version => self.files.mark_scope_loaded(key.parts().to_vec()),
            EntityKind::File => {}
        }
        Ok(())
    }

    /// Forget a deleted record and anything cached beneath it
    pub fn record_deleted(&mut self, key: &NaturalKey) -> Result<Option<RecordId>, SyncError> {
        let removed = self.map_mut(key.kind()).remove(key)?;
        match key.kind() {
            EntityKind::Product => {
                self.versions.forget_scope(key.parts());
                self.files.forget_scope(key.parts());
            }
            EntityKind::Version => self.files.forget_scope(key.parts()),
            EntityKind::File => {}
        }
        Ok(removed)
    }
}

fn index_records<F>(records: &[Record], key_of: F) -> Vec<(NaturalKey, RecordId)>
where
    F: Fn(&Record) -> Option<NaturalKey>,
{
    records
        .iter()
        .filter_map(|record| Some((key_of(record)?, record_id(record)?)))
        .collect()
}

fn parent_key(key: &NaturalKey) -> Result<NaturalKey, SyncError> {
    key.parent().ok_or(SyncError::KeyArity {
        kind: key.kind(),
        expected: key.kind().key_arity(),
        actual: key.parts().len(),
    })
}

/// A missing parent is reported against the parent's own key
fn parent_missing(err: SyncError) -> SyncError {
    match err {
        SyncError::NotFound { key } => SyncError::ParentNotFound { key },
        other => other,
    }
}

async fn list_products<C>(client: &C) -> Result<Vec<(NaturalKey, RecordId)>, SyncError>
where
    C: CatalogApi + ?Sized,
{
    let records = client.get_products().await?;
    Ok(index_records(&records, |record| {
        let name = record.get("name")?;
        let code = record.get("productCode").unwrap_or(&Value::Null);
        Some(NaturalKey::product(key_part(name), key_part(code)))
    }))
}

async fn list_versions<C>(
    client: &C,
    product_id: RecordId,
    product: NaturalKey,
) -> Result<Vec<(NaturalKey, RecordId)>, SyncError>
where
    C: CatalogApi + ?Sized,
{
    let records = client.get_versions(product_id).await?;
    Ok(index_records(&records, |record| {
        product.child(key_part(record.get("versionName")?)).ok()
    }))
}

async fn list_files<C>(
    client: &C,
    product_id: RecordId,
    version_id: RecordId,
    version: NaturalKey,
) -> Result<Vec<(NaturalKey, RecordId)>, SyncError>
where
    C: CatalogApi + ?Sized,
{
    let records = client.get_files(product_id, version_id).await?;
    Ok(index_records(&records, |record| {
        version.child(key_part(record.get("downloadURL")?)).ok()
    }))
}
