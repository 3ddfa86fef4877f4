//! Test doubles for the reconciliation engine

use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{CatalogApi, ClientError, Metadata, Record, RecordId, parse_record_id};

use super::log::SyncLog;

/// Every `CatalogApi` method, used by the coverage test
pub const CATALOG_METHODS: [&str; 15] = [
    "get_products",
    "get_product",
    "create_product",
    "update_product",
    "delete_product",
    "get_versions",
    "get_version",
    "create_version",
    "update_version",
    "delete_version",
    "get_files",
    "get_file",
    "create_file",
    "update_file",
    "delete_file",
];

/// A recorded call against [`FakeCatalog`]
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    /// Path IDs in URL order
    pub ids: Vec<RecordId>,
    pub body: Option<Metadata>,
    /// ID assigned by a create call
    pub created: Option<RecordId>,
}

#[derive(Debug, Default)]
struct Store {
    next_id: RecordId,
    products: BTreeMap<RecordId, Record>,
    versions: BTreeMap<RecordId, (RecordId, Record)>,
    files: BTreeMap<RecordId, (RecordId, RecordId, Record)>,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
}

impl Store {
    fn assign(&mut self, mut record: Record) -> (RecordId, Record) {
        self.next_id += 1;
        let id = self.next_id;
        record.insert("id".into(), id.into());
        (id, record)
    }

    fn has_product(&self, pid: RecordId) -> Result<(), ClientError> {
        if self.products.contains_key(&pid) {
            Ok(())
        } else {
            Err(ClientError::api(404, format!("product {} not found", pid)))
        }
    }

    fn has_version(&self, pid: RecordId, vid: RecordId) -> Result<(), ClientError> {
        self.has_product(pid)?;
        match self.versions.get(&vid) {
            Some((parent, _)) if *parent == pid => Ok(()),
            _ => Err(ClientError::api(404, format!("version {} not found", vid))),
        }
    }
}

/// In-memory Gateway.
///
/// Assigns sequential IDs starting at 1, enforces the product > version >
/// file hierarchy the way the Gateway does and records every call.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    store: Mutex<Store>,
}

fn merge(target: &mut Record, update: &Metadata) {
    for (field, value) in update {
        target.insert(field.clone(), value.clone());
    }
}

fn body_id(metadata: &Metadata) -> Result<RecordId, ClientError> {
    let id = metadata
        .get("id")
        .ok_or_else(|| ClientError::api(400, "id is required"))?;
    parse_record_id(id)
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    /// Record the call, then fail it if it was marked failing
    fn enter(
        &self,
        method: &'static str,
        ids: &[RecordId],
        body: Option<&Metadata>,
    ) -> Result<std::sync::MutexGuard<'_, Store>, ClientError> {
        let mut store = self.store();
        store.calls.push(Call {
            method,
            ids: ids.to_vec(),
            body: body.cloned(),
            created: None,
        });
        if store.failing.contains(method) {
            return Err(ClientError::api(500, format!("injected failure in {}", method)));
        }
        Ok(store)
    }

    fn created(store: &mut Store, id: RecordId) {
        if let Some(call) = store.calls.last_mut() {
            call.created = Some(id);
        }
    }

    /// Make every later call of `method` fail with a 500
    pub fn fail_on(&self, method: &'static str) {
        self.store().failing.insert(method);
    }

    pub fn seed_product(&self, record: Value) -> RecordId {
        let mut store = self.store();
        let (id, record) = store.assign(to_record(record));
        store.products.insert(id, record);
        id
    }

    pub fn seed_version(&self, pid: RecordId, record: Value) -> RecordId {
        let mut store = self.store();
        let (id, mut record) = store.assign(to_record(record));
        record.insert("productId".into(), pid.into());
        store.versions.insert(id, (pid, record));
        id
    }

    pub fn seed_file(&self, pid: RecordId, vid: RecordId, record: Value) -> RecordId {
        let mut store = self.store();
        let (id, mut record) = store.assign(to_record(record));
        record.insert("productVersionId".into(), vid.into());
        store.files.insert(id, (pid, vid, record));
        id
    }

    pub fn calls(&self) -> Vec<Call> {
        self.store().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.store().calls.iter().filter(|c| c.method == method).count()
    }

    /// Method names of recorded calls starting with `prefix`, in call order
    pub fn methods_matching(&self, prefix: &str) -> Vec<&'static str> {
        self.store()
            .calls
            .iter()
            .map(|c| c.method)
            .filter(|m| m.starts_with(prefix))
            .collect()
    }

    /// IDs returned by successful calls of a create method
    pub fn created_ids(&self, method: &str) -> Vec<RecordId> {
        self.store()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .filter_map(|c| c.created)
            .collect()
    }

    pub fn products(&self) -> Vec<Record> {
        self.store().products.values().cloned().collect()
    }

    pub fn product(&self, pid: RecordId) -> Option<Record> {
        self.store().products.get(&pid).cloned()
    }

    pub fn version(&self, pid: RecordId, vid: RecordId) -> Option<Record> {
        match self.store().versions.get(&vid) {
            Some((parent, record)) if *parent == pid => Some(record.clone()),
            _ => None,
        }
    }

    pub fn file(&self, pid: RecordId, vid: RecordId, fid: RecordId) -> Option<Record> {
        match self.store().files.get(&fid) {
            Some((p, v, record)) if *p == pid && *v == vid => Some(record.clone()),
            _ => None,
        }
    }
}

fn to_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn get_products(&self) -> Result<Vec<Record>, ClientError> {
        let store = self.enter("get_products", &[], None)?;
        Ok(store.products.values().cloned().collect())
    }

    async fn get_product(&self, product_id: RecordId) -> Result<Record, ClientError> {
        let store = self.enter("get_product", &[product_id], None)?;
        store.has_product(product_id)?;
        Ok(store.products[&product_id].clone())
    }

    async fn create_product(&self, metadata: &Metadata) -> Result<RecordId, ClientError> {
        let mut store = self.enter("create_product", &[], Some(metadata))?;
        let (id, record) = store.assign(metadata.clone());
        store.products.insert(id, record);
        Self::created(&mut store, id);
        Ok(id)
    }

    async fn update_product(&self, metadata: &Metadata) -> Result<(), ClientError> {
        let mut store = self.enter("update_product", &[], Some(metadata))?;
        let id = body_id(metadata)?;
        store.has_product(id)?;
        if let Some(record) = store.products.get_mut(&id) {
            merge(record, metadata);
        }
        Ok(())
    }

    async fn delete_product(&self, product_id: RecordId) -> Result<(), ClientError> {
        let mut store = self.enter("delete_product", &[product_id], None)?;
        store.has_product(product_id)?;
        if store.versions.values().any(|(pid, _)| *pid == product_id) {
            return Err(ClientError::api(400, "product still has versions"));
        }
        store.products.remove(&product_id);
        Ok(())
    }

    async fn get_versions(&self, product_id: RecordId) -> Result<Vec<Record>, ClientError> {
        let store = self.enter("get_versions", &[product_id], None)?;
        store.has_product(product_id)?;
        Ok(store
            .versions
            .values()
            .filter(|(pid, _)| *pid == product_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn get_version(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<Record, ClientError> {
        let store = self.enter("get_version", &[product_id, version_id], None)?;
        store.has_version(product_id, version_id)?;
        Ok(store.versions[&version_id].1.clone())
    }

    async fn create_version(
        &self,
        product_id: RecordId,
        metadata: &Metadata,
    ) -> Result<RecordId, ClientError> {
        let mut store = self.enter("create_version", &[product_id], Some(metadata))?;
        store.has_product(product_id)?;
        let (id, record) = store.assign(metadata.clone());
        store.versions.insert(id, (product_id, record));
        Self::created(&mut store, id);
        Ok(id)
    }

    async fn update_version(
        &self,
        product_id: RecordId,
        metadata: &Metadata,
    ) -> Result<(), ClientError> {
        let mut store = self.enter("update_version", &[product_id], Some(metadata))?;
        let id = body_id(metadata)?;
        store.has_version(product_id, id)?;
        if let Some((_, record)) = store.versions.get_mut(&id) {
            merge(record, metadata);
        }
        Ok(())
    }

    async fn delete_version(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<(), ClientError> {
        let mut store = self.enter("delete_version", &[product_id, version_id], None)?;
        store.has_version(product_id, version_id)?;
        if store.files.values().any(|(_, vid, _)| *vid == version_id) {
            return Err(ClientError::api(400, "version still has files"));
        }
        store.versions.remove(&version_id);
        Ok(())
    }

    async fn get_files(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<Vec<Record>, ClientError> {
        let store = self.enter("get_files", &[product_id, version_id], None)?;
        store.has_version(product_id, version_id)?;
        Ok(store
            .files
            .values()
            .filter(|(_, vid, _)| *vid == version_id)
            .map(|(_, _, record)| record.clone())
            .collect())
    }

    async fn get_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        file_id: RecordId,
    ) -> Result<Record, ClientError> {
        let store = self.enter("get_file", &[product_id, version_id, file_id], None)?;
        store.has_version(product_id, version_id)?;
        match store.files.get(&file_id) {
            Some((_, vid, record)) if *vid == version_id => Ok(record.clone()),
            _ => Err(ClientError::api(404, format!("file {} not found", file_id))),
        }
    }

    async fn create_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        metadata: &Metadata,
    ) -> Result<RecordId, ClientError> {
        let mut store = self.enter("create_file", &[product_id, version_id], Some(metadata))?;
        store.has_version(product_id, version_id)?;
        let (id, record) = store.assign(metadata.clone());
        store.files.insert(id, (product_id, version_id, record));
        Self::created(&mut store, id);
        Ok(id)
    }

    async fn update_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        metadata: &Metadata,
    ) -> Result<(), ClientError> {
        let mut store = self.enter("update_file", &[product_id, version_id], Some(metadata))?;
        store.has_version(product_id, version_id)?;
        let id = body_id(metadata)?;
        match store.files.get_mut(&id) {
            Some((_, vid, record)) if *vid == version_id => {
                merge(record, metadata);
                Ok(())
            }
            _ => Err(ClientError::api(404, format!("file {} not found", id))),
        }
    }

    async fn delete_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        file_id: RecordId,
    ) -> Result<(), ClientError> {
        let mut store = self.enter("delete_file", &[product_id, version_id, file_id], None)?;
        store.has_version(product_id, version_id)?;
        let owned = matches!(store.files.get(&file_id), Some((_, vid, _)) if *vid == version_id);
        if !owned {
            return Err(ClientError::api(404, format!("file {} not found", file_id)));
        }
        store.files.remove(&file_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Exception,
}

/// [`SyncLog`] that keeps every message for assertions
#[derive(Debug, Default)]
pub struct RecordingLog {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingLog {
    fn push(&self, level: Level, message: String) {
        self.messages.lock().unwrap().push((level, message));
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }

    pub fn count(&self, level: Level) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }
}

impl SyncLog for RecordingLog {
    fn debug(&self, message: &str) {
        self.push(Level::Debug, message.to_string());
    }

    fn info(&self, message: &str) {
        self.push(Level::Info, message.to_string());
    }

    fn warning(&self, message: &str) {
        self.push(Level::Warning, message.to_string());
    }

    fn exception(&self, message: &str, error: &dyn Error) {
        self.push(Level::Exception, format!("{}: {}", message, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Metadata {
        to_record(value)
    }

    /// Drive every trait method once so a new `CatalogApi` method cannot
    /// go unimplemented or unexercised by the fake
    #[tokio::test]
    async fn test_fake_covers_every_catalog_method() {
        let fake = FakeCatalog::new();
        let api: &dyn CatalogApi = &fake;

        let pid = api.create_product(&meta(json!({"name": "X"}))).await.unwrap();
        api.get_products().await.unwrap();
        api.get_product(pid).await.unwrap();
        api.update_product(&meta(json!({"id": pid, "name": "Y"}))).await.unwrap();

        let vid = api
            .create_version(pid, &meta(json!({"versionName": "v1"})))
            .await
            .unwrap();
        api.get_versions(pid).await.unwrap();
        api.get_version(pid, vid).await.unwrap();
        api.update_version(pid, &meta(json!({"id": vid, "versionName": "v2"})))
            .await
            .unwrap();

        let fid = api
            .create_file(pid, vid, &meta(json!({"downloadURL": "/a"})))
            .await
            .unwrap();
        api.get_files(pid, vid).await.unwrap();
        api.get_file(pid, vid, fid).await.unwrap();
        api.update_file(pid, vid, &meta(json!({"id": fid, "label": "l"})))
            .await
            .unwrap();

        api.delete_file(pid, vid, fid).await.unwrap();
        api.delete_version(pid, vid).await.unwrap();
        api.delete_product(pid).await.unwrap();

        let called: HashSet<&str> = fake.calls().iter().map(|c| c.method).collect();
        for method in CATALOG_METHODS {
            assert!(called.contains(method), "{} was not exercised", method);
        }
        assert_eq!(fake.product(pid), None);
    }

    #[tokio::test]
    async fn test_hierarchy_is_enforced() {
        let fake = FakeCatalog::new();
        let pid = fake.seed_product(json!({"name": "X"}));
        let vid = fake.seed_version(pid, json!({"versionName": "v1"}));

        let err = fake.delete_product(pid).await.unwrap_err();
        assert_eq!(err.status(), Some(400));

        let err = fake
            .create_file(pid, vid + 10, &Metadata::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let fake = FakeCatalog::new();
        fake.fail_on("get_products");

        let err = fake.get_products().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(fake.call_count("get_products"), 1);
    }

    #[test]
    fn test_recording_log_levels() {
        let log = RecordingLog::default();
        log.info("one");
        log.warning("two");
        log.exception("three", &ClientError::Decode("bad".into()));

        assert_eq!(log.count(Level::Info), 1);
        assert_eq!(log.count(Level::Warning), 1);
        assert!(log.contains("three: "));
        assert_eq!(log.messages().len(), 3);
    }
}
