//! The remote catalog contract consumed by the sync engine

use async_trait::async_trait;

use super::error::ClientError;
use super::models::{Metadata, Record, RecordId};

/// CRUD operations exposed by the Content Gateway.
///
/// Versions are scoped by product ID and files by product + version ID.
/// Every method fails with [`ClientError`] on any non-2xx answer.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn get_products(&self) -> Result<Vec<Record>, ClientError>;
    async fn get_product(&self, product_id: RecordId) -> Result<Record, ClientError>;
    async fn create_product(&self, metadata: &Metadata) -> Result<RecordId, ClientError>;
    /// `metadata` must carry the record `id`
    async fn update_product(&self, metadata: &Metadata) -> Result<(), ClientError>;
    async fn delete_product(&self, product_id: RecordId) -> Result<(), ClientError>;

    async fn get_versions(&self, product_id: RecordId) -> Result<Vec<Record>, ClientError>;
    async fn get_version(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<Record, ClientError>;
    async fn create_version(
        &self,
        product_id: RecordId,
        metadata: &Metadata,
    ) -> Result<RecordId, ClientError>;
    async fn update_version(
        &self,
        product_id: RecordId,
        metadata: &Metadata,
    ) -> Result<(), ClientError>;
    async fn delete_version(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<(), ClientError>;

    async fn get_files(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<Vec<Record>, ClientError>;
    async fn get_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        file_id: RecordId,
    ) -> Result<Record, ClientError>;
    async fn create_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        metadata: &Metadata,
    ) -> Result<RecordId, ClientError>;
    async fn update_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        metadata: &Metadata,
    ) -> Result<(), ClientError>;
    async fn delete_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        file_id: RecordId,
    ) -> Result<(), ClientError>;
}
