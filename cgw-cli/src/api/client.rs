//! reqwest-backed Content Gateway client

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Method;
use serde_json::Value;

use super::catalog::CatalogApi;
use super::error::ClientError;
use super::models::{Metadata, Record, RecordId, into_record, into_records, parse_record_id};
use super::resilience::{RequestLogging, ResilienceConfig, RetryPolicy};

/// HTTP client for the Content Gateway REST API
#[derive(Debug, Clone)]
pub struct CgwClient {
    http: reqwest::Client,
    hostname: String,
    username: String,
    password: String,
    retry: RetryPolicy,
    logging: RequestLogging,
}

impl CgwClient {
    /// Create a client authenticating with HTTP basic auth
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        resilience: ResilienceConfig,
    ) -> Result<Self, ClientError> {
        let hostname = hostname.into().trim_end_matches('/').to_string();
        let username = username.into();
        let password = password.into();

        if hostname.is_empty() {
            return Err(ClientError::Auth("No content gateway hostname found".to_string()));
        }
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::Auth("username / password not found".to_string()));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("cgw-cli/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!resilience.verify_tls)
            .build()?;
        if !resilience.verify_tls {
            warn!("TLS certificate verification is disabled for {}", hostname);
        }

        Ok(Self {
            http,
            hostname,
            username,
            password,
            retry: RetryPolicy::new(resilience.retry),
            logging: resilience.logging,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.hostname, endpoint)
    }

    /// Issue one API call (with retries) and decode the JSON answer.
    /// An empty body decodes to `Value::Null`.
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Metadata>,
    ) -> Result<Value, ClientError> {
        let url = self.url(endpoint);
        let label = format!("{} {}", method, endpoint);
        let (url, method, label_ref) = (&url, &method, &label);

        self.retry
            .execute(&label, move || async move {
                if self.logging.requests {
                    debug!("CGW request: {}", label_ref);
                }

                let mut request = self
                    .http
                    .request(method.clone(), url)
                    .basic_auth(&self.username, Some(&self.password));
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = request.send().await?;
                let status = response.status();
                let text = response.text().await?;

                if !status.is_success() {
                    if self.logging.error_bodies {
                        error!("CGW {} answered {}: {}", label_ref, status, text);
                    }
                    return Err(ClientError::api(status.as_u16(), text));
                }

                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&text).map_err(|e| {
                    ClientError::Decode(format!("{} returned invalid JSON: {}", label_ref, e))
                })
            })
            .await
    }
}

#[async_trait]
impl CatalogApi for CgwClient {
    async fn get_products(&self) -> Result<Vec<Record>, ClientError> {
        into_records(self.call(Method::GET, "/products", None).await?)
    }

    async fn get_product(&self, product_id: RecordId) -> Result<Record, ClientError> {
        let endpoint = format!("/products/{}", product_id);
        into_record(self.call(Method::GET, &endpoint, None).await?)
    }

    async fn create_product(&self, metadata: &Metadata) -> Result<RecordId, ClientError> {
        parse_record_id(&self.call(Method::PUT, "/products/", Some(metadata)).await?)
    }

    async fn update_product(&self, metadata: &Metadata) -> Result<(), ClientError> {
        self.call(Method::POST, "/products", Some(metadata)).await?;
        Ok(())
    }

    async fn delete_product(&self, product_id: RecordId) -> Result<(), ClientError> {
        let endpoint = format!("/products/{}", product_id);
        self.call(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    async fn get_versions(&self, product_id: RecordId) -> Result<Vec<Record>, ClientError> {
        let endpoint = format!("/products/{}/versions", product_id);
        into_records(self.call(Method::GET, &endpoint, None).await?)
    }

    async fn get_version(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<Record, ClientError> {
        let endpoint = format!("/products/{}/versions/{}", product_id, version_id);
        into_record(self.call(Method::GET, &endpoint, None).await?)
    }

    async fn create_version(
        &self,
        product_id: RecordId,
        metadata: &Metadata,
    ) -> Result<RecordId, ClientError> {
        let endpoint = format!("/products/{}/versions/", product_id);
        parse_record_id(&self.call(Method::PUT, &endpoint, Some(metadata)).await?)
    }

    async fn update_version(
        &self,
        product_id: RecordId,
        metadata: &Metadata,
    ) -> Result<(), ClientError> {
        let endpoint = format!("/products/{}/versions", product_id);
        self.call(Method::POST, &endpoint, Some(metadata)).await?;
        Ok(())
    }

    async fn delete_version(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<(), ClientError> {
        let endpoint = format!("/products/{}/versions/{}", product_id, version_id);
        self.call(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    async fn get_files(
        &self,
        product_id: RecordId,
        version_id: RecordId,
    ) -> Result<Vec<Record>, ClientError> {
        let endpoint = format!("/products/{}/versions/{}/files", product_id, version_id);
        into_records(self.call(Method::GET, &endpoint, None).await?)
    }

    async fn get_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        file_id: RecordId,
    ) -> Result<Record, ClientError> {
        let endpoint = format!(
            "/products/{}/versions/{}/files/{}",
            product_id, version_id, file_id
        );
        into_record(self.call(Method::GET, &endpoint, None).await?)
    }

    async fn create_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        metadata: &Metadata,
    ) -> Result<RecordId, ClientError> {
        let endpoint = format!("/products/{}/versions/{}/files", product_id, version_id);
        parse_record_id(&self.call(Method::PUT, &endpoint, Some(metadata)).await?)
    }

    async fn update_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        metadata: &Metadata,
    ) -> Result<(), ClientError> {
        let endpoint = format!("/products/{}/versions/{}/files", product_id, version_id);
        self.call(Method::POST, &endpoint, Some(metadata)).await?;
        Ok(())
    }

    async fn delete_file(
        &self,
        product_id: RecordId,
        version_id: RecordId,
        file_id: RecordId,
    ) -> Result<(), ClientError> {
        let endpoint = format!(
            "/products/{}/versions/{}/files/{}",
            product_id, version_id, file_id
        );
        self.call(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }
}
