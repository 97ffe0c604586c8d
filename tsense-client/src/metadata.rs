//! Collection and alias metadata service.

use crate::alias::Alias;
use crate::collection::{Collection, CollectionUpdate};
use crate::error::{Result, TsenseError};
use async_trait::async_trait;
use tsense_http::{HttpClient, Response, StatusCode};

/// API key header expected by the service.
pub const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Remote collection and alias metadata operations.
///
/// Lookups return `Ok(None)` when the service reports the target does not
/// exist; any other non-success status is a [`TsenseError::Remote`].
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Fetch a collection schema by physical name.
    async fn get_collection(&self, name: &str) -> Result<Option<Collection>>;

    /// Create a collection.
    async fn create_collection(&self, collection: &Collection) -> Result<()>;

    /// Apply a schema change to an existing collection.
    async fn update_collection(&self, name: &str, update: &CollectionUpdate) -> Result<()>;

    /// Delete a collection and its documents.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Fetch the alias bound to a logical name.
    async fn get_alias(&self, name: &str) -> Result<Option<Alias>>;

    /// Bind (or rebind) a logical name to a physical collection.
    async fn bind_alias(&self, alias: &Alias) -> Result<()>;

    /// Remove an alias binding.
    async fn delete_alias(&self, name: &str) -> Result<()>;
}

/// [`MetadataService`] backed by the service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpMetadataService {
    http: HttpClient,
}

impl HttpMetadataService {
    /// Wrap an HTTP client already configured with base URL and API key header.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Get the underlying HTTP client.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(TsenseError::remote(&response))
    }
}

fn found<T: serde::de::DeserializeOwned>(response: Response) -> Result<Option<T>> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = ensure_success(response)?;
    Ok(Some(response.json()?))
}

#[async_trait]
impl MetadataService for HttpMetadataService {
    async fn get_collection(&self, name: &str) -> Result<Option<Collection>> {
        let response = self.http.get(format!("/collections/{name}")).send().await?;
        found(response)
    }

    async fn create_collection(&self, collection: &Collection) -> Result<()> {
        tsense_log::debug!("Creating collection: {}", collection.name);
        let response = self.http.post("/collections").json(collection).send().await?;
        ensure_success(response)?;
        Ok(())
    }

    async fn update_collection(&self, name: &str, update: &CollectionUpdate) -> Result<()> {
        tsense_log::debug!("Updating collection: {}", name);
        let response = self
            .http
            .patch(format!("/collections/{name}"))
            .json(update)
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        tsense_log::debug!("Deleting collection: {}", name);
        let response = self.http.delete(format!("/collections/{name}")).send().await?;
        ensure_success(response)?;
        Ok(())
    }

    async fn get_alias(&self, name: &str) -> Result<Option<Alias>> {
        let response = self.http.get(format!("/aliases/{name}")).send().await?;
        found(response)
    }

    async fn bind_alias(&self, alias: &Alias) -> Result<()> {
        tsense_log::debug!("Binding alias {} -> {}", alias.name, alias.collection_name);
        let response = self
            .http
            .put(format!("/aliases/{}", alias.name))
            .json(&serde_json::json!({ "collection_name": alias.collection_name }))
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    async fn delete_alias(&self, name: &str) -> Result<()> {
        tsense_log::debug!("Deleting alias: {}", name);
        let response = self.http.delete(format!("/aliases/{name}")).send().await?;
        ensure_success(response)?;
        Ok(())
    }
}
