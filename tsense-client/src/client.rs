//! Client facade.

use crate::alias::AliasCache;
use crate::config::ClientConfig;
use crate::document::{Document, DocumentClient};
use crate::error::Result;
use crate::metadata::{HttpMetadataService, MetadataService};
use crate::migration::Migration;
use crate::schema::Describe;
use crate::search::SearchClient;
use std::sync::Arc;
use tsense_http::HttpClient;

/// Entry point: owns the transport and the alias cache shared by every
/// migration, document and search client it hands out.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: HttpClient,
    cache: AliasCache,
}

impl Client {
    /// Create a client talking to the service described by `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(config.http_config())?;
        let service = Arc::new(HttpMetadataService::new(http.clone()));
        tsense_log::debug!("tsense client created for {}", config.host);
        Ok(Self {
            config: Arc::new(config),
            http,
            cache: AliasCache::new(service),
        })
    }

    /// Create a client resolving collection and alias metadata through `service`.
    pub fn with_metadata_service(
        config: ClientConfig,
        service: Arc<dyn MetadataService>,
    ) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(config.http_config())?;
        Ok(Self {
            config: Arc::new(config),
            http,
            cache: AliasCache::new(service),
        })
    }

    /// Create a client from `TSENSE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the shared alias cache.
    pub fn alias_cache(&self) -> &AliasCache {
        &self.cache
    }

    /// Migrations for `T`.
    pub fn migration<T: Describe>(&self) -> Migration<T> {
        Migration::new(self.cache.clone())
    }

    /// Document operations for `T`.
    pub fn documents<T: Document>(&self) -> DocumentClient<T> {
        DocumentClient::new(
            self.http.clone(),
            self.cache.clone(),
            self.config.batch_size,
            self.config.dirty_values,
        )
    }

    /// Searches over `T`.
    pub fn search<T: Document>(&self) -> SearchClient<T> {
        SearchClient::new(
            self.http.clone(),
            self.cache.clone(),
            self.config.search_cache,
            self.config.search_cache_ttl,
        )
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("alias_cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMetadataService;
    use crate::schema::{DeclaredKind, FieldDescriptor};

    struct Widget;

    impl Describe for Widget {
        fn type_name() -> &'static str {
            "Widget"
        }

        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::new("id", DeclaredKind::Text)]
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(Client::new(ClientConfig::new("", "key")).is_err());
    }

    #[tokio::test]
    async fn test_migration_binding_is_visible_through_shared_cache() {
        let service = Arc::new(MemoryMetadataService::new());
        let client = Client::with_metadata_service(
            ClientConfig::new("http://localhost:8108", "key"),
            service.clone(),
        )
        .unwrap();

        let outcome = client.migration::<Widget>().auto().await.unwrap();
        let lookups = service.alias_lookups();

        let resolved = client.alias_cache().resolve("widget").await.unwrap();
        assert_eq!(resolved.as_deref(), Some(outcome.collection()));
        assert_eq!(service.alias_lookups(), lookups);
    }
}
