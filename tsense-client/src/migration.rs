//! Migration engine: collection provisioning, versioning and alias binding.

use crate::alias::{Alias, AliasCache};
use crate::collection::{self, Collection, CollectionUpdate};
use crate::error::{Result, TsenseError};
use crate::metadata::MetadataService;
use crate::naming;
use crate::schema::Describe;
use std::marker::PhantomData;
use std::sync::Arc;

/// Result of a successful migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// A collection was created.
    Created {
        /// Physical name of the new collection.
        collection: String,
        /// Logical name bound to it, when aliasing was used.
        alias: Option<String>,
    },
    /// The stored schema already matches; nothing was written.
    Unchanged {
        /// Physical name of the existing collection.
        collection: String,
    },
}

impl MigrationOutcome {
    /// Physical collection the logical name now refers to.
    pub fn collection(&self) -> &str {
        match self {
            MigrationOutcome::Created { collection, .. } => collection,
            MigrationOutcome::Unchanged { collection } => collection,
        }
    }

    /// True when a collection was created.
    pub fn is_created(&self) -> bool {
        matches!(self, MigrationOutcome::Created { .. })
    }
}

/// Schema migrations for the record type `T`.
///
/// Obtained from [`Client::migration`](crate::Client::migration); shares the
/// client's alias cache, so a binding made here is visible to every document
/// and search client of the same [`Client`](crate::Client).
pub struct Migration<T> {
    cache: AliasCache,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Migration<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Migration<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("record", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Describe> Migration<T> {
    /// Create a migration using `cache` and its metadata service.
    pub fn new(cache: AliasCache) -> Self {
        Self {
            cache,
            _record: PhantomData,
        }
    }

    fn service(&self) -> &Arc<dyn MetadataService> {
        self.cache.service()
    }

    /// Derive the collection schema of `T`, named after the type.
    pub fn model_to_collection(&self) -> Result<Collection> {
        collection::derive_schema::<T>()
    }

    /// Derive the schema of `T` and migrate it behind an alias.
    pub async fn auto(&self) -> Result<MigrationOutcome> {
        let collection = self.model_to_collection()?;
        self.manual(&collection, true).await
    }

    /// Migrate an explicit schema.
    ///
    /// With `use_alias`, `collection.name` is the logical name: an existing
    /// binding is looked up, and a new collection gets a versioned physical
    /// name that the alias is then bound to. Without it, the collection is
    /// looked up and created under its literal name.
    ///
    /// An existing collection with a different schema fails with
    /// [`TsenseError::ReconciliationUnsupported`] and nothing is written.
    pub async fn manual(&self, collection: &Collection, use_alias: bool) -> Result<MigrationOutcome> {
        let logical = collection.name.as_str();
        tsense_log::debug!("Migrating collection {} (alias: {})", logical, use_alias);

        let existing = if use_alias {
            self.get_collection_from_alias(logical).await?
        } else {
            self.get_collection(logical).await?
        };

        if let Some(remote) = existing {
            let mut desired = collection.canonical();
            desired.name = remote.name.clone();
            let remote = remote.canonical();

            if desired != remote {
                return Err(TsenseError::ReconciliationUnsupported {
                    diff: desired.diff(&remote),
                    collection: remote.name,
                });
            }

            if use_alias {
                self.cache.insert(logical, remote.name.clone());
            }
            tsense_log::debug!("Collection {} is up to date", remote.name);
            return Ok(MigrationOutcome::Unchanged {
                collection: remote.name,
            });
        }

        let mut target = collection.clone();
        if use_alias {
            target.name = self.version_collection_name(logical);
        }

        self.new_collection(&target).await?;

        if !use_alias {
            return Ok(MigrationOutcome::Created {
                collection: target.name,
                alias: None,
            });
        }

        self.alias_collection(&Alias::new(logical, target.name.clone()))
            .await?;
        Ok(MigrationOutcome::Created {
            collection: target.name,
            alias: Some(logical.to_string()),
        })
    }

    /// Bind a logical name to a physical collection and record it in the cache.
    pub async fn alias_collection(&self, alias: &Alias) -> Result<()> {
        self.service().bind_alias(alias).await?;
        self.cache
            .insert(alias.name.clone(), alias.collection_name.clone());
        tsense_log::info!("Alias {} -> {}", alias.name, alias.collection_name);
        Ok(())
    }

    /// Remove an alias binding.
    ///
    /// Entries already cached by this process are left in place.
    pub async fn delete_alias(&self, name: &str) -> Result<()> {
        self.service().delete_alias(name).await
    }

    /// Current remote binding of a logical name, bypassing the cache.
    pub async fn get_alias(&self, name: &str) -> Result<Option<Alias>> {
        self.service().get_alias(name).await
    }

    /// Collection by physical name.
    pub async fn get_collection(&self, name: &str) -> Result<Option<Collection>> {
        self.service().get_collection(name).await
    }

    /// Collection an alias points to.
    ///
    /// `None` when the alias is unbound or points at a collection that no
    /// longer exists.
    pub async fn get_collection_from_alias(&self, name: &str) -> Result<Option<Collection>> {
        match self.get_alias(name).await? {
            Some(alias) => self.get_collection(&alias.collection_name).await,
            None => Ok(None),
        }
    }

    /// Create a collection under its literal name.
    pub async fn new_collection(&self, collection: &Collection) -> Result<()> {
        self.service().create_collection(collection).await?;
        tsense_log::info!("Created collection {}", collection.name);
        Ok(())
    }

    /// Apply a schema change to a collection.
    pub async fn update_collection(&self, name: &str, update: &CollectionUpdate) -> Result<()> {
        self.service().update_collection(name, update).await
    }

    /// Delete a collection and its documents.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.service().delete_collection(name).await?;
        tsense_log::info!("Deleted collection {}", name);
        Ok(())
    }

    /// Versioned physical name for a logical name, dated today.
    pub fn version_collection_name(&self, logical: &str) -> String {
        naming::version_collection_name(logical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionField, FieldType};
    use crate::memory::MemoryMetadataService;
    use crate::schema::{DeclaredKind, FieldDescriptor};

    struct Order;

    impl Describe for Order {
        fn type_name() -> &'static str {
            "Order"
        }

        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("id", DeclaredKind::Text),
                FieldDescriptor::new("total", DeclaredKind::Float64).default_sort(),
                FieldDescriptor::new("paid", DeclaredKind::Bool).required(),
            ]
        }
    }

    struct Broken;

    impl Describe for Broken {
        fn type_name() -> &'static str {
            "Broken"
        }

        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("a", DeclaredKind::Int64).default_sort(),
                FieldDescriptor::new("b", DeclaredKind::Int64).default_sort(),
            ]
        }
    }

    fn setup() -> (Arc<MemoryMetadataService>, Migration<Order>) {
        let service = Arc::new(MemoryMetadataService::new());
        let migration = Migration::new(AliasCache::new(service.clone()));
        (service, migration)
    }

    #[tokio::test]
    async fn test_auto_creates_versioned_collection_and_alias() {
        let (service, migration) = setup();

        let outcome = migration.auto().await.unwrap();
        let physical = outcome.collection().to_string();

        assert!(outcome.is_created());
        assert!(physical.starts_with("order_"));
        assert_eq!(service.alias_target("order").as_deref(), Some(physical.as_str()));
        assert_eq!(service.collection(&physical).unwrap().fields.len(), 3);
        assert_eq!(migration.cache.get("order").as_deref(), Some(physical.as_str()));
    }

    #[tokio::test]
    async fn test_auto_twice_is_a_no_op() {
        let (service, migration) = setup();

        let first = migration.auto().await.unwrap();
        let writes = service.writes();

        let second = migration.auto().await.unwrap();
        assert_eq!(
            second,
            MigrationOutcome::Unchanged {
                collection: first.collection().to_string()
            }
        );
        assert_eq!(service.writes(), writes);
        assert_eq!(service.collection_names().len(), 1);
    }

    #[tokio::test]
    async fn test_differing_schema_is_not_reconciled() {
        let (service, migration) = setup();
        service.put_collection(
            Collection::new("order_2024-01-02_old")
                .field(CollectionField::new("id", FieldType::String)),
        );
        service.put_alias(Alias::new("order", "order_2024-01-02_old"));

        let err = migration.auto().await.unwrap_err();
        match err {
            TsenseError::ReconciliationUnsupported { collection, diff } => {
                assert_eq!(collection, "order_2024-01-02_old");
                assert_eq!(diff.added, vec!["paid", "total"]);
                assert_eq!(diff.changed, vec!["id"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.writes(), 0);
    }

    #[tokio::test]
    async fn test_manual_without_alias_uses_literal_name() {
        let (service, migration) = setup();
        let collection = Collection::new("orders_plain")
            .field(CollectionField::new("id", FieldType::String));

        let outcome = migration.manual(&collection, false).await.unwrap();
        assert_eq!(
            outcome,
            MigrationOutcome::Created {
                collection: "orders_plain".to_string(),
                alias: None
            }
        );
        assert!(service.alias_target("orders_plain").is_none());
        assert_eq!(service.alias_lookups(), 0);

        let again = migration.manual(&collection, false).await.unwrap();
        assert!(!again.is_created());
    }

    #[tokio::test]
    async fn test_dangling_alias_is_rebound() {
        let (service, migration) = setup();
        service.put_alias(Alias::new("order", "order_gone"));

        let outcome = migration.auto().await.unwrap();
        assert!(outcome.is_created());
        assert_ne!(outcome.collection(), "order_gone");
        assert_eq!(
            service.alias_target("order").as_deref(),
            Some(outcome.collection())
        );
    }

    #[tokio::test]
    async fn test_derivation_error_makes_no_remote_call() {
        let service = Arc::new(MemoryMetadataService::new());
        let migration: Migration<Broken> = Migration::new(AliasCache::new(service.clone()));

        let err = migration.auto().await.unwrap_err();
        assert!(matches!(err, TsenseError::MultipleDefaultSortFields { .. }));
        assert_eq!(service.alias_lookups(), 0);
        assert_eq!(service.writes(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_aborts_before_binding() {
        let (service, migration) = setup();
        service.fail_writes(500, "boom");

        let err = migration.auto().await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(service.writes(), 1);
        assert!(service.alias_target("order").is_none());
        assert!(migration.cache.is_empty());
    }

    #[tokio::test]
    async fn test_bind_failure_after_create_surfaces_remote_error() {
        let (service, migration) = setup();
        service.fail_bind_alias(503, "alias store unavailable");

        let err = migration.auto().await.unwrap_err();
        match &err {
            TsenseError::Remote { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "alias store unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(service.alias_target("order").is_none());
        assert_eq!(service.collection_names().len(), 1);
        assert!(service.collection_names()[0].starts_with("order_"));
        assert!(migration.cache.is_empty());
    }

    #[tokio::test]
    async fn test_alias_lookup_failure_aborts_migration() {
        let (service, migration) = setup();
        service.fail_alias_lookups(500, "internal");

        let err = migration.auto().await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(service.writes(), 0);
        assert!(migration.cache.is_empty());
    }

    #[tokio::test]
    async fn test_collection_management_passthrough() {
        let (service, migration) = setup();
        let collection = Collection::new("scratch");

        migration.new_collection(&collection).await.unwrap();
        migration
            .update_collection(
                "scratch",
                &CollectionUpdate::new().add(CollectionField::new("n", FieldType::Int64)),
            )
            .await
            .unwrap();
        assert_eq!(
            migration.get_collection("scratch").await.unwrap().unwrap().fields.len(),
            1
        );

        migration.delete_collection("scratch").await.unwrap();
        assert!(service.collection("scratch").is_none());
    }
}
