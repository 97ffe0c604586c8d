//! In-memory metadata service.
//!
//! Behaves like the remote service for collection and alias metadata and
//! counts every call, so migrations and alias resolution can be exercised
//! without a server.

use crate::alias::Alias;
use crate::collection::{Collection, CollectionFieldUpdate, CollectionUpdate};
use crate::error::{Result, TsenseError};
use crate::metadata::MetadataService;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory [`MetadataService`].
#[derive(Debug, Default)]
pub struct MemoryMetadataService {
    collections: RwLock<HashMap<String, Collection>>,
    aliases: RwLock<HashMap<String, String>>,
    failure: RwLock<Option<(u16, String)>>,
    bind_failure: RwLock<Option<(u16, String)>>,
    lookup_failure: RwLock<Option<(u16, String)>>,
    alias_lookups: AtomicUsize,
    collection_lookups: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryMetadataService {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection without counting a write.
    pub fn put_collection(&self, collection: Collection) {
        self.collections
            .write()
            .insert(collection.name.clone(), collection);
    }

    /// Seed an alias without counting a write.
    pub fn put_alias(&self, alias: Alias) {
        self.aliases
            .write()
            .insert(alias.name, alias.collection_name);
    }

    /// Make every subsequent write fail with the given status and body.
    pub fn fail_writes(&self, status: u16, body: impl Into<String>) {
        *self.failure.write() = Some((status, body.into()));
    }

    /// Make alias binds fail while other writes succeed.
    pub fn fail_bind_alias(&self, status: u16, body: impl Into<String>) {
        *self.bind_failure.write() = Some((status, body.into()));
    }

    /// Make alias lookups fail with the given status and body.
    pub fn fail_alias_lookups(&self, status: u16, body: impl Into<String>) {
        *self.lookup_failure.write() = Some((status, body.into()));
    }

    /// Stored collection by physical name.
    pub fn collection(&self, name: &str) -> Option<Collection> {
        self.collections.read().get(name).cloned()
    }

    /// Physical collection bound to a logical name.
    pub fn alias_target(&self, name: &str) -> Option<String> {
        self.aliases.read().get(name).cloned()
    }

    /// Names of every stored collection, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of `get_alias` calls served.
    pub fn alias_lookups(&self) -> usize {
        self.alias_lookups.load(Ordering::SeqCst)
    }

    /// Number of `get_collection` calls served.
    pub fn collection_lookups(&self) -> usize {
        self.collection_lookups.load(Ordering::SeqCst)
    }

    /// Number of write calls received, failed ones included.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn begin_write(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        injected(&self.failure)
    }
}

fn injected(slot: &RwLock<Option<(u16, String)>>) -> Result<()> {
    match &*slot.read() {
        Some((status, body)) => Err(TsenseError::Remote {
            status: *status,
            body: body.clone(),
        }),
        None => Ok(()),
    }
}

fn not_found(kind: &str, name: &str) -> TsenseError {
    TsenseError::Remote {
        status: 404,
        body: format!("{{\"message\": \"{kind} {name} not found\"}}"),
    }
}

#[async_trait]
impl MetadataService for MemoryMetadataService {
    async fn get_collection(&self, name: &str) -> Result<Option<Collection>> {
        self.collection_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.collection(name))
    }

    async fn create_collection(&self, collection: &Collection) -> Result<()> {
        self.begin_write()?;
        let mut collections = self.collections.write();
        if collections.contains_key(&collection.name) {
            return Err(TsenseError::Remote {
                status: 409,
                body: format!(
                    "{{\"message\": \"A collection with name `{}` already exists.\"}}",
                    collection.name
                ),
            });
        }
        collections.insert(collection.name.clone(), collection.clone());
        Ok(())
    }

    async fn update_collection(&self, name: &str, update: &CollectionUpdate) -> Result<()> {
        self.begin_write()?;
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| not_found("Collection", name))?;

        for change in &update.fields {
            match change {
                CollectionFieldUpdate::Drop { name, .. } => {
                    collection.fields.retain(|f| &f.name != name);
                }
                CollectionFieldUpdate::Add(field) => collection.fields.push(field.clone()),
            }
        }
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.begin_write()?;
        self.collections
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Collection", name))
    }

    async fn get_alias(&self, name: &str) -> Result<Option<Alias>> {
        self.alias_lookups.fetch_add(1, Ordering::SeqCst);
        injected(&self.lookup_failure)?;
        Ok(self
            .alias_target(name)
            .map(|collection_name| Alias::new(name, collection_name)))
    }

    async fn bind_alias(&self, alias: &Alias) -> Result<()> {
        self.begin_write()?;
        injected(&self.bind_failure)?;
        self.aliases
            .write()
            .insert(alias.name.clone(), alias.collection_name.clone());
        Ok(())
    }

    async fn delete_alias(&self, name: &str) -> Result<()> {
        self.begin_write()?;
        self.aliases
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Alias", name))
    }
}
