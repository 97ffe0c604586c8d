//! Typed Typesense client with schema-derived migrations.
//!
//! This crate provides:
//! - Schema derivation from record types implementing [`Describe`]
//! - Versioned collections behind stable aliases, with zero-downtime rebinding
//! - A process-local alias cache shared by every client of one [`Client`]
//! - Document and search clients that resolve their collection through it
//! - [`Timestamp`], the epoch-second date-time type matching `int64` schemas
//!
//! # Example
//!
//! ```rust,no_run
//! use tsense_client::{Client, ClientConfig, DeclaredKind, Describe, FieldDescriptor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Order {
//!     id: String,
//!     total: f64,
//!     paid: bool,
//! }
//!
//! impl Describe for Order {
//!     fn type_name() -> &'static str {
//!         "Order"
//!     }
//!
//!     fn fields() -> Vec<FieldDescriptor> {
//!         vec![
//!             FieldDescriptor::new("id", DeclaredKind::Text),
//!             FieldDescriptor::new("total", DeclaredKind::Float64).default_sort(),
//!             FieldDescriptor::new("paid", DeclaredKind::Bool).required(),
//!         ]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new("http://localhost:8108", "xyz"))?;
//!
//!     // Creates order_<date>_<token> and binds the alias `order` to it
//!     client.migration::<Order>().auto().await?;
//!
//!     let order = Order { id: "1".into(), total: 9.5, paid: true };
//!     client.documents::<Order>().index(&order).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod alias;
mod client;
mod collection;
mod config;
mod document;
mod error;
mod metadata;
mod migration;
mod search;
mod timestamp;

pub mod memory;
pub mod naming;
pub mod schema;

pub use alias::{Alias, AliasCache};
pub use client::Client;
pub use collection::{
    Collection, CollectionField, CollectionFieldUpdate, CollectionUpdate, FieldType, SchemaDiff,
    derive_schema, schema_from_descriptors,
};
pub use config::ClientConfig;
pub use document::{DirtyValues, Document, DocumentAction, DocumentClient, to_json_lines};
pub use error::{Result, TsenseError};
pub use memory::MemoryMetadataService;
pub use metadata::{API_KEY_HEADER, HttpMetadataService, MetadataService};
pub use migration::{Migration, MigrationOutcome};
pub use schema::{Annotations, DeclaredKind, Describe, FieldDescriptor, introspect};
pub use search::{
    GroupedHits, Highlight, Hit, RequestParams, SearchClient, SearchGroupedParameters,
    SearchParameters, SearchResult, SearchResultGrouped,
};
pub use timestamp::Timestamp;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Client, ClientConfig, Collection, CollectionField, DeclaredKind, Describe, DirtyValues,
        Document, DocumentAction, FieldDescriptor, FieldType, MigrationOutcome, Result,
        SearchGroupedParameters, SearchParameters, Timestamp, TsenseError,
    };
}
