// tsense - a typed Typesense client for Rust
//
// Collection schemas are derived from record types, provisioned under
// versioned physical names and reached through stable aliases.

// Re-export core functionality
pub use tsense_client::*;

// Re-export the derive macro
pub use tsense_derive::Describe;

// Logging macros and configuration
pub use tsense_log;

// Re-export optional crates
#[cfg(feature = "http")]
pub use tsense_http;

// Re-export for implementing MetadataService and serializing documents
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;

/// Prelude module for convenient imports
pub mod prelude {
    pub use tsense_client::prelude::*;
    pub use tsense_derive::Describe;
}
