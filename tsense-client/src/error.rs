//! Error types for tsense operations.

use crate::collection::SchemaDiff;
use thiserror::Error;

/// tsense error type.
#[derive(Error, Debug)]
pub enum TsenseError {
    /// A field's declared type has no remote type mapping.
    #[error("Unsupported field type {declared} for field {field}")]
    UnsupportedFieldType {
        /// Resolved field name.
        field: String,
        /// Declared type as written on the record.
        declared: String,
    },

    /// Two fields both claim to be the default sort field.
    #[error("You cannot have more than one default sort field ({first}, {second})")]
    MultipleDefaultSortFields {
        /// Field that claimed it first.
        first: String,
        /// Field that claimed it second.
        second: String,
    },

    /// Non-success status from the service.
    #[error("Bad response with code {status}: {body}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// An existing collection's schema differs from the desired one.
    #[error("Schema reconciliation unsupported for collection {collection}: {diff}")]
    ReconciliationUnsupported {
        /// Physical collection name.
        collection: String,
        /// What differs between the two schemas.
        diff: SchemaDiff,
    },

    /// No alias is bound to the logical name.
    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    /// Document not found.
    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound {
        /// Physical collection name.
        collection: String,
        /// Document ID.
        id: String,
    },

    /// Some lines of a bulk import were rejected.
    #[error("Import failed: {succeeded} succeeded, {failed} failed")]
    Import {
        /// Number of accepted documents.
        succeeded: usize,
        /// Number of rejected documents.
        failed: usize,
        /// Error message of each rejected document.
        errors: Vec<String>,
    },

    /// Invalid configuration or argument.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] tsense_http::HttpClientError),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TsenseError {
    /// Build a [`TsenseError::Remote`] from a non-success response.
    pub(crate) fn remote(response: &tsense_http::Response) -> Self {
        TsenseError::Remote {
            status: response.status().as_u16(),
            body: response.text(),
        }
    }

    /// Get the HTTP status code if the service rejected the call.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for tsense operations.
pub type Result<T> = std::result::Result<T, TsenseError>;
