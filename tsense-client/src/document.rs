//! Document operations on an aliased collection.

use crate::alias::AliasCache;
use crate::error::{Result, TsenseError};
use crate::schema::Describe;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::Path;
use tsense_http::{HttpClient, Response, StatusCode};

/// A record type that can be stored as a document.
pub trait Document: Describe + Serialize + DeserializeOwned + Send + Sync {}

impl<T> Document for T where T: Describe + Serialize + DeserializeOwned + Send + Sync {}

/// Write behavior for a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentAction {
    /// Fail when a document with the same id exists.
    Create,
    /// Insert or fully replace.
    Upsert,
    /// Partially update existing documents.
    Update,
    /// Update when present, create otherwise.
    Emplace,
}

impl DocumentAction {
    /// Query parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentAction::Create => "create",
            DocumentAction::Upsert => "upsert",
            DocumentAction::Update => "update",
            DocumentAction::Emplace => "emplace",
        }
    }
}

/// Handling of field values that do not match the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtyValues {
    /// Coerce to the schema type, reject the document when that fails.
    CoerceOrReject,
    /// Coerce to the schema type, drop the field when that fails.
    CoerceOrDrop,
    /// Drop the field.
    Drop,
    /// Reject the document.
    Reject,
}

impl DirtyValues {
    /// Query parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DirtyValues::CoerceOrReject => "coerce_or_reject",
            DirtyValues::CoerceOrDrop => "coerce_or_drop",
            DirtyValues::Drop => "drop",
            DirtyValues::Reject => "reject",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportLine {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteSummary {
    #[serde(default)]
    num_deleted: u64,
}

/// Count accepted lines of an import response, failing if any line was rejected.
pub(crate) fn parse_import_response(body: &str) -> Result<usize> {
    let mut succeeded = 0;
    let mut errors = Vec::new();

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let result: ImportLine = serde_json::from_str(line)?;
        if result.success {
            succeeded += 1;
        } else {
            errors.push(result.error.unwrap_or_else(|| "unknown error".to_string()));
        }
    }

    if errors.is_empty() {
        Ok(succeeded)
    } else {
        Err(TsenseError::Import {
            succeeded,
            failed: errors.len(),
            errors,
        })
    }
}

/// Serialize documents as JSON lines.
pub fn to_json_lines<T: Serialize>(docs: &[T]) -> Result<String> {
    let mut out = String::new();
    for doc in docs {
        out.push_str(&serde_json::to_string(doc)?);
        out.push('\n');
    }
    Ok(out)
}

/// Document client for the record type `T`.
///
/// The target collection is the alias named after `T` (or the name given to
/// [`with_collection_name`](Self::with_collection_name)), resolved through the
/// shared alias cache on every call.
pub struct DocumentClient<T> {
    http: HttpClient,
    cache: AliasCache,
    collection_name: Option<String>,
    aliased: bool,
    batch_size: usize,
    dirty_values: DirtyValues,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentClient<T> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            cache: self.cache.clone(),
            collection_name: self.collection_name.clone(),
            aliased: self.aliased,
            batch_size: self.batch_size,
            dirty_values: self.dirty_values,
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for DocumentClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentClient")
            .field("record", &std::any::type_name::<T>())
            .field("collection_name", &self.collection_name)
            .field("aliased", &self.aliased)
            .field("batch_size", &self.batch_size)
            .field("dirty_values", &self.dirty_values)
            .finish()
    }
}

impl<T: Document> DocumentClient<T> {
    /// Create a document client.
    pub fn new(
        http: HttpClient,
        cache: AliasCache,
        batch_size: usize,
        dirty_values: DirtyValues,
    ) -> Self {
        Self {
            http,
            cache,
            collection_name: None,
            aliased: true,
            batch_size,
            dirty_values,
            _record: PhantomData,
        }
    }

    /// Copy with a different import batch size.
    pub fn with_batch_size(&self, batch_size: usize) -> Self {
        Self {
            batch_size,
            ..self.clone()
        }
    }

    /// Copy with a different dirty value strategy.
    pub fn with_dirty_values(&self, dirty_values: DirtyValues) -> Self {
        Self {
            dirty_values,
            ..self.clone()
        }
    }

    /// Copy targeting another logical name.
    pub fn with_collection_name(&self, name: impl Into<String>) -> Self {
        Self {
            collection_name: Some(name.into()),
            ..self.clone()
        }
    }

    /// Copy that uses the logical name as the physical collection name.
    pub fn without_auto_alias(&self) -> Self {
        Self {
            aliased: false,
            ..self.clone()
        }
    }

    /// Physical collection this client currently writes to.
    pub async fn collection(&self) -> Result<String> {
        let logical = self
            .collection_name
            .clone()
            .unwrap_or_else(T::collection_name);
        if !self.aliased {
            return Ok(logical);
        }
        match self.cache.resolve(&logical).await? {
            Some(physical) => Ok(physical),
            None => Err(TsenseError::AliasNotFound(logical)),
        }
    }

    async fn route(&self, sub: &str) -> Result<String> {
        let collection = self.collection().await?;
        if sub.is_empty() {
            Ok(format!("/collections/{collection}/documents"))
        } else {
            Ok(format!("/collections/{collection}/documents/{sub}"))
        }
    }

    // Ids are percent-encoded so `/` or `?` stay inside the path segment.
    async fn document_route(&self, id: &str) -> Result<String> {
        self.route(&urlencoding::encode(id)).await
    }

    /// Fetch a document.
    pub async fn get_by_id(&self, id: &str) -> Result<T> {
        let route = self.document_route(id).await?;
        let response = self.http.get(route).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TsenseError::DocumentNotFound {
                collection: self.collection().await?,
                id: id.to_string(),
            });
        }
        Ok(ensure_success(response)?.json()?)
    }

    /// Whether a document exists.
    pub async fn exists_by_id(&self, id: &str) -> Result<bool> {
        let route = self.document_route(id).await?;
        let response = self.http.get(route).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response)?;
        Ok(true)
    }

    /// Export every document as JSON lines.
    pub async fn export_all(&self) -> Result<String> {
        let route = self.route("export").await?;
        let response = self.http.get(route).send().await?;
        Ok(ensure_success(response)?.text())
    }

    /// Export documents matching `filter_by` as JSON lines.
    pub async fn export_with_query(&self, filter_by: &str) -> Result<String> {
        let route = self.route("export").await?;
        let response = self
            .http
            .get(route)
            .query("filter_by", filter_by)
            .send()
            .await?;
        Ok(ensure_success(response)?.text())
    }

    /// Create a document.
    pub async fn index(&self, doc: &T) -> Result<()> {
        let route = self.route("").await?;
        let response = self
            .http
            .post(route)
            .query("dirty_values", self.dirty_values.as_str())
            .json(doc)
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    /// Update the document with the given id.
    pub async fn update(&self, doc: &T, id: &str) -> Result<()> {
        let route = self.document_route(id).await?;
        let response = self
            .http
            .patch(route)
            .query("dirty_values", self.dirty_values.as_str())
            .json(doc)
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    /// Delete a document.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        let route = self.document_route(id).await?;
        let response = self.http.delete(route).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TsenseError::DocumentNotFound {
                collection: self.collection().await?,
                id: id.to_string(),
            });
        }
        ensure_success(response)?;
        Ok(())
    }

    /// Delete every document matching `filter_by`, returning how many were removed.
    pub async fn delete_many_with_query(&self, filter_by: &str) -> Result<u64> {
        let route = self.route("").await?;
        let response = self
            .http
            .delete(route)
            .query("filter_by", filter_by)
            .query("batch_size", self.batch_size.to_string())
            .send()
            .await?;
        let summary: DeleteSummary = ensure_success(response)?.json()?;
        Ok(summary.num_deleted)
    }

    /// Import documents, returning how many were accepted.
    pub async fn index_many(&self, docs: &[T], action: DocumentAction) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let lines = to_json_lines(docs)?;
        self.import_many(lines, action).await
    }

    /// Import pre-encoded JSON lines, returning how many were accepted.
    pub async fn import_many(
        &self,
        json_lines: impl Into<String>,
        action: DocumentAction,
    ) -> Result<usize> {
        let route = self.route("import").await?;
        let response = self
            .http
            .post(route)
            .query("action", action.as_str())
            .query("dirty_values", self.dirty_values.as_str())
            .query("batch_size", self.batch_size.to_string())
            .text(json_lines)
            .send()
            .await?;
        let imported = parse_import_response(&ensure_success(response)?.text())?;
        tsense_log::debug!("Imported {} documents", imported);
        Ok(imported)
    }

    /// Import a JSON lines file.
    pub async fn import_from_file(
        &self,
        path: impl AsRef<Path>,
        action: DocumentAction,
    ) -> Result<usize> {
        let json_lines = tokio::fs::read_to_string(path.as_ref()).await?;
        self.import_many(json_lines, action).await
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(TsenseError::remote(&response))
    }
}
