//! Search on an aliased collection.

use crate::alias::AliasCache;
use crate::document::Document;
use crate::error::{Result, TsenseError};
use serde::Deserialize;
use std::marker::PhantomData;
use std::time::Duration;
use tsense_http::HttpClient;

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameters {
    /// Query text; `*` matches everything.
    pub q: String,
    /// Comma-separated fields to search in.
    pub query_by: Option<String>,
    /// Filter expression.
    pub filter_by: Option<String>,
    /// Sort expression.
    pub sort_by: Option<String>,
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Hits per page.
    pub per_page: Option<u32>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            q: "*".to_string(),
            query_by: None,
            filter_by: None,
            sort_by: None,
            page: None,
            per_page: None,
        }
    }
}

impl SearchParameters {
    /// Match-all search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query text.
    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = q.into();
        self
    }

    /// Set the fields to search in.
    pub fn query_by(mut self, fields: impl Into<String>) -> Self {
        self.query_by = Some(fields.into());
        self
    }

    /// Set the filter expression.
    pub fn filter_by(mut self, filter: impl Into<String>) -> Self {
        self.filter_by = Some(filter.into());
        self
    }

    /// Set the sort expression.
    pub fn sort_by(mut self, sort: impl Into<String>) -> Self {
        self.sort_by = Some(sort.into());
        self
    }

    /// Set the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set hits per page.
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Query string pairs, unset parameters omitted.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("q".to_string(), self.q.clone())];
        let optional = [
            ("query_by", self.query_by.clone()),
            ("filter_by", self.filter_by.clone()),
            ("sort_by", self.sort_by.clone()),
            ("page", self.page.map(|p| p.to_string())),
            ("per_page", self.per_page.map(|p| p.to_string())),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key.to_string(), value));
            }
        }
        pairs
    }
}

/// Search parameters with grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchGroupedParameters {
    /// Ungrouped parameters.
    pub search: SearchParameters,
    /// Comma-separated facet fields to group on.
    pub group_by: Option<String>,
    /// Hits per group.
    pub group_limit: Option<u32>,
}

impl SearchGroupedParameters {
    /// Group a search.
    pub fn new(search: SearchParameters) -> Self {
        Self {
            search,
            group_by: None,
            group_limit: None,
        }
    }

    /// Set the grouping fields.
    pub fn group_by(mut self, fields: impl Into<String>) -> Self {
        self.group_by = Some(fields.into());
        self
    }

    /// Set hits per group.
    pub fn group_limit(mut self, limit: u32) -> Self {
        self.group_limit = Some(limit);
        self
    }

    /// Query string pairs, unset parameters omitted.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = self.search.to_query();
        if let Some(group_by) = &self.group_by {
            pairs.push(("group_by".to_string(), group_by.clone()));
        }
        if let Some(limit) = self.group_limit {
            pairs.push(("group_limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Highlighted match in one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Highlight {
    /// Field name.
    #[serde(default)]
    pub field: String,
    /// Tokens that matched.
    #[serde(default)]
    pub matched_tokens: Vec<String>,
    /// Snippet with the match marked.
    #[serde(default)]
    pub snippet: String,
}

/// One search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit<T> {
    /// The matched document.
    pub document: T,
    /// Highlights per field.
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    /// Relevance score.
    #[serde(default)]
    pub text_match: u64,
}

/// Hits sharing a group key.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupedHits<T> {
    /// Values of the grouping fields.
    pub group_key: Vec<serde_json::Value>,
    /// Hits in this group.
    pub hits: Vec<Hit<T>>,
}

/// Echo of the request parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestParams {
    /// Physical collection searched.
    #[serde(default)]
    pub collection_name: String,
    /// Hits per page.
    #[serde(default)]
    pub per_page: u32,
    /// Query text.
    #[serde(default)]
    pub q: String,
}

/// Ungrouped search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult<T> {
    /// Facet counts, as returned.
    #[serde(default)]
    pub facet_counts: Vec<serde_json::Value>,
    /// Number of matching documents.
    #[serde(default)]
    pub found: u64,
    /// Number of documents searched.
    #[serde(default)]
    pub out_of: u64,
    /// Page returned.
    #[serde(default)]
    pub page: u32,
    /// Request parameters.
    #[serde(default)]
    pub request_params: RequestParams,
    /// Server-side search time.
    #[serde(default)]
    pub search_time_ms: u64,
    /// Hits on this page.
    #[serde(default = "Vec::new")]
    pub hits: Vec<Hit<T>>,
}

impl<T> SearchResult<T> {
    /// Documents on this page, in rank order.
    pub fn documents(&self) -> Vec<&T> {
        self.hits.iter().map(|h| &h.document).collect()
    }
}

/// Grouped search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultGrouped<T> {
    /// Facet counts, as returned.
    #[serde(default)]
    pub facet_counts: Vec<serde_json::Value>,
    /// Number of matching groups.
    #[serde(default)]
    pub found: u64,
    /// Number of documents searched.
    #[serde(default)]
    pub out_of: u64,
    /// Page returned.
    #[serde(default)]
    pub page: u32,
    /// Request parameters.
    #[serde(default)]
    pub request_params: RequestParams,
    /// Server-side search time.
    #[serde(default)]
    pub search_time_ms: u64,
    /// Groups on this page.
    #[serde(default = "Vec::new")]
    pub grouped_hits: Vec<GroupedHits<T>>,
}

impl<T> SearchResultGrouped<T> {
    /// Documents per group, keyed by the group key values joined with `,`.
    pub fn documents(&self) -> Vec<(String, Vec<&T>)> {
        self.grouped_hits
            .iter()
            .map(|group| {
                let key = group
                    .group_key
                    .iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                (key, group.hits.iter().map(|h| &h.document).collect())
            })
            .collect()
    }
}

/// Search client for the record type `T`.
pub struct SearchClient<T> {
    http: HttpClient,
    cache: AliasCache,
    collection_name: Option<String>,
    aliased: bool,
    use_cache: bool,
    cache_ttl: Duration,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for SearchClient<T> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            cache: self.cache.clone(),
            collection_name: self.collection_name.clone(),
            aliased: self.aliased,
            use_cache: self.use_cache,
            cache_ttl: self.cache_ttl,
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for SearchClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("record", &std::any::type_name::<T>())
            .field("collection_name", &self.collection_name)
            .field("aliased", &self.aliased)
            .finish()
    }
}

impl<T: Document> SearchClient<T> {
    /// Create a search client.
    pub fn new(http: HttpClient, cache: AliasCache, use_cache: bool, cache_ttl: Duration) -> Self {
        Self {
            http,
            cache,
            collection_name: None,
            aliased: true,
            use_cache,
            cache_ttl,
            _record: PhantomData,
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

    async fn collection(&self) -> Result<String> {
        let logical = self
            .collection_name
            .clone()
            .unwrap_or_else(T::collection_name);
        if !self.aliased {
            return Ok(logical);
        }
        self.cache
            .resolve(&logical)
            .await?
            .ok_or(TsenseError::AliasNotFound(logical))
    }

    async fn run<R: serde::de::DeserializeOwned>(&self, query: Vec<(String, String)>) -> Result<R> {
        let collection = self.collection().await?;
        let response = self
            .http
            .get(format!("/collections/{collection}/documents/search"))
            .queries(query)
            .query("use_cache", self.use_cache.to_string())
            .query("cache_ttl", self.cache_ttl.as_secs().to_string())
            .send()
            .await?;
        if !response.is_success() {
            return Err(TsenseError::remote(&response));
        }
        Ok(response.json()?)
    }

    /// Run an ungrouped search.
    pub async fn search(&self, params: &SearchParameters) -> Result<SearchResult<T>> {
        self.run(params.to_query()).await
    }

    /// Run a grouped search.
    pub async fn search_grouped(
        &self,
        params: &SearchGroupedParameters,
    ) -> Result<SearchResultGrouped<T>> {
        self.run(params.to_query()).await
    }
}
