//! Request builder.

use crate::{HttpClient, HttpClientError, Response, Result};
use http::Method;
use http::header::CONTENT_TYPE;
use serde::Serialize;

/// A request against the configured base URL, sent with [`send`](Self::send).
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<(&'static str, Vec<u8>)>,
    error: Option<HttpClientError>,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(client: &'a HttpClient, method: Method, path: String) -> Self {
        Self {
            client,
            method,
            path,
            query: Vec::new(),
            body: None,
            error: None,
        }
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add several query parameters in order.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Plain-text body, used for JSON lines imports.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(("text/plain; charset=utf-8", text.into().into_bytes()));
        self
    }

    /// JSON body.
    ///
    /// A serialization failure is reported when the request is sent.
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => self.body = Some(("application/json", bytes)),
            Err(e) => self.error = Some(HttpClientError::Json(e.to_string())),
        }
        self
    }

    fn build_url(&self) -> Result<url::Url> {
        let invalid = |e: url::ParseError| HttpClientError::InvalidUrl(e.to_string());
        let mut url = match &self.client.config().base_url {
            Some(base) => url::Url::parse(base)
                .map_err(invalid)?
                .join(&self.path)
                .map_err(invalid)?,
            None => url::Url::parse(&self.path).map_err(invalid)?,
        };

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }

    /// Send the request, retrying per the client's policy.
    pub async fn send(self) -> Result<Response> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let url = self.build_url()?;
        let mut request = self.client.inner().request(self.method.clone(), url);
        for (name, value) in &self.client.config().default_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some((content_type, body)) = self.body {
            request = request.header(CONTENT_TYPE, content_type).body(body);
        }

        self.client.execute(request.build()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpClientConfig;
    use std::collections::HashMap;

    fn client(base: &str) -> HttpClient {
        HttpClient::new(HttpClientConfig::builder().base_url(base).build()).unwrap()
    }

    #[test]
    fn test_build_url_joins_base_and_query() {
        let client = client("http://localhost:8108");
        let request = client
            .get("/collections/orders/documents/search")
            .query("q", "*")
            .query("filter_by", "paid:true");

        let url = request.build_url().unwrap();
        assert_eq!(url.path(), "/collections/orders/documents/search");
        assert_eq!(url.query(), Some("q=*&filter_by=paid%3Atrue"));
    }

    #[test]
    fn test_encoded_path_segment_is_kept() {
        let client = client("http://localhost:8108");
        let url = client
            .get("/collections/orders/documents/a%2Fb%3Fc")
            .build_url()
            .unwrap();
        assert_eq!(url.path(), "/collections/orders/documents/a%2Fb%3Fc");
        assert_eq!(url.query(), None);
    }

    #[tokio::test]
    async fn test_unserializable_body_fails_on_send() {
        let client = client("http://localhost:8108");
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON");

        let err = client.post("/collections").json(&bad).send().await.unwrap_err();
        assert!(matches!(err, HttpClientError::Json(_)));
    }
}
