//! HTTP client implementation.

use crate::{HttpClientConfig, HttpClientError, RequestBuilder, Response, Result, RetryConfig};
use http::Method;
use reqwest::Request;
use std::sync::Arc;
use tracing::debug;

const USER_AGENT: &str = concat!("tsense-http/", env!("CARGO_PKG_VERSION"));

/// HTTP client with base URL, default headers, timeouts and retry.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    pub(crate) fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request builder.
    pub fn get(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, path.into())
    }

    /// Create a POST request builder.
    pub fn post(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, path.into())
    }

    /// Create a PUT request builder.
    pub fn put(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, path.into())
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PATCH, path.into())
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, path.into())
    }

    pub(crate) async fn execute(&self, request: Request) -> Result<Response> {
        if self.config.log_requests {
            debug!(method = %request.method(), url = %request.url(), "Sending request");
        }

        let response = match &self.config.retry {
            Some(retry) => self.execute_with_retry(request, retry).await?,
            None => self.execute_once(request).await?,
        };

        if self.config.log_requests {
            debug!(status = %response.status(), "Received response");
        }

        Ok(response)
    }

    async fn execute_with_retry(&self, request: Request, retry: &RetryConfig) -> Result<Response> {
        let attempts = retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            // Bodies are in-memory buffers, so every request built here clones.
            let Some(this_try) = request.try_clone() else {
                return self.execute_once(request).await;
            };

            let last = attempt >= attempts;
            match self.execute_once(this_try).await {
                Ok(response) => {
                    if last || !retry.retries_status(response.status().as_u16()) {
                        return Ok(response);
                    }
                    debug!(
                        attempt,
                        status = %response.status(),
                        "Retrying request due to status code"
                    );
                }
                Err(e) => {
                    if !retry.retries_error(&e) {
                        return Err(e);
                    }
                    if last {
                        return Err(HttpClientError::RetryExhausted {
                            attempts,
                            message: e.to_string(),
                        });
                    }
                    debug!(attempt, error = %e, "Retrying request due to error");
                }
            }

            tokio::time::sleep(retry.delay_before(attempt)).await;
            attempt += 1;
        }
    }

    async fn execute_once(&self, request: Request) -> Result<Response> {
        let response = self.inner.execute(request).await?;
        Response::read(response).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
