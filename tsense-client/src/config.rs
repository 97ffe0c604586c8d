//! Client configuration.

use crate::document::DirtyValues;
use crate::error::{Result, TsenseError};
use crate::metadata::API_KEY_HEADER;
use std::time::Duration;
use tsense_http::{HttpClientConfig, RetryConfig};

/// Environment variable holding the service URL.
pub const ENV_HOST: &str = "TSENSE_HOST";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "TSENSE_API_KEY";
/// Environment variable overriding the retry count.
pub const ENV_MAX_RETRIES: &str = "TSENSE_MAX_RETRIES";
/// Environment variable overriding the import batch size.
pub const ENV_BATCH_SIZE: &str = "TSENSE_BATCH_SIZE";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, e.g. `http://localhost:8108`.
    pub host: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Retries after the first attempt of a request.
    pub max_retries: u32,
    /// Log every request and response status.
    pub request_logging: bool,
    /// Documents per import request.
    pub batch_size: usize,
    /// Handling of values that do not match the schema on write.
    pub dirty_values: DirtyValues,
    /// Ask the service to cache search results.
    pub search_cache: bool,
    /// Lifetime of cached search results.
    pub search_cache_ttl: Duration,
}

impl ClientConfig {
    /// Create a configuration for `host` authenticated with `api_key`.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_retries: 1,
            request_logging: false,
            batch_size: 100,
            dirty_values: DirtyValues::Reject,
            search_cache: true,
            search_cache_ttl: Duration::from_secs(60),
        }
    }

    /// Load the configuration from `TSENSE_*` environment variables.
    ///
    /// `TSENSE_HOST` and `TSENSE_API_KEY` are required.
    pub fn from_env() -> Result<Self> {
        let host = require_env(ENV_HOST)?;
        let api_key = require_env(ENV_API_KEY)?;
        let mut config = Self::new(host, api_key);

        if let Some(retries) = parse_env::<u32>(ENV_MAX_RETRIES)? {
            config.max_retries = retries;
        }
        if let Some(batch_size) = parse_env::<usize>(ENV_BATCH_SIZE)? {
            config.batch_size = batch_size;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set retries after the first attempt.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the default import batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the default dirty value strategy.
    pub fn with_dirty_values(mut self, dirty_values: DirtyValues) -> Self {
        self.dirty_values = dirty_values;
        self
    }

    /// Enable or disable the search result cache.
    pub fn with_search_cache(mut self, enabled: bool) -> Self {
        self.search_cache = enabled;
        self
    }

    /// Set the search result cache lifetime.
    pub fn with_search_cache_ttl(mut self, ttl: Duration) -> Self {
        self.search_cache_ttl = ttl;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(TsenseError::Validation("host must not be empty".into()));
        }
        if self.api_key.is_empty() {
            return Err(TsenseError::Validation("api key must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(TsenseError::Validation(
                "batch size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Transport configuration derived from this configuration.
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.host.trim_end_matches('/'))
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .default_header(API_KEY_HEADER, self.api_key.clone())
            .log_requests(self.request_logging);

        if self.max_retries > 0 {
            builder = builder.retry(RetryConfig::exponential(
                self.max_retries + 1,
                Duration::from_millis(100),
            ));
        }

        builder.build()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| TsenseError::Validation(format!("{key} is not set")))
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TsenseError::Validation(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}
