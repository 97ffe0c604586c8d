//! # tsense HTTP transport
//!
//! The transport every tsense client talks through. It owns connection
//! settings, default headers (the API key among them), timeouts and the retry
//! policy, so the layers above never deal with any of them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsense_http::{HttpClient, HttpClientConfig, RetryConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("http://localhost:8108")
//!         .default_header("X-TYPESENSE-API-KEY", "xyz")
//!         .retry(RetryConfig::exponential(2, Duration::from_millis(100)))
//!         .build();
//!
//!     let client = HttpClient::new(config)?;
//!     let response = client.get("/health").send().await?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;

pub use client::HttpClient;
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use request::RequestBuilder;
pub use response::Response;
pub use retry::{RETRIABLE_STATUS_CODES, RetryConfig};

pub use http::StatusCode;
