//! Buffered service responses.

use crate::{HttpClientError, Result};
use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;

/// Status and body of a completed call, read fully into memory.
///
/// The service answers with JSON, or JSON lines for export and import, so
/// the body is decoded on demand by [`json`](Self::json) or [`text`](Self::text).
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: Bytes,
}

impl Response {
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let body = response.bytes().await?;
        Ok(Self { status, body })
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            HttpClientError::Json(format!("{e} (status {}, {} bytes)", self.status, self.body.len()))
        })
    }
}
