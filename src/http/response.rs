use std::sync::Arc;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::HttpError;
use super::request::RequestDescriptor;

/// A received response with its body fully buffered.
///
/// The executor attaches the request that produced it, so response
/// interceptors can look at what was actually sent.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
    request: Option<Arc<RequestDescriptor>>,
}

impl ResponseEnvelope {
    pub fn new(status: StatusCode, headers: HeaderMap, url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            url,
            body: body.into(),
            request: None,
        }
    }

    pub(crate) fn with_request(mut self, request: Arc<RequestDescriptor>) -> Self {
        self.request = Some(request);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// `true` for any 2xx status.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The `Content-Type` header. Repeated values are joined with `", "`;
    /// values that are not valid ASCII are skipped.
    pub fn content_type(&self) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(CONTENT_TYPE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        if values.is_empty() {
            return None;
        }
        Some(values.join(", "))
    }

    /// The request this response answers. Set for every response that came
    /// out of the executor.
    pub fn request(&self) -> Option<&RequestDescriptor> {
        self.request.as_deref()
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    pub fn blob(&self) -> Blob {
        Blob {
            content_type: self.content_type(),
            data: self.body.clone(),
        }
    }
}

/// Binary payload together with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content_type: Option<String>,
    data: Bytes,
}

impl Blob {
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}
