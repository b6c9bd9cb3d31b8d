// Copyright 2025 The Nimbus Authors
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::Arc;

use bytes::Bytes;
use log::{debug, trace};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::error::{BinaryError, ClientError, HttpError};
use super::interceptor::Interceptors;
use super::request::{self, RequestDescriptor, Resource};
use super::response::{Blob, ResponseEnvelope};
use super::transport::{ReqwestTransport, Transport};
use super::types::{CallOptions, ClientConfig};
use crate::log::mask_url;

/// Content types accepted by [`HttpClient::json_do`]. Matched exactly.
pub const JSON_CONTENT_TYPES: [&str; 5] = [
    "application/json",
    "text/json",
    "application/javascript",
    "application/vnd.api+json",
    "application/json; charset=utf-8",
];

/// HTTP client that runs every call through request and response
/// interceptor chains.
///
/// The client itself holds no per-call state: the configuration is fixed at
/// construction and the interceptor registries are only appended to, so one
/// instance can serve any number of concurrent calls.
pub struct HttpClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    interceptors: Interceptors,
}

impl HttpClient {
    /// Creates a client that dispatches through a default [`ReqwestTransport`].
    pub fn new(config: ClientConfig) -> Result<Self, HttpError> {
        Ok(Self::with_transport(config, Arc::new(ReqwestTransport::new()?)))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            interceptors: Interceptors::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Runs one call through the full pipeline and returns the raw response.
    ///
    /// Request interceptors run most-recently-registered first. If one of
    /// them fails, its rejection handler is invoked for observation only and
    /// the remaining request interceptors are skipped; the request as it
    /// stood before the failing interceptor is dispatched. Response
    /// interceptors then run in registration order, each receiving the
    /// previous stage's response or error.
    ///
    /// # Errors
    ///
    /// [`HttpError::InvalidResource`] and [`HttpError::InvalidHeader`] are
    /// returned before any interceptor runs. Transport errors are returned
    /// unless a response interceptor's rejection handler recovers them.
    pub async fn do_request(
        &self,
        resource: impl Into<Resource>,
        options: CallOptions,
    ) -> Result<ResponseEnvelope, HttpError> {
        let resource = resource.into();
        let url = request::resolve_url(&self.config.base, &resource, &options.params)?;
        let descriptor = request::assemble(&self.config, url, options)?;
        self.execute(descriptor).await
    }

    async fn execute(&self, descriptor: RequestDescriptor) -> Result<ResponseEnvelope, HttpError> {
        let request_chain = self.interceptors.request.snapshot();
        let response_chain = self.interceptors.response.snapshot();

        let mut request = descriptor;
        for (position, interceptor) in request_chain.iter().enumerate().rev() {
            if !interceptor.should_run(&request) {
                trace!(position = position; "Request interceptor skipped");
                continue;
            }
            match interceptor.fulfill(request.clone()).await {
                Ok(next) => request = next,
                Err(error) => {
                    debug!(position = position, error:% = error; "Request interceptor failed, dispatching last good request");
                    if let Err(error) = interceptor.reject(error).await {
                        trace!(position = position, error:% = error; "Request rejection handler re-raised");
                    }
                    break;
                },
            }
        }

        let request = Arc::new(request);
        let mut outcome = self.dispatch(request).await;

        for (position, interceptor) in response_chain.iter().enumerate() {
            outcome = match outcome {
                Ok(response) if interceptor.should_run(&response) => interceptor.fulfill(response).await,
                Ok(response) => {
                    trace!(position = position; "Response interceptor skipped");
                    Ok(response)
                },
                Err(error) => interceptor.reject(error).await,
            };
        }

        outcome
    }

    async fn dispatch(&self, request: Arc<RequestDescriptor>) -> Result<ResponseEnvelope, HttpError> {
        debug!(method:% = request.method, url:% = mask_url(&request.url); "Dispatching request");

        let response = match request.signal.clone() {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(HttpError::Aborted),
                    result = self.transport.dispatch(&request) => result,
                }
            },
            None => self.transport.dispatch(&request).await,
        }?;

        Ok(response.with_request(request))
    }

    /// Fetches and decodes a JSON body.
    ///
    /// - `204 No Content` yields an empty object, whatever the content type.
    /// - A 2xx response whose `Content-Type` is exactly one of
    ///   [`JSON_CONTENT_TYPES`] is decoded into `T`.
    /// - Anything else fails with a [`ClientError`] carrying the response
    ///   status, and the decoded body if it was JSON (an empty object if not).
    /// - Transport failures fail with status 500 (unless the error carries a
    ///   status) and the error message as data.
    pub async fn json_do<T: DeserializeOwned>(
        &self,
        resource: impl Into<Resource>,
        options: CallOptions,
    ) -> Result<T, ClientError> {
        let response = self.do_request(resource, options).await?;
        classify_json(&response)
    }

    /// Fetches a binary payload. Non-2xx responses are handed back as-is.
    pub async fn blob_do(&self, resource: impl Into<Resource>, options: CallOptions) -> Result<Blob, BinaryError> {
        let response = self.do_request(resource, options).await?;
        if response.ok() {
            return Ok(response.blob());
        }
        Err(BinaryError::Response(Box::new(response)))
    }

    /// Like [`blob_do`](Self::blob_do), yielding the raw bytes.
    pub async fn buffer_do(&self, resource: impl Into<Resource>, options: CallOptions) -> Result<Bytes, BinaryError> {
        let response = self.do_request(resource, options).await?;
        if response.ok() {
            return Ok(response.bytes());
        }
        Err(BinaryError::Response(Box::new(response)))
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn classify_json<T: DeserializeOwned>(response: &ResponseEnvelope) -> Result<T, ClientError> {
    if response.status() == StatusCode::NO_CONTENT {
        return serde_json::from_value(empty_object())
            .map_err(|e| ClientError::new(response.status().as_u16(), serde_json::Value::String(e.to_string())));
    }

    let is_json = response
        .content_type()
        .is_some_and(|content_type| JSON_CONTENT_TYPES.contains(&content_type.as_str()));

    if response.ok() && is_json {
        return Ok(response.json()?);
    }

    let data = if is_json { response.json()? } else { empty_object() };
    Err(ClientError::new(response.status().as_u16(), data))
}
