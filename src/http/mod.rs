//! HTTP request pipeline.
//!
//! This module provides a general-purpose HTTP client that builds requests
//! from layered configuration, runs them through ordered request and response
//! interceptor chains, dispatches them over an injected transport and
//! classifies the outcome.
//!
//! # Architecture
//!
//! - [`ClientConfig`] / [`CallOptions`] - client defaults and per-call options
//! - [`resolve_url`] / [`assemble`] - turn a [`Resource`] and options into a
//!   [`RequestDescriptor`]
//! - [`InterceptorManager`] - ordered handler registries, one per direction
//! - [`HttpClient`] - the executor, owning one call end to end
//! - [`Transport`] - network dispatch, with [`ReqwestTransport`] as the
//!   production implementation
//! - [`HttpError`], [`ClientError`], [`BinaryError`] - failure shapes
//!
//! # Example
//!
//! ```rust,no_run
//! use nimbus::http::{CallOptions, ClientConfig, HttpClient, Interceptor, RequestDescriptor};
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let config = ClientConfig::new("https://api.weatherapi.com/v1/")?
//!     .with_header("Accept", "application/json")?;
//! let client = HttpClient::new(config)?;
//!
//! client.interceptors().request.register(
//!     Interceptor::new().on_fulfilled(|mut req: RequestDescriptor| async move {
//!         req.headers.insert("x-request-source", "docs".parse().unwrap());
//!         Ok(req)
//!     }),
//! );
//!
//! let payload: serde_json::Value = client
//!     .json_do("current.json", CallOptions::new().param("q", "Amsterdam"))
//!     .await?;
//! println!("{payload}");
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
mod interceptor;
mod request;
mod response;
mod transport;
mod types;

pub use error::{BinaryError, CLIENT_ERROR_KIND, ClientError, HttpError};
pub use http_client::{HttpClient, JSON_CONTENT_TYPES};
pub use interceptor::{
    FulfilledFn, Interceptor, InterceptorHandle, InterceptorManager, Interceptors, RejectedFn, RunWhenFn,
};
pub use request::{RequestDescriptor, Resource, assemble, resolve_url};
pub use response::{Blob, ResponseEnvelope};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    CallOptions, ClientConfig, ReferrerPolicy, RequestCache, RequestCredentials, RequestMode, RequestOverrides,
    RequestRedirect,
};
