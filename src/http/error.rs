//! Error types for the HTTP request pipeline.
//!
//! This module defines three error shapes, one per consumption path:
//!
//! - [`HttpError`] covers everything that can go wrong while a call travels
//!   through the pipeline: resolving the resource, running interceptors,
//!   dispatching over the network.
//! - [`ClientError`] is the normalised `{status, data}` shape returned by the
//!   structured-data path ([`HttpClient::json_do`](super::HttpClient::json_do)).
//! - [`BinaryError`] is returned by the blob and buffer paths, which hand the
//!   raw response (or the raw transport error) back to the caller untouched.

use serde::Serialize;
use thiserror::Error;

use super::response::ResponseEnvelope;

/// Errors that can occur while a call runs through the pipeline.
///
/// # Error Categories
///
/// - **Resolution errors**: [`InvalidResource`](HttpError::InvalidResource),
///   [`UrlError`](HttpError::UrlError), [`InvalidHeader`](HttpError::InvalidHeader)
/// - **Transport errors**: [`RequestFailed`](HttpError::RequestFailed),
///   [`MiddlewareError`](HttpError::MiddlewareError), [`Aborted`](HttpError::Aborted),
///   [`RedirectRejected`](HttpError::RedirectRejected),
///   [`IntegrityMismatch`](HttpError::IntegrityMismatch)
/// - **Interceptor errors**: [`Interceptor`](HttpError::Interceptor)
/// - **Body errors**: [`JsonError`](HttpError::JsonError)
///
/// # Example
///
/// ```rust,no_run
/// use nimbus::http::HttpError;
///
/// fn handle_error(err: HttpError) {
///     match err {
///         HttpError::Aborted => eprintln!("call was cancelled"),
///         HttpError::InvalidResource(msg) => eprintln!("bad resource: {}", msg),
///         _ => eprintln!("Other error: {}", err),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum HttpError {
    /// The resource could not be turned into a URL.
    ///
    /// This is the pipeline's `TypeError`: it is raised before any
    /// interceptor runs, when the resource cannot be resolved against the
    /// client base or the composed URL cannot be normalised.
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Failed to parse or join a URL.
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// A configured or per-call header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The HTTP request failed due to a network or connection error.
    ///
    /// This typically indicates connectivity issues such as:
    /// - Connection refused (server not running)
    /// - Connection timeout
    /// - DNS resolution failure
    /// - TLS/SSL handshake errors
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// An error occurred in the reqwest middleware stack wrapped by the
    /// transport.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// The call's cancellation token fired while the request was on the wire.
    #[error("Request aborted")]
    Aborted,

    /// The server answered with a redirect and the call asked for
    /// `redirect: error`.
    #[error("Redirect rejected: server answered {status}")]
    RedirectRejected {
        /// The 3xx status code returned by the server.
        status: reqwest::StatusCode,
    },

    /// The response body does not match any of the digests in the call's
    /// `integrity` metadata.
    #[error("Integrity check failed for {url}")]
    IntegrityMismatch {
        /// The URL whose body failed verification.
        url: String,
    },

    /// A request or response interceptor failed.
    #[error("Interceptor failed: {0}")]
    Interceptor(#[source] anyhow::Error),

    /// Failed to deserialize a JSON response body.
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl HttpError {
    /// Convenience constructor for interceptor handlers.
    pub fn interceptor(err: impl Into<anyhow::Error>) -> Self {
        Self::Interceptor(err.into())
    }

    /// The HTTP status associated with this error, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            HttpError::MiddlewareError(e) => e.status().map(|s| s.as_u16()),
            HttpError::RedirectRejected { status } => Some(status.as_u16()),
            _ => None,
        }
    }
}

/// Tag carried by every [`ClientError`].
pub const CLIENT_ERROR_KIND: &str = "http-client-error";

/// Normalised failure of the structured-data path.
///
/// Whatever went wrong (transport failure, non-2xx status, unexpected content
/// type) the caller always receives the same `{status, data}` shape:
///
/// - `status` is the response status, or 500 when no response was received
///   and the underlying error carries no status.
/// - `data` is the parsed JSON error body when the server sent one, the
///   error message for transport failures, or an empty object otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{kind} {status}: {data}")]
pub struct ClientError {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub status: u16,
    pub data: serde_json::Value,
}

impl ClientError {
    pub fn new(status: u16, data: serde_json::Value) -> Self {
        Self {
            kind: CLIENT_ERROR_KIND,
            status,
            data,
        }
    }
}

impl From<HttpError> for ClientError {
    fn from(err: HttpError) -> Self {
        let status = err.status().unwrap_or(500);
        Self::new(status, serde_json::Value::String(err.to_string()))
    }
}

/// Failure of the blob and buffer paths.
///
/// Unlike [`ClientError`] this is not normalised: callers of
/// binary data get the full response back so they can inspect status and
/// headers themselves.
#[derive(Debug, Error)]
pub enum BinaryError {
    /// The server answered, but not with a 2xx status.
    #[error("Unsuccessful response: {}", .0.status())]
    Response(Box<ResponseEnvelope>),

    /// The call failed before a response was available.
    #[error(transparent)]
    Http(#[from] HttpError),
}
