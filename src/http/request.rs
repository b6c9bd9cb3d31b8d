//! Resource resolution and request assembly.
//!
//! A call starts as a [`Resource`] plus [`CallOptions`]. [`resolve_url`]
//! turns the resource into one canonical URL against the client base, and
//! [`assemble`] merges client defaults with the call options into the
//! [`RequestDescriptor`] that travels through the interceptor chain.

use std::time::Duration;

use bytes::Bytes;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::HttpError;
use super::types::{
    CallOptions, ClientConfig, ReferrerPolicy, RequestCache, RequestCredentials, RequestMode, RequestOverrides,
    RequestRedirect, parse_header,
};

/// What a call is aimed at.
///
/// Strings may be absolute or relative; relative strings resolve against the
/// client base. A [`RequestDescriptor`] contributes only its URL.
#[derive(Debug, Clone)]
pub enum Resource {
    Path(String),
    Url(Url),
    Request(Box<RequestDescriptor>),
}

impl From<&str> for Resource {
    fn from(value: &str) -> Self {
        Resource::Path(value.to_string())
    }
}

impl From<String> for Resource {
    fn from(value: String) -> Self {
        Resource::Path(value)
    }
}

impl From<&String> for Resource {
    fn from(value: &String) -> Self {
        Resource::Path(value.clone())
    }
}

impl From<Url> for Resource {
    fn from(value: Url) -> Self {
        Resource::Url(value)
    }
}

impl From<&Url> for Resource {
    fn from(value: &Url) -> Self {
        Resource::Url(value.clone())
    }
}

impl From<RequestDescriptor> for Resource {
    fn from(value: RequestDescriptor) -> Self {
        Resource::Request(Box::new(value))
    }
}

/// The fully resolved request handed to interceptors and, finally, to the
/// transport.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub cache: Option<RequestCache>,
    pub credentials: Option<RequestCredentials>,
    pub integrity: Option<String>,
    pub keepalive: Option<bool>,
    pub mode: Option<RequestMode>,
    pub redirect: Option<RequestRedirect>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub signal: Option<CancellationToken>,
    pub timeout: Option<Duration>,
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl RequestDescriptor {
    /// A bare `GET` for `url` with no headers and no policy.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            cache: None,
            credentials: None,
            integrity: None,
            keepalive: None,
            mode: None,
            redirect: None,
            referrer: None,
            referrer_policy: None,
            signal: None,
            timeout: None,
            extensions: serde_json::Map::new(),
        }
    }

    fn apply_overrides(&mut self, overrides: RequestOverrides) {
        let RequestOverrides {
            body,
            cache,
            credentials,
            headers,
            integrity,
            keepalive,
            method,
            mode,
            redirect,
            referrer,
            referrer_policy,
            signal,
            timeout,
            extensions,
        } = overrides;

        if body.is_some() {
            self.body = body;
        }
        if cache.is_some() {
            self.cache = cache;
        }
        if credentials.is_some() {
            self.credentials = credentials;
        }
        if let Some(headers) = headers {
            self.headers = headers;
        }
        if integrity.is_some() {
            self.integrity = integrity;
        }
        if keepalive.is_some() {
            self.keepalive = keepalive;
        }
        if let Some(method) = method {
            self.method = method;
        }
        if mode.is_some() {
            self.mode = mode;
        }
        if redirect.is_some() {
            self.redirect = redirect;
        }
        if referrer.is_some() {
            self.referrer = referrer;
        }
        if referrer_policy.is_some() {
            self.referrer_policy = referrer_policy;
        }
        if signal.is_some() {
            self.signal = signal;
        }
        if timeout.is_some() {
            self.timeout = timeout;
        }
        self.extensions.extend(extensions);
    }
}

/// Characters escaped in a query key or value: the query's own delimiters,
/// `%` itself, and what a URL cannot carry literally. Everything else,
/// including `,`, `:` and `/`, goes out as written.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`');

/// Resolves `resource` against `base` and appends `params`.
///
/// Each parameter is appended as its own pair, so repeated keys produce
/// repeated pairs. Keys and values are escaped only where needed to keep
/// them literal (`1,2` stays `1,2` rather than becoming `1%2C2`, while
/// `a&b` becomes `a%26b`).
pub fn resolve_url(base: &Url, resource: &Resource, params: &[(String, String)]) -> Result<Url, HttpError> {
    let mut url = match resource {
        Resource::Path(path) => base
            .join(path)
            .map_err(|e| HttpError::InvalidResource(format!("{path}: {e}")))?,
        Resource::Url(url) => base
            .join(url.as_str())
            .map_err(|e| HttpError::InvalidResource(format!("{url}: {e}")))?,
        Resource::Request(request) => base
            .join(request.url.as_str())
            .map_err(|e| HttpError::InvalidResource(format!("{}: {e}", request.url)))?,
    };

    if !params.is_empty() {
        let appended = params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(key, QUERY_COMPONENT),
                    utf8_percent_encode(value, QUERY_COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{appended}"),
            _ => appended,
        };
        url.set_query(Some(&query));
    }

    Ok(url)
}

/// Builds the descriptor for one call.
///
/// Per field, an explicit call option wins over the client default. Headers
/// start from the client defaults and the call's headers are appended.
/// `options.data` is applied last.
pub fn assemble(config: &ClientConfig, url: Url, options: CallOptions) -> Result<RequestDescriptor, HttpError> {
    let CallOptions {
        body,
        cache,
        credentials,
        headers: call_headers,
        integrity,
        keepalive,
        method,
        mode,
        redirect,
        referrer,
        referrer_policy,
        signal,
        timeout,
        params: _,
        data,
    } = options;

    let mut headers = config.headers.clone();
    for (name, value) in &call_headers {
        let (name, value) = parse_header(name, value)?;
        headers.append(name, value);
    }

    let mut request = RequestDescriptor {
        url,
        method: method.unwrap_or(Method::GET),
        headers,
        body,
        cache: cache.or(config.cache),
        credentials: credentials.or(config.credentials),
        integrity,
        keepalive,
        mode: mode.or(config.mode),
        redirect,
        referrer: referrer.or_else(|| config.referrer.clone()),
        referrer_policy: referrer_policy.or(config.referrer_policy),
        signal,
        timeout,
        extensions: serde_json::Map::new(),
    };

    if let Some(data) = data {
        request.apply_overrides(data);
    }

    Ok(request)
}
