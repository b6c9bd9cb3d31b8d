// Copyright 2025 The Nimbus Authors
// SPDX-License-Identifier: BSD-3-Clause

use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::HttpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestCache {
    #[default]
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestCredentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestRedirect {
    #[default]
    Follow,
    Error,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    Origin,
    OriginWhenCrossOrigin,
    SameOrigin,
    StrictOrigin,
    #[default]
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

/// Per-client defaults, fixed for the lifetime of an [`HttpClient`](super::HttpClient).
///
/// Headers are kept in a [`HeaderMap`], so names are case-insensitive and
/// repeated names are multi-valued.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base: Url,
    pub headers: HeaderMap,
    pub cache: Option<RequestCache>,
    pub credentials: Option<RequestCredentials>,
    pub mode: Option<RequestMode>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
}

impl ClientConfig {
    pub fn new(base: &str) -> Result<Self, HttpError> {
        Ok(Self {
            base: Url::parse(base)?,
            headers: HeaderMap::new(),
            cache: None,
            credentials: None,
            mode: None,
            referrer: None,
            referrer_policy: None,
        })
    }

    /// Appends a default header. A repeated name adds another value.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_cache(mut self, cache: RequestCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_credentials(mut self, credentials: RequestCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_referrer_policy(mut self, policy: ReferrerPolicy) -> Self {
        self.referrer_policy = Some(policy);
        self
    }
}

/// Options for a single call.
///
/// Every field is optional. Network-policy fields left unset fall back to
/// the [`ClientConfig`] default; `headers` are appended on top of the client
/// defaults; `params` are appended to the resolved URL's query string in
/// order, duplicates included. `data` is applied last and overrides anything
/// computed from the other fields.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub body: Option<Bytes>,
    pub cache: Option<RequestCache>,
    pub credentials: Option<RequestCredentials>,
    pub headers: Vec<(String, String)>,
    pub integrity: Option<String>,
    pub keepalive: Option<bool>,
    pub method: Option<Method>,
    pub mode: Option<RequestMode>,
    pub redirect: Option<RequestRedirect>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub signal: Option<CancellationToken>,
    pub timeout: Option<Duration>,
    pub params: Vec<(String, String)>,
    pub data: Option<RequestOverrides>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn cache(mut self, cache: RequestCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn credentials(mut self, credentials: RequestCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn integrity(mut self, integrity: impl Into<String>) -> Self {
        self.integrity = Some(integrity.into());
        self
    }

    pub fn keepalive(mut self, keepalive: bool) -> Self {
        self.keepalive = Some(keepalive);
        self
    }

    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn redirect(mut self, redirect: RequestRedirect) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn referrer_policy(mut self, policy: ReferrerPolicy) -> Self {
        self.referrer_policy = Some(policy);
        self
    }

    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn data(mut self, data: RequestOverrides) -> Self {
        self.data = Some(data);
        self
    }
}

/// Low-level escape hatch applied after every other field has been resolved.
///
/// Each field that is set replaces the corresponding descriptor field
/// outright. `headers` replaces the whole merged header map rather than
/// appending to it. `extensions` entries are inserted into the descriptor's
/// free-form extension map, where interceptors can read them.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub body: Option<Bytes>,
    pub cache: Option<RequestCache>,
    pub credentials: Option<RequestCredentials>,
    pub headers: Option<HeaderMap>,
    pub integrity: Option<String>,
    pub keepalive: Option<bool>,
    pub method: Option<Method>,
    pub mode: Option<RequestMode>,
    pub redirect: Option<RequestRedirect>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub signal: Option<CancellationToken>,
    pub timeout: Option<Duration>,
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HttpError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_enums_use_fetch_spelling() {
        let cache: RequestCache = serde_json::from_str("\"only-if-cached\"").unwrap();
        assert_eq!(cache, RequestCache::OnlyIfCached);
        let policy: ReferrerPolicy = serde_json::from_str("\"strict-origin-when-cross-origin\"").unwrap();
        assert_eq!(policy, ReferrerPolicy::StrictOriginWhenCrossOrigin);
    }

    #[test]
    fn client_config_appends_repeated_headers() {
        let config = ClientConfig::new("https://api.example/")
            .unwrap()
            .with_header("X-A", "1")
            .unwrap()
            .with_header("x-a", "2")
            .unwrap();
        let values: Vec<_> = config.headers.get_all("x-a").iter().collect();
        assert_eq!(values, ["1", "2"]);
    }

    #[test]
    fn client_config_rejects_bad_base() {
        assert!(matches!(ClientConfig::new("not a url"), Err(HttpError::UrlError(_))));
    }

    #[test]
    fn invalid_header_name_is_reported() {
        let err = ClientConfig::new("https://api.example/")
            .unwrap()
            .with_header("bad header", "1")
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader(_)));
    }
}
