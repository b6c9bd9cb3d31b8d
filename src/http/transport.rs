// Copyright 2025 The Nimbus Authors
// SPDX-License-Identifier: BSD-3-Clause

//! Network transport capability.
//!
//! The executor never talks to the network directly; it hands the final
//! [`RequestDescriptor`] to a [`Transport`]. [`ReqwestTransport`] is the
//! production implementation. Tests substitute in-memory fakes.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;
use log::trace;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, COOKIE, HeaderMap, HeaderValue, PRAGMA, REFERER};
use reqwest::redirect::Policy;
use reqwest_middleware::ClientWithMiddleware;
use sha2::{Digest, Sha256, Sha384, Sha512};
use url::Url;

use super::error::HttpError;
use super::request::RequestDescriptor;
use super::response::ResponseEnvelope;
use super::types::{ReferrerPolicy, RequestCache, RequestCredentials, RequestRedirect};

/// Sends one request and buffers the whole response.
pub trait Transport: Send + Sync {
    fn dispatch<'a>(&'a self, request: &'a RequestDescriptor) -> BoxFuture<'a, Result<ResponseEnvelope, HttpError>>;
}

/// [`Transport`] backed by reqwest through a middleware stack.
///
/// Redirect handling in reqwest is a client-level setting, so two clients
/// are kept: one that follows redirects and one that does not. The latter
/// serves both `redirect: manual` and `redirect: error`.
pub struct ReqwestTransport {
    follow: ClientWithMiddleware,
    no_follow: ClientWithMiddleware,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(None)
    }

    /// Builds both clients with an optional client-wide timeout. A call's own
    /// `timeout` takes precedence.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, HttpError> {
        let mut follow = reqwest::Client::builder();
        let mut no_follow = reqwest::Client::builder().redirect(Policy::none());
        if let Some(timeout) = timeout {
            follow = follow.timeout(timeout);
            no_follow = no_follow.timeout(timeout);
        }

        Ok(Self::from_clients(
            reqwest_middleware::ClientBuilder::new(follow.build()?).build(),
            reqwest_middleware::ClientBuilder::new(no_follow.build()?).build(),
        ))
    }

    /// Uses caller-built middleware stacks. `no_follow` must not follow
    /// redirects.
    pub fn from_clients(follow: ClientWithMiddleware, no_follow: ClientWithMiddleware) -> Self {
        Self { follow, no_follow }
    }

    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseEnvelope, HttpError> {
        let redirect = request.redirect.unwrap_or_default();
        let client = match redirect {
            RequestRedirect::Follow => &self.follow,
            RequestRedirect::Manual | RequestRedirect::Error => &self.no_follow,
        };

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(wire_headers(request));
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_redirection() && redirect == RequestRedirect::Error {
            return Err(HttpError::RedirectRejected { status });
        }

        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        trace!(status = status.as_u16(), bytes = body.len(); "Response body buffered");

        if let Some(integrity) = &request.integrity {
            if !verify_integrity(integrity, &body) {
                return Err(HttpError::IntegrityMismatch { url: url.to_string() });
            }
        }

        Ok(ResponseEnvelope::new(status, headers, url, body))
    }
}

impl Transport for ReqwestTransport {
    fn dispatch<'a>(&'a self, request: &'a RequestDescriptor) -> BoxFuture<'a, Result<ResponseEnvelope, HttpError>> {
        Box::pin(self.send(request))
    }
}

/// The headers that go on the wire once cache, credentials and referrer
/// policy have been applied. Headers set explicitly on the request win.
fn wire_headers(request: &RequestDescriptor) -> HeaderMap {
    let mut headers = request.headers.clone();

    if !headers.contains_key(CACHE_CONTROL) {
        match request.cache.unwrap_or_default() {
            RequestCache::NoStore => {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            },
            RequestCache::NoCache | RequestCache::Reload => {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
                headers.entry(PRAGMA).or_insert(HeaderValue::from_static("no-cache"));
            },
            RequestCache::OnlyIfCached => {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("only-if-cached"));
            },
            RequestCache::Default | RequestCache::ForceCache => {},
        }
    }

    if request.credentials == Some(RequestCredentials::Omit) {
        headers.remove(AUTHORIZATION);
        headers.remove(COOKIE);
    }

    if !headers.contains_key(REFERER) {
        if let Some(value) = referrer_header(request).and_then(|r| HeaderValue::from_str(&r).ok()) {
            headers.insert(REFERER, value);
        }
    }

    headers
}

/// Computes the `Referer` value for `request` under its referrer policy.
pub(crate) fn referrer_header(request: &RequestDescriptor) -> Option<String> {
    let referrer = Url::parse(request.referrer.as_deref()?).ok()?;
    if !matches!(referrer.scheme(), "http" | "https") {
        return None;
    }

    let mut full = referrer.clone();
    full.set_fragment(None);
    let _ = full.set_username("");
    let _ = full.set_password(None);
    let origin = format!("{}/", referrer.origin().ascii_serialization());

    let same_origin = referrer.origin() == request.url.origin();
    let downgrade = referrer.scheme() == "https" && request.url.scheme() != "https";

    match request.referrer_policy.unwrap_or_default() {
        ReferrerPolicy::NoReferrer => None,
        ReferrerPolicy::UnsafeUrl => Some(full.into()),
        ReferrerPolicy::NoReferrerWhenDowngrade => (!downgrade).then(|| full.into()),
        ReferrerPolicy::Origin => Some(origin),
        ReferrerPolicy::StrictOrigin => (!downgrade).then_some(origin),
        ReferrerPolicy::SameOrigin => same_origin.then(|| full.into()),
        ReferrerPolicy::OriginWhenCrossOrigin => Some(if same_origin { full.into() } else { origin }),
        ReferrerPolicy::StrictOriginWhenCrossOrigin => {
            if same_origin {
                Some(full.into())
            } else {
                (!downgrade).then_some(origin)
            }
        },
    }
}

/// Checks `body` against subresource-integrity metadata such as
/// `sha384-<base64>`. Only the strongest algorithm present is considered;
/// metadata with no recognised algorithm passes.
pub(crate) fn verify_integrity(metadata: &str, body: &[u8]) -> bool {
    let entries: Vec<(u16, &str)> = metadata
        .split_whitespace()
        .filter_map(|token| {
            let (algorithm, digest) = token.split_once('-')?;
            let digest = digest.split('?').next()?;
            let strength = match algorithm {
                "sha256" => 256,
                "sha384" => 384,
                "sha512" => 512,
                _ => return None,
            };
            Some((strength, digest))
        })
        .collect();

    let Some(strongest) = entries.iter().map(|(strength, _)| *strength).max() else {
        return true;
    };

    let actual = match strongest {
        256 => STANDARD.encode(Sha256::digest(body)),
        384 => STANDARD.encode(Sha384::digest(body)),
        _ => STANDARD.encode(Sha512::digest(body)),
    };

    entries
        .iter()
        .filter(|(strength, _)| *strength == strongest)
        .any(|(_, expected)| *expected == actual)
}
