// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// WHIP/WHEP HTTP Transport
//
// One POST per negotiation over hyper + rustls. Follows 307 redirects,
// accepts 200/201 and reports every other status as a negotiation error.

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::{header, Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use url::Url;

use crate::core::{Result, RtcError, SignalingTransport};

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

type HttpsClient = Client<
    hyper_rustls::HttpsConnector<HttpConnector>,
    BoxBody<bytes::Bytes, Box<dyn std::error::Error + Send + Sync>>,
>;

pub struct HyperTransport {
    /// HTTP client with HTTPS support
    http_client: HttpsClient,
    /// Optional Bearer token for authentication.
    auth_token: Option<String>,
}

impl HyperTransport {
    pub fn new(auth_token: Option<String>) -> Result<Self> {
        super::ensure_crypto_provider();

        let builder = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(
                    "[HyperTransport] Failed to load native CA roots ({}), using bundled roots",
                    e
                );
                hyper_rustls::HttpsConnectorBuilder::new().with_webpki_roots()
            }
        };

        let https = builder
            .https_or_http() // Allow http:// for local servers
            .enable_http1()
            .enable_http2()
            .build();

        let http_client = Client::builder(hyper_util::rt::TokioExecutor::new())
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build(https);

        Ok(Self {
            http_client,
            auth_token,
        })
    }

    async fn post_once(
        &self,
        url: &Url,
        body: &str,
        content_type: &str,
    ) -> Result<(StatusCode, hyper::HeaderMap, bytes::Bytes)> {
        let boxed_body = Full::new(bytes::Bytes::from(body.to_owned()))
            .map_err(|never| match never {})
            .boxed();

        let mut req_builder = Request::builder()
            .method("POST")
            .uri(url.as_str())
            .header(header::CONTENT_TYPE, content_type);

        if let Some(token) = &self.auth_token {
            req_builder = req_builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let req = req_builder
            .body(boxed_body)
            .map_err(|e| RtcError::http(None, format!("Failed to build request: {}", e)))?;

        tracing::debug!("[HyperTransport] POST to {}", url);

        let response = self
            .http_client
            .request(req)
            .await
            .map_err(|e| RtcError::http(None, format!("POST to {} failed: {}", url, e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = BodyExt::collect(response.into_body())
            .await
            .map_err(|e| RtcError::http(Some(status.as_u16()), format!("Failed to read response: {}", e)))?
            .to_bytes();

        Ok((status, headers, body_bytes))
    }
}

impl SignalingTransport for HyperTransport {
    async fn post(&self, url: &str, body: &str, content_type: &str) -> Result<String> {
        let mut target =
            Url::parse(url).map_err(|e| RtcError::InvalidUrl(format!("{}: {}", url, e)))?;

        for _ in 0..=MAX_REDIRECTS {
            let (status, headers, body_bytes) = self.post_once(&target, body, content_type).await?;

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    if let Some(location) = headers.get(header::LOCATION).and_then(|v| v.to_str().ok()) {
                        tracing::info!("[HyperTransport] Session resource: {}", location);
                    }
                    return String::from_utf8(body_bytes.to_vec()).map_err(|e| {
                        RtcError::http(Some(status.as_u16()), format!("Invalid UTF-8 in answer: {}", e))
                    });
                }
                StatusCode::TEMPORARY_REDIRECT => {
                    let location = headers
                        .get(header::LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .ok_or_else(|| RtcError::http(Some(307), "307 without Location header"))?;

                    // Relative locations resolve against the current target.
                    target = target.join(location).map_err(|e| {
                        RtcError::http(Some(307), format!("Bad redirect location {}: {}", location, e))
                    })?;
                    tracing::info!("[HyperTransport] Redirecting to: {}", target);
                }
                _ => {
                    let error_body = String::from_utf8(body_bytes.to_vec())
                        .unwrap_or_else(|_| format!("HTTP {}", status));
                    return Err(RtcError::http(Some(status.as_u16()), error_body));
                }
            }
        }

        Err(RtcError::http(
            Some(307),
            format!("Too many redirects (more than {})", MAX_REDIRECTS),
        ))
    }
}
