// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Transport Collaborator
 * reqwest-backed request sender behind the Transport trait boundary
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::errors::TransportError;
use crate::request::{BaseRequest, RequestBody};
use crate::response::HttpResponse;

/// Realistic browser User-Agents to avoid detection
const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Get a realistic browser User-Agent (rotates to avoid blocks)
fn get_browser_user_agent() -> &'static str {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_POOL_IDLE_PER_HOST: usize = 32;
const DEFAULT_POOL_MAX_IDLE_TIMEOUT: u64 = 90;

/// The send collaborator the oracles depend on.
///
/// Implementations must reflect network-level timing faithfully on
/// delay-sensitive call paths; response memoization would defeat the delay
/// oracle.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &BaseRequest) -> Result<HttpResponse, TransportError>;
}

/// Default reqwest-backed transport.
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
    max_body_size: usize,
    next_response_id: Arc<AtomicU64>,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(get_browser_user_agent())
            .pool_max_idle_per_host(DEFAULT_POOL_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(DEFAULT_POOL_MAX_IDLE_TIMEOUT))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_secs(timeout_secs),
            max_body_size: MAX_BODY_SIZE,
            next_response_id: Arc::new(AtomicU64::new(1)),
        })
    }

    fn classify_error(&self, url: &str, error: reqwest::Error, elapsed: Duration) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                url: url.to_string(),
                elapsed_ms: elapsed.as_millis() as u64,
            };
        }
        if error.is_connect() {
            return TransportError::Connect {
                url: url.to_string(),
                reason: error.to_string(),
            };
        }
        TransportError::Other {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }

    fn build_request(
        &self,
        request: &BaseRequest,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut builder = self.client.request(method, request.full_url());

        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        if !request.cookies().is_empty() {
            builder = builder.header(reqwest::header::COOKIE, request.cookie_header());
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Json(json) => builder.json(json),
            RequestBody::Multipart { fields, files } => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for file in files {
                    let part = reqwest::multipart::Part::bytes(file.content.clone())
                        .file_name(file.filename.clone());
                    form = form.part(file.name.clone(), part);
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

#[async_trait::async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: &BaseRequest) -> Result<HttpResponse, TransportError> {
        let url = request.full_url().to_string();
        let builder = self.build_request(request)?;

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| self.classify_error(&url, e, start.elapsed()))?;

        let status_code = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify_error(&url, e, start.elapsed()))?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let capped = if bytes.len() > self.max_body_size {
            debug!(
                "Response body for {} truncated from {} bytes",
                url,
                bytes.len()
            );
            &bytes[..self.max_body_size]
        } else {
            &bytes[..]
        };
        let body = String::from_utf8_lossy(capped).into_owned();

        Ok(HttpResponse {
            id: self.next_response_id.fetch_add(1, Ordering::Relaxed),
            status_code,
            body,
            headers,
            duration_ms,
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}
