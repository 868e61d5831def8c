// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Shared test helpers: a scripted transport with fabricated bodies and
 * timings, for protocol tests that need deterministic network behavior
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use koetin::errors::TransportError;
use koetin::fuzzer::{FuzzKind, FuzzPoint, Mutant};
use koetin::request::BaseRequest;
use koetin::response::HttpResponse;
use koetin::transport::Transport;

/// Transport whose behavior is scripted by a closure over the rendered
/// request. Returns `(body, duration_ms)`; durations are fabricated, no
/// real sleeping happens.
pub struct ScriptedTransport {
    script: Box<dyn Fn(&BaseRequest) -> Result<(String, u64), TransportError> + Send + Sync>,
    next_id: AtomicU64,
}

impl ScriptedTransport {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&BaseRequest) -> Result<(String, u64), TransportError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &BaseRequest) -> Result<HttpResponse, TransportError> {
        let (body, duration_ms) = (self.script)(request)?;
        Ok(HttpResponse {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            status_code: 200,
            body,
            headers: HashMap::new(),
            duration_ms,
        })
    }
}

/// Raw (unencoded) value of one query parameter of a rendered request.
pub fn query_value(request: &BaseRequest, name: &str) -> String {
    request
        .query_pairs()
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

/// A probe mutant over a single GET query parameter.
pub fn query_mutant(url: &str, name: &str, original: &str) -> Mutant {
    let base = BaseRequest::get(url).unwrap();
    let point = FuzzPoint {
        kind: FuzzKind::Query,
        name: name.to_string(),
        original_value: original.to_string(),
    };
    Mutant::new(base, point, original.to_string())
}
