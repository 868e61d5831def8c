// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::collections::HashMap;

/// One HTTP response as observed by the transport.
///
/// The engine only ever reads body/headers/timing; responses are never
/// mutated after the transport hands them over.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Monotonic, citable identifier assigned by the transport.
    pub id: u64,
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    /// Network-level elapsed time for the send. Must reflect real timing on
    /// delay-sensitive call paths; a memoizing transport would blind the
    /// delay oracle.
    pub duration_ms: u64,
}

impl HttpResponse {
    /// Elapsed wait time in seconds, as the delay oracle consumes it.
    pub fn wait_time(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}
