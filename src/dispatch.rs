// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Mutant Dispatch & Dedup Layer
 * Bounded concurrent fan-out plus the at-most-one-finding-per-location
 * guarantee
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;

use futures::stream::{self, StreamExt};

use crate::fuzzer::TargetKey;

/// Fan `f` out over `items` with at most `limit` in flight. Results arrive
/// in completion order; no ordering is guaranteed between items.
pub async fn for_each_concurrent<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(f)
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}

/// Shared "already reported" set keyed by fuzzed location.
///
/// The lock is held only for the check or the check-and-mark, never across
/// network I/O; concurrent payload variants of one location may all run
/// their protocols, but only the first to mark the key gets to persist a
/// finding.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    reported: Mutex<HashSet<TargetKey>>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap pre-check used before starting a multi-request protocol.
    pub fn is_reported(&self, key: &TargetKey) -> bool {
        self.reported
            .lock()
            .expect("dedup lock poisoned")
            .contains(key)
    }

    /// Atomically mark a location as reported. Returns true for exactly one
    /// caller per key.
    pub fn try_mark(&self, key: TargetKey) -> bool {
        self.reported
            .lock()
            .expect("dedup lock poisoned")
            .insert(key)
    }
}
