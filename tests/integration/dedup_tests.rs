// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Dedup layer integration: many concurrent payload variants of one fuzzed
 * location must produce exactly one persisted finding
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use koetin::comparator::{CompareStrategy, ResponseComparator};
use koetin::dispatch::DedupRegistry;
use koetin::knowledge_base::{InMemoryKnowledgeBase, KnowledgeBase};
use koetin::oracles::BlindBooleanOracle;
use koetin::payloads::SqlContext;
use koetin::transport::Transport;

use super::support::{query_mutant, query_value, ScriptedTransport};

/// A server that is blatantly boolean-injectable: OR statements render a
/// data table, AND statements an empty page, broken syntax an error page.
fn injectable_server() -> ScriptedTransport {
    ScriptedTransport::new(|request| {
        let value = query_value(request, "id");
        let body = if value.contains("d'z'0") {
            "Fatal database failure with full stack trace"
        } else if value.contains(" OR ") {
            "Account table listing alpha beta gamma delta rows"
        } else if value.contains(" AND ") {
            "No matching accounts were located anywhere"
        } else {
            "Account table listing alpha beta gamma delta rows"
        };
        Ok((body.to_string(), 10))
    })
}

/// Five payload variants of the same fuzz point race through the full
/// confirmation pipeline; the registry lets exactly one finding through.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_variants_yield_exactly_one_finding() {
    let transport: Arc<dyn Transport> = Arc::new(injectable_server());
    let oracle = Arc::new(BlindBooleanOracle::new(
        Arc::clone(&transport),
        ResponseComparator::new(CompareStrategy::TokenOverlap, 0.8),
    ));
    let registry = Arc::new(DedupRegistry::new());
    let knowledge_base = Arc::new(InMemoryKnowledgeBase::new());

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let oracle = Arc::clone(&oracle);
            let registry = Arc::clone(&registry);
            let knowledge_base = Arc::clone(&knowledge_base);
            tokio::spawn(async move {
                let mut mutant =
                    query_mutant("http://target.example/account?id=5", "id", "5");
                let key = mutant.target_key();
                if registry.is_reported(&key) {
                    return;
                }
                if let Ok(Some(finding)) = oracle
                    .probe_context(&mut mutant, SqlContext::SingleQuote)
                    .await
                {
                    // Only the first worker to mark the location persists.
                    if registry.try_mark(key) {
                        knowledge_base.append("blind_sqli", finding);
                    }
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(knowledge_base.len(), 1);
}
