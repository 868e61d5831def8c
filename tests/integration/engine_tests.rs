// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Full-pipeline tests: surface enumeration, oracle fan-out, dedup and
 * knowledge-base persistence driven through InjectionEngine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use mockito::{Matcher, Server};

use koetin::knowledge_base::{InMemoryKnowledgeBase, KnowledgeBase};
use koetin::request::BaseRequest;
use koetin::transport::{HttpClient, Transport};
use koetin::types::{ScanConfig, Severity};
use koetin::InjectionEngine;

use super::support::ScriptedTransport;

/// An injectable endpoint audited end to end: several boolean contexts can
/// confirm concurrently, but the engine persists exactly one finding for
/// the single fuzzed location.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_audit_confirms_boolean_sqli_once() {
    let mut server = Server::new_async().await;

    // Catch-all first; later, more specific mocks take precedence.
    let _baseline_mock = server
        .mock("GET", "/products")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("Results: <table><tr><td>widget</td></tr></table> 3 rows")
        .create_async()
        .await;
    let _false_mock = server
        .mock("GET", "/products")
        .match_query(Matcher::Regex("AND".to_string()))
        .with_status(200)
        .with_body("No matching entries were located")
        .create_async()
        .await;
    let _error_mock = server
        .mock("GET", "/products")
        .match_query(Matcher::Regex("d.{0,3}z.{0,3}0".to_string()))
        .with_status(500)
        .with_body("You have an error in your SQL syntax near '' at line 1")
        .create_async()
        .await;

    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(10).unwrap());
    let knowledge_base = Arc::new(InMemoryKnowledgeBase::new());
    let engine = InjectionEngine::new(
        transport,
        Arc::clone(&knowledge_base) as Arc<dyn KnowledgeBase>,
        ScanConfig::default(),
    )
    .unwrap();

    let base = BaseRequest::get(&format!("{}/products?id=5", server.url())).unwrap();
    let summary = engine.audit_request(&base, "blind_sqli").await.unwrap();

    assert_eq!(summary.fuzz_points, 1);
    // 3 boolean contexts + 1 delay unit for the single point.
    assert_eq!(summary.units_completed, 4);
    assert_eq!(summary.findings, 1);

    let findings = knowledge_base.findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::High);
    assert_eq!(findings[0].parameter.as_deref(), Some("id"));
}

/// A static page with no injectable behavior produces no findings across
/// every unit.
#[tokio::test]
async fn test_audit_of_static_page_is_clean() {
    let mut server = Server::new_async().await;

    let _any_mock = server
        .mock("GET", "/about")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("About us: a perfectly static page")
        .create_async()
        .await;

    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(10).unwrap());
    let knowledge_base = Arc::new(InMemoryKnowledgeBase::new());
    let engine = InjectionEngine::new(
        transport,
        Arc::clone(&knowledge_base) as Arc<dyn KnowledgeBase>,
        ScanConfig::default(),
    )
    .unwrap();

    let base = BaseRequest::get(&format!("{}/about?page=home", server.url())).unwrap();
    let summary = engine.audit_request(&base, "blind_sqli").await.unwrap();

    assert_eq!(summary.findings, 0);
    assert!(knowledge_base.is_empty());
}

/// Fuzzing a JSON body end to end: both leaves are audited as independent
/// locations.
#[tokio::test]
async fn test_audit_enumerates_json_leaves() {
    // Nothing is injectable here; the point is the unit accounting.
    let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport::new(|_| {
        Ok(("static api reply".to_string(), 10))
    }));
    let knowledge_base = Arc::new(InMemoryKnowledgeBase::new());
    let engine = InjectionEngine::new(
        transport,
        Arc::clone(&knowledge_base) as Arc<dyn KnowledgeBase>,
        ScanConfig::default(),
    )
    .unwrap();

    let base = BaseRequest::post_json(
        "http://target.example/api/users",
        serde_json::json!({"user": "bob", "nested": {"id": 5}}),
    )
    .unwrap();
    let summary = engine.audit_request(&base, "blind_sqli").await.unwrap();

    assert_eq!(summary.fuzz_points, 2);
    assert_eq!(summary.units_completed, 8);
    assert_eq!(summary.findings, 0);
}
