// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Integration tests for the time-delay oracle using a scripted transport
 * with fabricated timings: two-stage confirmation, jitter downgrade and
 * tolerance window behavior
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use koetin::oracles::TimeDelayOracle;
use koetin::types::{Confidence, Severity, TargetDbms, TargetOs};

use super::support::{query_mutant, query_value, ScriptedTransport};

const BASELINE_MS: u64 = 100;

/// Seconds requested by a `sleep N` shell payload, if present.
fn requested_sleep(value: &str) -> Option<u64> {
    let rest = &value[value.find("sleep ")? + "sleep ".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// A server that honors `; sleep N` command injection: the scripted
/// transport fabricates an N-second duration for such payloads and responds
/// near-instantly otherwise.
fn sleeping_server() -> ScriptedTransport {
    ScriptedTransport::new(|request| {
        let value = query_value(request, "host");
        let duration_ms = match requested_sleep(&value) {
            Some(seconds) => seconds * 1000 + BASELINE_MS,
            None => BASELINE_MS,
        };
        Ok(("pong".to_string(), duration_ms))
    })
}

/// Command injection confirmed: the first probe lands in the 4s window and
/// the 9s confirmation probe lands in its own window.
#[tokio::test]
async fn test_command_injection_confirmed_after_second_delay() {
    let transport = Arc::new(sleeping_server());
    let oracle = TimeDelayOracle::new(transport, 4, 2.0);
    let mut mutant = query_mutant("http://target.example/ping?host=localhost", "host", "localhost");

    let finding = oracle
        .probe(&mut mutant, TargetOs::Unix, TargetDbms::Unknown)
        .await
        .unwrap()
        .expect("delay injection should confirm");

    assert_eq!(finding.severity, Severity::High);
    assert_eq!(finding.confidence, Confidence::High);
    assert_eq!(finding.vuln_type, "OS Command Injection (time delay)");
    assert_eq!(finding.cwe, "CWE-78");
    assert_eq!(finding.parameter.as_deref(), Some("host"));
    // Probe state is cleared after the protocol.
    assert_eq!(mutant.mod_value(), "localhost");
}

/// Noise simulation: the server delays the first sleep probe but ignores
/// the payload on the confirmation round. Only an informational "possible"
/// note may be emitted, never a HIGH finding.
#[tokio::test]
async fn test_unreproduced_delay_downgraded_to_possible() {
    let sleeps_seen = AtomicUsize::new(0);
    let transport = Arc::new(ScriptedTransport::new(move |request| {
        let value = query_value(request, "host");
        let duration_ms = match requested_sleep(&value) {
            Some(seconds) if sleeps_seen.fetch_add(1, Ordering::SeqCst) == 0 => {
                seconds * 1000 + BASELINE_MS
            }
            _ => BASELINE_MS,
        };
        Ok(("pong".to_string(), duration_ms))
    }));
    let oracle = TimeDelayOracle::new(transport, 4, 2.0);
    let mut mutant = query_mutant("http://target.example/ping?host=localhost", "host", "localhost");

    let finding = oracle
        .probe(&mut mutant, TargetOs::Unix, TargetDbms::Unknown)
        .await
        .unwrap()
        .expect("a possible (unconfirmed) note should be emitted");

    assert_eq!(finding.severity, Severity::Info);
    assert_eq!(finding.confidence, Confidence::Low);
    assert!(finding.description.contains("Possible"));
}

/// A target that never delays produces nothing at all.
#[tokio::test]
async fn test_instant_target_yields_no_finding() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(("pong".to_string(), BASELINE_MS))
    }));
    let oracle = TimeDelayOracle::new(transport, 4, 2.0);
    let mut mutant = query_mutant("http://target.example/ping?host=localhost", "host", "localhost");

    let finding = oracle
        .probe(&mut mutant, TargetOs::Unix, TargetDbms::Unknown)
        .await
        .unwrap();
    assert!(finding.is_none());
}

/// A delay far outside the tolerance window (an overloaded server, not an
/// injected sleep) is rejected at the first confirmation stage.
#[tokio::test]
async fn test_arbitrary_slowness_rejected_by_window() {
    let transport = Arc::new(ScriptedTransport::new(|request| {
        let value = query_value(request, "host");
        // Every injected probe "hangs" for far longer than requested.
        let duration_ms = if requested_sleep(&value).is_some() {
            30_000
        } else {
            BASELINE_MS
        };
        Ok(("pong".to_string(), duration_ms))
    }));
    let oracle = TimeDelayOracle::new(transport, 4, 2.0);
    let mut mutant = query_mutant("http://target.example/ping?host=localhost", "host", "localhost");

    let finding = oracle
        .probe(&mut mutant, TargetOs::Unix, TargetDbms::Unknown)
        .await
        .unwrap();
    assert!(finding.is_none());
}

/// Windows-only statements are not sent at a unix target: with every shell
/// sleep variant honored, hinting TargetOs::Windows must leave only the
/// ping payload, which this server ignores.
#[tokio::test]
async fn test_os_hint_filters_statements() {
    let transport = Arc::new(sleeping_server());
    let oracle = TimeDelayOracle::new(transport, 4, 2.0);
    let mut mutant = query_mutant("http://target.example/ping?host=localhost", "host", "localhost");

    let finding = oracle
        .probe(&mut mutant, TargetOs::Windows, TargetDbms::Unknown)
        .await
        .unwrap();
    assert!(finding.is_none());
}
