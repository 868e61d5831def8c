// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Time-Delay Injection Oracle
 * Baseline-relative delay windows with a mandatory second, longer
 * confirmation round
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::errors::TransportError;
use crate::fuzzer::Mutant;
use crate::payloads::{delay_statements, DelayStatement};
use crate::transport::Transport;
use crate::types::{new_finding_id, Confidence, Finding, Severity, TargetDbms, TargetOs};

/// Symmetric additive window check: the observed wait must land within
/// `expected ± tolerance` seconds.
pub(crate) fn within_window(observed: f64, expected: f64, tolerance: f64) -> bool {
    (observed - expected).abs() <= tolerance
}

struct DelayObservation {
    wait: f64,
    response_id: Option<u64>,
}

/// Time-delay injection oracle.
///
/// One probe landing in the expected window is never reported as confirmed:
/// networks jitter. The oracle refreshes the baseline, asks for a strictly
/// longer delay and requires the second observation to land in its own
/// window; a first-window-only hit is downgraded to an informational
/// "possible" note instead of being dropped.
pub struct TimeDelayOracle {
    transport: Arc<dyn Transport>,
    delay_seconds: u64,
    tolerance: f64,
}

impl TimeDelayOracle {
    pub fn new(transport: Arc<dyn Transport>, delay_seconds: u64, tolerance: f64) -> Self {
        Self {
            transport,
            delay_seconds,
            tolerance,
        }
    }

    /// Probe one fuzz point with every delay statement applicable under the
    /// target hints. Stops at the first statement whose first window hits.
    pub async fn probe(
        &self,
        mutant: &mut Mutant,
        os_hint: TargetOs,
        dbms_hint: TargetDbms,
    ) -> Result<Option<Finding>> {
        let original = mutant.original_value().to_string();
        let result = self.run_protocol(mutant, os_hint, dbms_hint, &original).await;
        mutant.set_mod_value(&original);
        result
    }

    async fn run_protocol(
        &self,
        mutant: &mut Mutant,
        os_hint: TargetOs,
        dbms_hint: TargetDbms,
        original: &str,
    ) -> Result<Option<Finding>> {
        // Baseline: the unmodified request, timed once up front.
        mutant.set_mod_value(original);
        let baseline = match self.transport.send(&mutant.render()).await {
            Ok(response) => response.wait_time(),
            Err(error) => {
                debug!("delay baseline failed, inconclusive: {}", error);
                return Ok(None);
            }
        };

        for statement in delay_statements(os_hint, dbms_hint) {
            let payload = format!("{original}{}", statement.render(self.delay_seconds));
            let first = match self.timed_send(mutant, &payload).await {
                Some(observation) => observation,
                None => continue,
            };

            let expected = baseline + self.delay_seconds as f64;
            if !within_window(first.wait, expected, self.tolerance) {
                continue;
            }
            debug!(
                "[{}] first delay window hit: observed {:.2}s, expected {:.2}s ± {:.1}s",
                statement.label, first.wait, expected, self.tolerance
            );

            // Mandatory second confirmation: refreshed baseline (networks
            // drift) and a strictly longer delay.
            mutant.set_mod_value(original);
            let baseline2 = match self.transport.send(&mutant.render()).await {
                Ok(response) => response.wait_time(),
                Err(_) => baseline,
            };
            let longer = self.delay_seconds * 2 + 1;
            let payload2 = format!("{original}{}", statement.render(longer));
            let second = self.timed_send(mutant, &payload2).await;

            let confirmed = match &second {
                Some(observation) => {
                    within_window(observation.wait, baseline2 + longer as f64, self.tolerance)
                }
                None => false,
            };

            let finding = self.build_finding(
                mutant,
                statement,
                confirmed,
                first.wait,
                second.as_ref().map(|o| o.wait),
                [first.response_id, second.and_then(|o| o.response_id)],
            );
            if confirmed {
                info!(
                    "Time-delay injection confirmed in parameter '{}' via {}",
                    mutant.point().name,
                    statement.label
                );
            } else {
                debug!(
                    "[{}] second window missed, reporting a possible (unconfirmed) delay",
                    statement.label
                );
            }
            return Ok(Some(finding));
        }

        Ok(None)
    }

    async fn timed_send(&self, mutant: &mut Mutant, payload: &str) -> Option<DelayObservation> {
        mutant.set_mod_value(payload);
        match self.transport.send(&mutant.render()).await {
            Ok(response) => Some(DelayObservation {
                wait: response.wait_time(),
                response_id: Some(response.id),
            }),
            // A probe that timed out has still been observed to wait that
            // long; the window check decides whether it counts.
            Err(TransportError::Timeout { elapsed_ms, .. }) => Some(DelayObservation {
                wait: elapsed_ms as f64 / 1000.0,
                response_id: None,
            }),
            Err(error) => {
                debug!("delay probe inconclusive: {}", error);
                None
            }
        }
    }

    fn build_finding(
        &self,
        mutant: &mut Mutant,
        statement: &DelayStatement,
        confirmed: bool,
        first_wait: f64,
        second_wait: Option<f64>,
        response_ids: [Option<u64>; 2],
    ) -> Finding {
        let (vuln_type, cwe) = if statement.dbms.is_some() {
            ("Blind SQL Injection (time delay)", "CWE-89")
        } else if statement.os.is_some() {
            ("OS Command Injection (time delay)", "CWE-78")
        } else {
            ("Code Injection (time delay)", "CWE-94")
        };

        let evidence = format!(
            "Delay statement: {}\n\
             - requested delay: {}s, observed {:.2}s\n\
             - confirmation delay: {}s, observed {}\n\
             - tolerance window: ±{:.1}s",
            statement.label,
            self.delay_seconds,
            first_wait,
            self.delay_seconds * 2 + 1,
            second_wait
                .map(|w| format!("{w:.2}s"))
                .unwrap_or_else(|| "no response".to_string()),
            self.tolerance
        );

        mutant.set_mod_value("");
        let description = if confirmed {
            format!(
                "{} was found at: {}",
                vuln_type,
                mutant.found_at()
            )
        } else {
            format!(
                "Possible (unconfirmed) {} at: {} The first delay window matched but the \
                 longer confirmation delay did not reproduce; this may be network jitter.",
                vuln_type,
                mutant.found_at()
            )
        };

        Finding {
            id: new_finding_id("delay"),
            vuln_type: vuln_type.to_string(),
            severity: if confirmed {
                Severity::High
            } else {
                Severity::Info
            },
            confidence: if confirmed {
                Confidence::High
            } else {
                Confidence::Low
            },
            category: "Injection".to_string(),
            url: mutant.base().url_without_query(),
            parameter: Some(mutant.point().name.clone()),
            payload: statement.render(self.delay_seconds),
            description,
            evidence: Some(evidence),
            cwe: cwe.to_string(),
            response_ids: response_ids.into_iter().flatten().collect(),
            discovered_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
