// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Injection Audit Engine
 * Wires the surface model, oracles, dispatch layer and knowledge base
 * into one audit pass over a base request
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::dispatch::{self, DedupRegistry};
use crate::errors::EngineError;
use crate::fuzzer::{enumerate_fuzz_points, Mutant};
use crate::knowledge_base::KnowledgeBase;
use crate::oracles::{detect_dbms_hint, BlindBooleanOracle, TimeDelayOracle};
use crate::payloads::SqlContext;
use crate::request::BaseRequest;
use crate::transport::Transport;
use crate::types::{ScanConfig, TargetDbms};

/// What one audit pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditSummary {
    pub fuzz_points: usize,
    pub units_completed: usize,
    pub findings: usize,
}

enum OracleKind {
    Boolean(SqlContext),
    Delay,
}

struct AuditUnit {
    mutant: Mutant,
    oracle: OracleKind,
}

/// One audit engine per scan run. Collaborators are injected, never
/// ambient: the transport performs sends, the knowledge base stores
/// findings, and the dedup registry spans every request audited through
/// this engine.
pub struct InjectionEngine {
    transport: Arc<dyn Transport>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    config: ScanConfig,
    dedup: DedupRegistry,
    abort: Arc<AtomicBool>,
}

impl InjectionEngine {
    /// Build an engine, failing fast on configuration problems before any
    /// request is sent.
    pub fn new(
        transport: Arc<dyn Transport>,
        knowledge_base: Arc<dyn KnowledgeBase>,
        config: ScanConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            transport,
            knowledge_base,
            config,
            dedup: DedupRegistry::new(),
            abort: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Scan-level abort handle: once set, no new units are dispatched;
    /// in-flight sends complete and already-confirmed findings are kept.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Audit every injectable surface of one base request with both
    /// oracles, persisting at most one finding per fuzzed location.
    pub async fn audit_request(&self, base: &BaseRequest, owner: &str) -> Result<AuditSummary> {
        // Captured once per base request; shared by all of its mutants.
        let original_response = match self.transport.send(base).await {
            Ok(response) => Some(response),
            Err(error) => {
                warn!(
                    "could not capture original response for {}: {}",
                    base.url_without_query(),
                    error
                );
                None
            }
        };
        let original_body = original_response
            .as_ref()
            .map(|response| Arc::new(response.body.clone()));

        let dbms_hint = if self.config.target_dbms == TargetDbms::Unknown {
            original_response
                .as_ref()
                .map(detect_dbms_hint)
                .unwrap_or(TargetDbms::Unknown)
        } else {
            self.config.target_dbms
        };
        if dbms_hint != self.config.target_dbms {
            debug!("database hint narrowed to {:?} from original response", dbms_hint);
        }

        let points = enumerate_fuzz_points(base, &self.config);
        let mut units = Vec::with_capacity(points.len() * (SqlContext::ALL.len() + 1));
        for point in &points {
            for context in SqlContext::ALL {
                units.push(AuditUnit {
                    mutant: self.probe_mutant(base, point, &original_body),
                    oracle: OracleKind::Boolean(context),
                });
            }
            units.push(AuditUnit {
                mutant: self.probe_mutant(base, point, &original_body),
                oracle: OracleKind::Delay,
            });
        }

        let boolean_oracle =
            BlindBooleanOracle::new(Arc::clone(&self.transport), self.config.comparator());
        let delay_oracle = TimeDelayOracle::new(
            Arc::clone(&self.transport),
            self.config.delay_seconds,
            self.config.delay_tolerance,
        );
        let os_hint = self.config.target_os;

        // References copied into each unit's future; the closure itself
        // stays borrow-free so the futures only borrow this stack frame.
        let boolean_oracle = &boolean_oracle;
        let delay_oracle = &delay_oracle;
        let dedup = &self.dedup;
        let knowledge_base = &self.knowledge_base;
        let abort = &self.abort;

        let results = dispatch::for_each_concurrent(
            units,
            self.config.concurrency,
            move |mut unit: AuditUnit| async move {
                if abort.load(Ordering::Relaxed) {
                    return (0usize, 0usize);
                }
                let key = unit.mutant.target_key();
                if dedup.is_reported(&key) {
                    return (1, 0);
                }

                let outcome = match unit.oracle {
                    OracleKind::Boolean(context) => {
                        boolean_oracle
                            .probe_context(&mut unit.mutant, context)
                            .await
                    }
                    OracleKind::Delay => {
                        delay_oracle
                            .probe(&mut unit.mutant, os_hint, dbms_hint)
                            .await
                    }
                };

                match outcome {
                    Ok(Some(finding)) => {
                        // Check-and-mark under the lock; only the first
                        // observer persists.
                        if dedup.try_mark(key) {
                            knowledge_base.append(owner, finding);
                            (1, 1)
                        } else {
                            (1, 0)
                        }
                    }
                    Ok(None) => (1, 0),
                    Err(error) => {
                        warn!(
                            "audit unit for '{}' aborted: {:#}",
                            unit.mutant.point().name,
                            error
                        );
                        (1, 0)
                    }
                }
            },
        )
        .await;

        let summary = AuditSummary {
            fuzz_points: points.len(),
            units_completed: results.iter().map(|(completed, _)| *completed).sum(),
            findings: results.iter().map(|(_, findings)| *findings).sum(),
        };
        info!(
            "audit of {} {} done: {} fuzz points, {} units, {} findings",
            base.method(),
            base.url_without_query(),
            summary.fuzz_points,
            summary.units_completed,
            summary.findings
        );
        Ok(summary)
    }

    fn probe_mutant(
        &self,
        base: &BaseRequest,
        point: &crate::fuzzer::FuzzPoint,
        original_body: &Option<Arc<String>>,
    ) -> Mutant {
        let mut mutant = Mutant::new(
            base.clone(),
            point.clone(),
            point.original_value.clone(),
        );
        if let Some(body) = original_body {
            mutant = mutant.with_original_response(Arc::clone(body));
        }
        mutant
    }
}
