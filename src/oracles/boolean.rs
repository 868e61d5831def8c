// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Boolean Blind-Injection Oracle
 * Five-step TRUE/FALSE/error/TRUE2/FALSE2 confirmation protocol with
 * differential page comparison
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::comparator::ResponseComparator;
use crate::fuzzer::Mutant;
use crate::oracles::has_sql_error_indicators;
use crate::payloads::{SqlContext, StatementPair, SYNTAX_ERROR_PAYLOAD};
use crate::response::HttpResponse;
use crate::transport::Transport;
use crate::types::{new_finding_id, Confidence, Finding, Severity};

/// Boolean blind-injection oracle.
///
/// Detection logic per (mutant, context):
/// 1. Send TRUE and FALSE statements; identical pages mean the parameter
///    does not influence a boolean branch.
/// 2. Send a guaranteed syntax error; an error page that matches TRUE means
///    the parameter likely never reaches a query.
/// 3. Send a second TRUE/FALSE pair built from an independently drawn
///    random value.
/// 4. Confirm only when TRUE2 matches TRUE and FALSE2 matches FALSE; the
///    distinction must reproduce with fresh values to rule out unrelated
///    page variability.
///
/// All five sends run in program order and intentionally overwrite one
/// mutant's mod_value step by step. Transport failures make the current
/// context inconclusive, never a crash or a finding.
pub struct BlindBooleanOracle {
    transport: Arc<dyn Transport>,
    comparator: ResponseComparator,
}

impl BlindBooleanOracle {
    pub fn new(transport: Arc<dyn Transport>, comparator: ResponseComparator) -> Self {
        Self {
            transport,
            comparator,
        }
    }

    /// Run the full confirmation protocol for one quoting context. Returns
    /// at most one finding; every ambiguous outcome is a silent
    /// "not vulnerable".
    pub async fn probe_context(
        &self,
        mutant: &mut Mutant,
        context: SqlContext,
    ) -> Result<Option<Finding>> {
        let original = mutant.original_value().to_string();
        let result = self.run_protocol(mutant, context, &original).await;
        // Leave no probe state behind regardless of outcome.
        mutant.set_mod_value(&original);
        result
    }

    async fn run_protocol(
        &self,
        mutant: &mut Mutant,
        context: SqlContext,
        original: &str,
    ) -> Result<Option<Finding>> {
        // Unquoted numeric statements only make sense against numeric
        // originals; real-world apps quote numeric ids often enough that
        // the quoted contexts always run.
        if context == SqlContext::Numeric
            && !original.is_empty()
            && !original.chars().all(|c| c.is_ascii_digit())
        {
            return Ok(None);
        }

        let pair = StatementPair::generate(context, original, &[])?;

        if mutant.payload_reflected_in_original(&pair.true_stmt) {
            debug!(
                "[{}] unmodified page already echoes the probe statement, inconclusive",
                context
            );
            return Ok(None);
        }

        // Step 1: TRUE and FALSE must render distinguishable pages.
        let true_resp = match self.send_step(mutant, &pair.true_stmt, "TRUE").await {
            Some(response) => response,
            None => return Ok(None),
        };
        let false_resp = match self.send_step(mutant, &pair.false_stmt, "FALSE").await {
            Some(response) => response,
            None => return Ok(None),
        };

        let true_false_score =
            ResponseComparator::overlap_score(&true_resp.body, &false_resp.body);
        if self.comparator.similar(&true_resp.body, &false_resp.body) {
            debug!(
                "[{}] TRUE and FALSE pages look alike (score {:.3}), not injectable",
                context, true_false_score
            );
            return Ok(None);
        }

        // Step 2: a broken-syntax page that matches TRUE means the value
        // likely never reaches a query, or errors are swallowed identically.
        let error_payload = format!("{original}{SYNTAX_ERROR_PAYLOAD}");
        let error_resp = match self.send_step(mutant, &error_payload, "syntax-error").await {
            Some(response) => response,
            None => return Ok(None),
        };
        if self.comparator.similar(&true_resp.body, &error_resp.body) {
            debug!(
                "[{}] syntax-error page matches the TRUE page, not injectable",
                context
            );
            return Ok(None);
        }

        // Step 3: second pair with an independently drawn random value.
        let second_pair = StatementPair::generate(context, original, &[pair.rand])?;
        let true2_resp = match self.send_step(mutant, &second_pair.true_stmt, "TRUE2").await {
            Some(response) => response,
            None => return Ok(None),
        };
        let false2_resp = match self
            .send_step(mutant, &second_pair.false_stmt, "FALSE2")
            .await
        {
            Some(response) => response,
            None => return Ok(None),
        };

        // Step 4: the TRUE/FALSE distinction must reproduce.
        let true_match = self.comparator.similar(&true2_resp.body, &true_resp.body);
        let false_match = self.comparator.similar(&false2_resp.body, &false_resp.body);
        if !(true_match && false_match) {
            debug!(
                "[{}] second round did not reproduce (TRUE2~TRUE: {}, FALSE2~FALSE: {}), not injectable",
                context, true_match, false_match
            );
            return Ok(None);
        }

        // Step 5: confirmed.
        let finding = self.build_finding(
            mutant,
            context,
            &pair,
            &true_resp,
            &false_resp,
            &error_resp,
            true_false_score,
        );
        info!(
            "Blind SQL injection ({}) confirmed in parameter '{}'",
            context,
            mutant.point().name
        );
        Ok(Some(finding))
    }

    async fn send_step(
        &self,
        mutant: &mut Mutant,
        payload: &str,
        step: &str,
    ) -> Option<HttpResponse> {
        mutant.set_mod_value(payload);
        match self.transport.send(&mutant.render()).await {
            Ok(response) => Some(response),
            Err(error) => {
                debug!("blind boolean {} step inconclusive: {}", step, error);
                None
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_finding(
        &self,
        mutant: &mut Mutant,
        context: SqlContext,
        pair: &StatementPair,
        true_resp: &HttpResponse,
        false_resp: &HttpResponse,
        error_resp: &HttpResponse,
        true_false_score: f64,
    ) -> Finding {
        let confidence = if has_sql_error_indicators(&error_resp.body) {
            Confidence::High
        } else {
            Confidence::Medium
        };

        let evidence = format!(
            "Boolean blind injection, {} context:\n\
             - TRUE/FALSE page overlap: {:.1}%\n\
             - TRUE page: response id {}\n\
             - FALSE page: response id {}\n\
             - syntax-error page: response id {}\n\
             - distinction reproduced with an independent statement pair",
            context,
            true_false_score * 100.0,
            true_resp.id,
            false_resp.id,
            error_resp.id
        );

        // Persisted artifacts must not carry leftover probe state.
        mutant.set_mod_value("");
        let description = format!(
            "Blind SQL injection ({} context) was found at: {}",
            context,
            mutant.found_at()
        );

        Finding {
            id: new_finding_id("blind_sqli"),
            vuln_type: format!("Blind SQL Injection ({})", context.as_str()),
            severity: Severity::High,
            confidence,
            category: "Injection".to_string(),
            url: mutant.base().url_without_query(),
            parameter: Some(mutant.point().name.clone()),
            payload: format!("TRUE: {} | FALSE: {}", pair.true_stmt, pair.false_stmt),
            description,
            evidence: Some(evidence),
            cwe: "CWE-89".to_string(),
            response_ids: vec![true_resp.id, false_resp.id, error_resp.id],
            discovered_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
