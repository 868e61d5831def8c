// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Response Comparator
 * Decides whether two response bodies are "the same page" under a
 * configurable strategy; the statistical core of blind detection
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\w+").expect("token pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareStrategy {
    /// Byte-for-byte equality. Too brittle for dynamic pages, but exact.
    Exact,
    /// Dice coefficient over word-token sets against a threshold. Tolerates
    /// cosmetic differences (ads, timestamps, CSRF tokens) while still
    /// separating structurally different pages.
    TokenOverlap,
}

impl Default for CompareStrategy {
    fn default() -> Self {
        CompareStrategy::TokenOverlap
    }
}

impl FromStr for CompareStrategy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(CompareStrategy::Exact),
            "tokenOverlap" | "token_overlap" => Ok(CompareStrategy::TokenOverlap),
            other => Err(ConfigurationError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Pure, deterministic body comparator. Callers own any logging of scores.
#[derive(Debug, Clone, Copy)]
pub struct ResponseComparator {
    strategy: CompareStrategy,
    threshold: f64,
}

impl ResponseComparator {
    pub fn new(strategy: CompareStrategy, threshold: f64) -> Self {
        Self {
            strategy,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Token-set Dice coefficient: `2|S1 ∩ S2| / (|S1| + |S2|)`.
    /// Independent of token order and repetition. Two empty token sets score
    /// 0.0: with nothing to compare, equality cannot be asserted.
    pub fn overlap_score(body_a: &str, body_b: &str) -> f64 {
        let tokens_a: HashSet<&str> = token_re().find_iter(body_a).map(|m| m.as_str()).collect();
        let tokens_b: HashSet<&str> = token_re().find_iter(body_b).map(|m| m.as_str()).collect();

        let total = tokens_a.len() + tokens_b.len();
        if total == 0 {
            return 0.0;
        }
        let shared = tokens_a.intersection(&tokens_b).count();
        2.0 * shared as f64 / total as f64
    }

    /// Decide whether two bodies represent the same page.
    pub fn similar(&self, body_a: &str, body_b: &str) -> bool {
        match self.strategy {
            CompareStrategy::Exact => body_a == body_b,
            CompareStrategy::TokenOverlap => Self::overlap_score(body_a, body_b) > self.threshold,
        }
    }
}
