// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

use crate::comparator::{CompareStrategy, ResponseComparator};
use crate::errors::ConfigurationError;

/// Target operating system hint used to filter delay statements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Unix,
    Windows,
    Unknown,
}

impl Default for TargetOs {
    fn default() -> Self {
        TargetOs::Unknown
    }
}

/// Target database hint used to filter delay statements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetDbms {
    MySql,
    PostgreSql,
    Mssql,
    Oracle,
    Unknown,
}

impl Default for TargetDbms {
    fn default() -> Self {
        TargetDbms::Unknown
    }
}

/// Engine configuration for one scan run.
///
/// Validated once at engine construction; a bad value never surfaces
/// mid-scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Header names the surface model is allowed to fuzz. Empty = none.
    #[serde(default)]
    pub fuzzable_headers: Vec<String>,

    #[serde(default)]
    pub fuzz_cookies: bool,

    #[serde(default)]
    pub fuzz_url_filename: bool,

    #[serde(default)]
    pub fuzz_file_content: bool,

    /// Extension given to the synthetic filename wrapped around fuzzed
    /// file content.
    #[serde(default = "default_file_extension")]
    pub fuzzed_files_extension: String,

    #[serde(default)]
    pub target_os: TargetOs,

    #[serde(default)]
    pub target_dbms: TargetDbms,

    #[serde(default)]
    pub compare_strategy: CompareStrategy,

    /// Token-overlap decision threshold for the response comparator.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Server-side delay (seconds) requested by the first time-delay probe.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,

    /// Symmetric tolerance (seconds) around the expected delay window.
    #[serde(default = "default_delay_tolerance")]
    pub delay_tolerance: f64,

    /// Bounded worker fan-out for mutant dispatch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_file_extension() -> String {
    "gif".to_string()
}

fn default_similarity_threshold() -> f64 {
    0.8
}

fn default_delay_seconds() -> u64 {
    4
}

fn default_delay_tolerance() -> f64 {
    2.0
}

fn default_concurrency() -> usize {
    10
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fuzzable_headers: Vec::new(),
            fuzz_cookies: false,
            fuzz_url_filename: false,
            fuzz_file_content: false,
            fuzzed_files_extension: default_file_extension(),
            target_os: TargetOs::Unknown,
            target_dbms: TargetDbms::Unknown,
            compare_strategy: CompareStrategy::default(),
            similarity_threshold: default_similarity_threshold(),
            delay_seconds: default_delay_seconds(),
            delay_tolerance: default_delay_tolerance(),
            concurrency: default_concurrency(),
        }
    }
}

impl ScanConfig {
    /// Fail-fast validation, run before any request is sent.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold < 1.0) {
            return Err(ConfigurationError::ThresholdOutOfRange(
                self.similarity_threshold,
            ));
        }
        if self.concurrency == 0 {
            return Err(ConfigurationError::ZeroConcurrency);
        }
        if self.delay_seconds == 0 {
            return Err(ConfigurationError::DelayTooShort(self.delay_seconds));
        }
        if self.fuzzed_files_extension.is_empty() {
            return Err(ConfigurationError::EmptyFileExtension);
        }
        Ok(())
    }

    pub fn comparator(&self) -> ResponseComparator {
        ResponseComparator::new(self.compare_strategy, self.similarity_threshold)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::Low => write!(f, "LOW"),
        }
    }
}

/// A confirmed (or, for the delay oracle's first-window-only outcome,
/// "possible") vulnerability. Created at most once per fuzzed location and
/// never mutated after creation; ownership transfers to the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    #[serde(rename = "type")]
    pub vuln_type: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub category: String,
    pub url: String,
    pub parameter: Option<String>,
    pub payload: String,
    pub description: String,
    pub evidence: Option<String>,
    pub cwe: String,
    /// Ids of the responses that proved the finding, citable against the
    /// transport's response log.
    pub response_ids: Vec<u64>,
    pub discovered_at: String,
}

/// Generate a unique finding id.
pub(crate) fn new_finding_id(prefix: &str) -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    format!(
        "{}_{:08x}-{:04x}-{:012x}",
        prefix,
        rng.random::<u32>(),
        rng.random::<u16>(),
        rng.random::<u64>() & 0xffffffffffff
    )
}
