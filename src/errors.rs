// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Engine Error Types
 * Typed error taxonomy for the injection engine, built with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use thiserror::Error;

/// Top-level engine error aggregating the taxonomy below.
///
/// Ambiguous oracle outcomes are never errors: every early-termination branch
/// of the oracles returns a typed "no finding" value instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("payload generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Errors raised by the transport collaborator while performing a send.
///
/// The oracle step that hit the error is treated as inconclusive, not as a
/// negative result and not as a positive result.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request exceeded the configured timeout. `elapsed_ms` carries how
    /// long the transport actually waited, which the delay oracle needs: a
    /// probe that timed out past its expected delay is still an observation.
    #[error("request to {url} timed out after {elapsed_ms}ms")]
    Timeout { url: String, elapsed_ms: u64 },

    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("request could not be built: {0}")]
    InvalidRequest(String),

    #[error("transport error for {url}: {reason}")]
    Other { url: String, reason: String },
}

/// Errors raised by the payload generators.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The random-number generator could not produce a value outside the
    /// caller's exclusion set within the retry budget.
    #[error("no random number outside the excluded set after {attempts} attempts")]
    ExclusionExhausted { attempts: u32 },
}

/// Configuration problems detected before any request is sent.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("similarity threshold must be within (0, 1), got {0}")]
    ThresholdOutOfRange(f64),

    #[error("unknown comparator strategy: {0:?}")]
    UnknownStrategy(String),

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("delay must be at least 1 second, got {0}")]
    DelayTooShort(u64),

    #[error("fuzzed file extension must not be empty")]
    EmptyFileExtension,
}
