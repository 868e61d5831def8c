// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Koetin Injection Engine
 * Mutation/fuzzing engine and blind-injection oracles for audit plugins
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod comparator;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod fuzzer;
pub mod knowledge_base;
pub mod payloads;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

// Oracle implementations (boolean blind and time delay)
pub mod oracles;

pub use engine::{AuditSummary, InjectionEngine};
pub use types::{Confidence, Finding, ScanConfig, Severity};
