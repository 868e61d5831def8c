// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Mutant
 * One (injection point, payload) variant of a base request
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use crate::fuzzer::{FuzzKind, FuzzPoint};
use crate::request::BaseRequest;

/// Identity of a fuzzed location: the key under which findings are
/// deduplicated. Deliberately ignores the payload value and any response
/// ids, so every payload variant of one location maps to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetKey {
    pub url: String,
    pub method: String,
    pub kind: &'static str,
    pub name: String,
}

/// A copy of the base request with exactly one location replaced.
///
/// The oracles intentionally re-use one mutant across their sequential
/// protocol steps by overwriting `mod_value` and re-rendering; a mutant is
/// otherwise immutable after creation. The optional original response body
/// is shared by every mutant of one base request and supports "the payload
/// already appears in the unmodified page" false-positive suppression.
#[derive(Debug, Clone)]
pub struct Mutant {
    base: BaseRequest,
    point: FuzzPoint,
    mod_value: String,
    original_response_body: Option<Arc<String>>,
}

impl Mutant {
    pub fn new(base: BaseRequest, point: FuzzPoint, mod_value: String) -> Self {
        Self {
            base,
            point,
            mod_value,
            original_response_body: None,
        }
    }

    pub fn with_original_response(mut self, body: Arc<String>) -> Self {
        self.original_response_body = Some(body);
        self
    }

    pub fn base(&self) -> &BaseRequest {
        &self.base
    }

    pub fn point(&self) -> &FuzzPoint {
        &self.point
    }

    pub fn mod_value(&self) -> &str {
        &self.mod_value
    }

    pub fn set_mod_value(&mut self, value: &str) {
        self.mod_value = value.to_string();
    }

    pub fn original_value(&self) -> &str {
        &self.point.original_value
    }

    pub fn set_original_value(&mut self, value: &str) {
        self.point.original_value = value.to_string();
    }

    pub fn original_response_body(&self) -> Option<&Arc<String>> {
        self.original_response_body.as_ref()
    }

    /// True when the unmodified page already contains the given payload
    /// string, in which case a match in the mutated response proves nothing.
    pub fn payload_reflected_in_original(&self, payload: &str) -> bool {
        self.original_response_body
            .as_ref()
            .map(|body| body.contains(payload))
            .unwrap_or(false)
    }

    /// Re-materialize a complete, independent request with the fuzzed
    /// location set to `mod_value` and every other field untouched.
    pub fn render(&self) -> BaseRequest {
        let mut request = self.base.clone();
        match &self.point.kind {
            FuzzKind::Query => {
                request.set_query_value(&self.point.name, &self.mod_value);
            }
            FuzzKind::Form => {
                request.set_form_value(&self.point.name, &self.mod_value);
            }
            FuzzKind::JsonLeaf { path } => {
                request.set_json_leaf(path, &self.mod_value);
            }
            FuzzKind::Header => {
                request.set_header_value(&self.point.name, &self.mod_value);
            }
            FuzzKind::Cookie => {
                request.set_cookie_value(&self.point.name, &self.mod_value);
            }
            FuzzKind::Filename {
                prefix,
                suffix,
                keep_slash,
            } => {
                let encoded = if *keep_slash {
                    self.mod_value
                        .split('/')
                        .map(|part| urlencoding::encode(part).into_owned())
                        .collect::<Vec<_>>()
                        .join("/")
                } else {
                    urlencoding::encode(&self.mod_value).into_owned()
                };
                request.set_url_filename(&format!("{prefix}{encoded}{suffix}"));
            }
            FuzzKind::FileContent { filename } => {
                request.set_file_content(
                    &self.point.name,
                    filename,
                    self.mod_value.clone().into_bytes(),
                );
            }
        }
        request
    }

    /// Human-readable injection point description, used verbatim in finding
    /// descriptions. Stable and deterministic for a given mutant state.
    pub fn found_at(&self) -> String {
        format!(
            "\"{}\", using HTTP method {}. The modified parameter was \"{}\", with value: \"{}\".",
            self.base.url_without_query(),
            self.base.method(),
            self.point.name,
            self.mod_value
        )
    }

    /// Dedup key: two mutants target the same bug location when they agree
    /// on URL, method and fuzz point kind+name.
    pub fn target_key(&self) -> TargetKey {
        TargetKey {
            url: self.base.url_without_query(),
            method: self.base.method().to_string(),
            kind: self.point.kind.label(),
            name: self.point.name.clone(),
        }
    }
}
