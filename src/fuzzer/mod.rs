// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Injectable Surface Model
 * Enumerates every fuzzable location of a base request and produces
 * mutants for (location, payload) pairs
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::request::{BaseRequest, JsonSegment, RequestBody};
use crate::types::ScanConfig;

pub mod mutant;

pub use mutant::{Mutant, TargetKey};

static ALNUM_RUN_RE: OnceLock<Regex> = OnceLock::new();

fn alnum_run_re() -> &'static Regex {
    ALNUM_RUN_RE.get_or_init(|| Regex::new("[a-zA-Z0-9]+").expect("run pattern is valid"))
}

/// Kind of injectable location, with whatever context rendering needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FuzzKind {
    Query,
    /// URL-encoded body field or multipart text field.
    Form,
    JsonLeaf {
        path: Vec<JsonSegment>,
    },
    Header,
    Cookie,
    /// One alphanumeric run of the URL file name; the surrounding runs are
    /// preserved verbatim. `keep_slash` selects the alternate encoding that
    /// leaves `/` intact to probe rewrite-rule path handling.
    Filename {
        prefix: String,
        suffix: String,
        keep_slash: bool,
    },
    /// Uploaded file content, carried under a synthetic file name.
    FileContent {
        filename: String,
    },
}

impl FuzzKind {
    pub fn label(&self) -> &'static str {
        match self {
            FuzzKind::Query => "query",
            FuzzKind::Form => "post",
            FuzzKind::JsonLeaf { .. } => "json",
            FuzzKind::Header => "header",
            FuzzKind::Cookie => "cookie",
            FuzzKind::Filename { .. } => "filename",
            FuzzKind::FileContent { .. } => "file-content",
        }
    }
}

/// One candidate injection location of a base request.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzPoint {
    pub kind: FuzzKind,
    pub name: String,
    pub original_value: String,
}

fn walk_json_leaves(value: &Value, path: &[JsonSegment], name: &str, out: &mut Vec<FuzzPoint>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let mut child_path = path.to_vec();
                child_path.push(JsonSegment::Key(key.clone()));
                let child_name = if name.is_empty() {
                    key.clone()
                } else {
                    format!("{name}.{key}")
                };
                walk_json_leaves(child, &child_path, &child_name, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let mut child_path = path.to_vec();
                child_path.push(JsonSegment::Index(index));
                walk_json_leaves(child, &child_path, &format!("{name}[{index}]"), out);
            }
        }
        Value::String(s) => out.push(FuzzPoint {
            kind: FuzzKind::JsonLeaf {
                path: path.to_vec(),
            },
            name: name.to_string(),
            original_value: s.clone(),
        }),
        Value::Number(n) => out.push(FuzzPoint {
            kind: FuzzKind::JsonLeaf {
                path: path.to_vec(),
            },
            name: name.to_string(),
            original_value: n.to_string(),
        }),
        // Booleans and nulls are not injectable surfaces.
        _ => {}
    }
}

/// Enumerate every fuzzable location of `base` under the given config.
pub fn enumerate_fuzz_points(base: &BaseRequest, config: &ScanConfig) -> Vec<FuzzPoint> {
    let mut points = Vec::new();

    for (name, value) in base.query_pairs() {
        points.push(FuzzPoint {
            kind: FuzzKind::Query,
            name: name.clone(),
            original_value: value.clone(),
        });
    }

    match base.body() {
        RequestBody::Form(fields) => {
            for (name, value) in fields {
                points.push(FuzzPoint {
                    kind: FuzzKind::Form,
                    name: name.clone(),
                    original_value: value.clone(),
                });
            }
        }
        RequestBody::Json(json) => {
            walk_json_leaves(json, &[], "", &mut points);
        }
        RequestBody::Multipart { fields, files } => {
            for (name, value) in fields {
                points.push(FuzzPoint {
                    kind: FuzzKind::Form,
                    name: name.clone(),
                    original_value: value.clone(),
                });
            }
            if config.fuzz_file_content {
                let filename = format!("fuzzed.{}", config.fuzzed_files_extension);
                for file in files {
                    points.push(FuzzPoint {
                        kind: FuzzKind::FileContent {
                            filename: filename.clone(),
                        },
                        name: file.name.clone(),
                        original_value: String::from_utf8_lossy(&file.content).into_owned(),
                    });
                }
            }
        }
        RequestBody::Empty => {}
    }

    for header in &config.fuzzable_headers {
        points.push(FuzzPoint {
            kind: FuzzKind::Header,
            name: header.clone(),
            original_value: base.header_value(header).unwrap_or_default().to_string(),
        });
    }

    if config.fuzz_cookies {
        for (name, value) in base.cookies() {
            points.push(FuzzPoint {
                kind: FuzzKind::Cookie,
                name: name.clone(),
                original_value: value.clone(),
            });
        }
    }

    if config.fuzz_url_filename {
        if let Some(filename) = base.file_name() {
            for (index, run) in alnum_run_re().find_iter(&filename).enumerate() {
                let prefix = filename[..run.start()].to_string();
                let suffix = filename[run.end()..].to_string();
                // One point per encoding variant; both share the same name,
                // so they dedup to a single reportable location.
                for keep_slash in [false, true] {
                    points.push(FuzzPoint {
                        kind: FuzzKind::Filename {
                            prefix: prefix.clone(),
                            suffix: suffix.clone(),
                            keep_slash,
                        },
                        name: format!("filename[{index}]"),
                        original_value: run.as_str().to_string(),
                    });
                }
            }
        }
    }

    debug!(
        "Enumerated {} fuzz points for {} {}",
        points.len(),
        base.method(),
        base.url_without_query()
    );
    points
}

/// Build the (fuzz point × payload) cross product.
///
/// A non-empty `fuzzable_param_list` restricts generation to the named
/// points; `append` concatenates each payload to the original value instead
/// of replacing it; `original_response` is attached to every mutant for
/// false-positive suppression.
pub fn create_mutants(
    base: &BaseRequest,
    payloads: &[String],
    fuzzable_param_list: &[String],
    append: bool,
    original_response: Option<Arc<String>>,
    config: &ScanConfig,
) -> Vec<Mutant> {
    let points = enumerate_fuzz_points(base, config);
    let mut mutants = Vec::new();

    for point in points {
        if !fuzzable_param_list.is_empty() && !fuzzable_param_list.contains(&point.name) {
            continue;
        }
        for payload in payloads {
            let mod_value = if append {
                format!("{}{}", point.original_value, payload)
            } else {
                payload.clone()
            };
            let mut mutant = Mutant::new(base.clone(), point.clone(), mod_value);
            if let Some(body) = &original_response {
                mutant = mutant.with_original_response(Arc::clone(body));
            }
            mutants.push(mutant);
        }
    }

    mutants
}
