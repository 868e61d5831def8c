// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Base Request Model
 * Structured HTTP request description whose individual fields are
 * mutation targets for the fuzzer
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// One uploaded file inside a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub content: Vec<u8>,
}

/// Path to one leaf inside a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// URL-encoded key/value pairs, order preserved.
    Form(Vec<(String, String)>),
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

/// An observed HTTP request, decomposed into its injectable surfaces.
///
/// `Clone` is a deep copy: a cloned request never aliases the original's
/// containers, so mutants cannot cross-contaminate.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseRequest {
    method: String,
    /// URL with the query string stripped; query pairs are held separately
    /// so single parameters can be rewritten without re-parsing.
    url: Url,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: RequestBody,
}

impl BaseRequest {
    fn parse(method: &str, url_str: &str, body: RequestBody) -> Result<Self> {
        let mut url = Url::parse(url_str).with_context(|| format!("invalid URL: {url_str}"))?;
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);
        Ok(Self {
            method: method.to_uppercase(),
            url,
            query,
            headers: Vec::new(),
            cookies: Vec::new(),
            body,
        })
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::parse("GET", url, RequestBody::Empty)
    }

    pub fn post_form(url: &str, fields: Vec<(String, String)>) -> Result<Self> {
        Self::parse("POST", url, RequestBody::Form(fields))
    }

    pub fn post_json(url: &str, json: Value) -> Result<Self> {
        Self::parse("POST", url, RequestBody::Json(json))
    }

    pub fn post_multipart(
        url: &str,
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    ) -> Result<Self> {
        Self::parse("POST", url, RequestBody::Multipart { fields, files })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header_value(name, value);
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.set_cookie_value(name, value);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Full URL with the query string re-attached.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }

    /// URL without query string, as used in finding descriptions and dedup
    /// keys.
    pub fn url_without_query(&self) -> String {
        self.url.to_string()
    }

    /// Last path segment of the URL, if any.
    pub fn file_name(&self) -> Option<String> {
        self.url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    /// Cookie header value rendered from the cookie pairs.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Set a query parameter by name. Returns false if no such parameter.
    pub fn set_query_value(&mut self, name: &str, value: &str) -> bool {
        for (k, v) in &mut self.query {
            if k == name {
                *v = value.to_string();
                return true;
            }
        }
        false
    }

    /// Set a form field (url-encoded body or multipart text field) by name.
    pub fn set_form_value(&mut self, name: &str, value: &str) -> bool {
        let fields = match &mut self.body {
            RequestBody::Form(fields) => fields,
            RequestBody::Multipart { fields, .. } => fields,
            _ => return false,
        };
        for (k, v) in fields {
            if k == name {
                *v = value.to_string();
                return true;
            }
        }
        false
    }

    /// Set one JSON leaf addressed by path. A leaf that was a number keeps
    /// its numeric type when the replacement is purely numeric, so numeric
    /// injection contexts stay syntactically valid server-side.
    pub fn set_json_leaf(&mut self, path: &[JsonSegment], value: &str) -> bool {
        let json = match &mut self.body {
            RequestBody::Json(json) => json,
            _ => return false,
        };
        let mut node = json;
        for segment in path {
            node = match segment {
                JsonSegment::Key(key) => match node.get_mut(key.as_str()) {
                    Some(child) => child,
                    None => return false,
                },
                JsonSegment::Index(index) => match node.get_mut(*index) {
                    Some(child) => child,
                    None => return false,
                },
            };
        }
        *node = if node.is_number() {
            match value.parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(value.to_string()),
            }
        } else {
            Value::String(value.to_string())
        };
        true
    }

    /// Set or add a header.
    pub fn set_header_value(&mut self, name: &str, value: &str) {
        for (k, v) in &mut self.headers {
            if k.eq_ignore_ascii_case(name) {
                *v = value.to_string();
                return;
            }
        }
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Set or add a cookie by key.
    pub fn set_cookie_value(&mut self, name: &str, value: &str) {
        for (k, v) in &mut self.cookies {
            if k == name {
                *v = value.to_string();
                return;
            }
        }
        self.cookies.push((name.to_string(), value.to_string()));
    }

    /// Replace the URL's file name (last path segment). The caller supplies
    /// the segment pre-encoded; percent signs survive `set_path` unchanged,
    /// and a literal `/` becomes a real path separator, which is exactly
    /// what the rewrite-rule probe variant wants.
    pub fn set_url_filename(&mut self, segment: &str) {
        let path = self.url.path();
        let new_path = match path.rfind('/') {
            Some(pos) => format!("{}/{}", &path[..pos], segment),
            None => format!("/{segment}"),
        };
        self.url.set_path(&new_path);
    }

    /// Replace the content (and synthetic filename) of an uploaded file.
    pub fn set_file_content(&mut self, name: &str, filename: &str, content: Vec<u8>) -> bool {
        if let RequestBody::Multipart { files, .. } = &mut self.body {
            for file in files {
                if file.name == name {
                    file.filename = filename.to_string();
                    file.content = content;
                    return true;
                }
            }
        }
        false
    }
}
