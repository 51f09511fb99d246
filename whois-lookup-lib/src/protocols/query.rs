//! Query rendering from per-server templates.
//!
//! A template is plain text with two kinds of tokens:
//!
//! ```text
//! {domain}        the ASCII domain being looked up (required)
//! {strict:TEXT}   TEXT in strict mode, nothing in loose mode
//! ```
//!
//! For example `"{strict:=}{domain}\r\n"` renders `example.com\r\n` loosely
//! and `=example.com\r\n` strictly, which is how registries with fuzzy
//! search are asked for an exact match.

use crate::error::WhoisError;

/// Template used when a server does not configure one.
pub const DEFAULT_QUERY_FORMAT: &str = "{domain}\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Domain,
    Strict(String),
}

/// Renders server-specific query strings.
///
/// One builder serves both attempts of a hop: only the strict flag changes
/// between the loose and the strict query. Call [`reset`](Self::reset)
/// before reusing it for another hop or domain.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    format: Option<String>,
    segments: Vec<Segment>,
    strict: bool,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set and parse the template.
    pub fn set_format(&mut self, format: &str) -> Result<&mut Self, WhoisError> {
        self.segments = parse_template(format)?;
        self.format = Some(format.to_string());
        Ok(self)
    }

    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Forget the template and go back to loose mode.
    pub fn reset(&mut self) -> &mut Self {
        self.format = None;
        self.segments.clear();
        self.strict = false;
        self
    }

    /// Render the query for `domain` in the current mode.
    pub fn build(&self, domain: &str) -> Result<String, WhoisError> {
        if self.format.is_none() {
            return Err(WhoisError::invalid_format("", "No query format set"));
        }

        let mut query = String::with_capacity(domain.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => query.push_str(text),
                Segment::Domain => query.push_str(domain),
                Segment::Strict(text) => {
                    if self.strict {
                        query.push_str(text);
                    }
                }
            }
        }
        Ok(query)
    }

    /// Check a template without keeping it.
    pub fn validate(format: &str) -> Result<(), WhoisError> {
        parse_template(format).map(|_| ())
    }
}

/// One-shot rendering: `build(format, domain)` in the given mode.
pub fn build_query(format: &str, domain: &str, strict: bool) -> Result<String, WhoisError> {
    let mut builder = QueryBuilder::new();
    builder.set_format(format)?.set_strict(strict);
    builder.build(domain)
}

fn parse_template(format: &str) -> Result<Vec<Segment>, WhoisError> {
    let mut segments = Vec::new();
    let mut has_domain = false;
    let mut rest = format;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| WhoisError::invalid_format(format, "Unterminated '{' in template"))?;
        let token = &after[..close];

        if token == "domain" {
            has_domain = true;
            segments.push(Segment::Domain);
        } else if let Some(text) = token.strip_prefix("strict:") {
            segments.push(Segment::Strict(text.to_string()));
        } else {
            return Err(WhoisError::invalid_format(
                format,
                format!("Unknown token '{{{}}}'", token),
            ));
        }
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    if !has_domain {
        return Err(WhoisError::invalid_format(
            format,
            "Template lacks the {domain} placeholder",
        ));
    }
    Ok(segments)
}
