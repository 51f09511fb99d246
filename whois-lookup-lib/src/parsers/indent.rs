//! Decoder for replies whose structure is carried by indentation.
//!
//! ```text
//!     Registrar:
//!         Example Registrar Ltd [Tag = EXAMPLE]
//!         URL: https://registrar.example
//!     Relevant dates:
//!         Registered on: 26-Aug-1996
//! ```
//!
//! Text lines belong to the nearest less-indented key above them; keyed
//! children are reported both by their own key and prefixed with their
//! parent's (`registrar url`), so `Registrar:` / `Name:` reads as
//! `registrar name`.
//!
//! Autofix mode repairs sloppy indentation first: tabs become four spaces,
//! runs of inner whitespace collapse, and value lines written at the same
//! depth as their header are treated as its children.

use super::fields::{is_comment, is_not_found, record_from_pairs, split_pair, Pair};
use super::ResponseDecoder;
use crate::types::{RawResponse, Record};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndentDecoder {
    autofix: bool,
}

struct Line {
    indent: usize,
    pair: Option<Pair>,
    text: String,
}

impl IndentDecoder {
    pub fn new() -> Self {
        Self { autofix: false }
    }

    pub fn autofix() -> Self {
        Self { autofix: true }
    }

    pub fn is_autofix(&self) -> bool {
        self.autofix
    }

    fn lines(&self, text: &str) -> Vec<Line> {
        text.lines()
            .filter(|line| !line.trim().is_empty() && !is_comment(line))
            .map(|raw| {
                let line = if self.autofix {
                    raw.replace('\t', "    ")
                } else {
                    raw.to_string()
                };
                let indent = line.len() - line.trim_start().len();
                let content = if self.autofix {
                    line.split_whitespace().collect::<Vec<_>>().join(" ")
                } else {
                    line.trim().to_string()
                };
                Line {
                    indent,
                    pair: split_pair(&content),
                    text: content,
                }
            })
            .collect()
    }

    fn pairs(&self, text: &str) -> Vec<Pair> {
        let mut pairs = Vec::new();
        // Open keys: (indent, key)
        let mut stack: Vec<(usize, String)> = Vec::new();
        // Header whose values sit at its own depth (autofix only)
        let mut flush_header: Option<(usize, String)> = None;

        for line in self.lines(text) {
            if self.autofix && line.pair.is_none() {
                if let Some((indent, key)) = &flush_header {
                    if *indent == line.indent {
                        pairs.push((key.clone(), line.text));
                        continue;
                    }
                }
            }
            flush_header = None;

            while stack.last().is_some_and(|(indent, _)| *indent >= line.indent) {
                stack.pop();
            }

            match line.pair {
                Some((key, value)) => {
                    if let Some((_, parent)) = stack.last() {
                        pairs.push((format!("{} {}", parent, key), value.clone()));
                    }
                    if value.is_empty() {
                        flush_header = Some((line.indent, key.clone()));
                    }
                    pairs.push((key.clone(), value));
                    stack.push((line.indent, key));
                }
                None => {
                    if let Some((_, parent)) = stack.last() {
                        pairs.push((parent.clone(), line.text));
                    }
                }
            }
        }
        pairs
    }
}

impl ResponseDecoder for IndentDecoder {
    fn decode(&self, response: &RawResponse) -> Option<Record> {
        if is_not_found(&response.output, &response.domain) {
            return None;
        }
        record_from_pairs(&self.pairs(&response.output))
    }
}
