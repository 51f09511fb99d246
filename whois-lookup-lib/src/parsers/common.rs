//! Line-oriented `label: value` decoder.
//!
//! The reply is cut into groups at blank lines. The group naming the queried
//! domain is read first, the rest supplement it. In flat mode the whole body
//! is a single group: blank lines neither split groups nor end a value list.

use super::fields::{
    is_comment, is_not_found, mentions_domain, record_from_pairs, split_pair, Pair,
};
use super::ResponseDecoder;
use crate::types::{RawResponse, Record};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonDecoder {
    flat: bool,
}

impl CommonDecoder {
    pub fn new() -> Self {
        Self { flat: false }
    }

    pub fn flat() -> Self {
        Self { flat: true }
    }

    pub fn is_flat(&self) -> bool {
        self.flat
    }

    /// Pairs per group.
    ///
    /// A key with an empty value opens a value list: following lines without
    /// a key of their own (`Name Servers:` then one host per line) are
    /// attributed to it.
    fn groups(&self, text: &str) -> Vec<Vec<Pair>> {
        let mut groups = Vec::new();
        let mut current: Vec<Pair> = Vec::new();
        let mut list_key: Option<String> = None;

        for line in text.lines() {
            if line.trim().is_empty() {
                if !self.flat {
                    if !current.is_empty() {
                        groups.push(std::mem::take(&mut current));
                    }
                    list_key = None;
                }
                continue;
            }
            if is_comment(line) {
                continue;
            }

            match split_pair(line) {
                Some((key, value)) => {
                    list_key = value.is_empty().then(|| key.clone());
                    current.push((key, value));
                }
                None => {
                    if let Some(key) = &list_key {
                        current.push((key.clone(), line.trim().to_string()));
                    }
                }
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }
}

impl ResponseDecoder for CommonDecoder {
    fn decode(&self, response: &RawResponse) -> Option<Record> {
        if is_not_found(&response.output, &response.domain) {
            return None;
        }

        let mut groups = self.groups(&response.output);
        if !self.flat {
            if let Some(pos) = groups
                .iter()
                .position(|group| mentions_domain(group, &response.domain))
            {
                let primary = groups.remove(pos);
                groups.insert(0, primary);
            }
        }

        let pairs: Vec<Pair> = groups.into_iter().flatten().collect();
        record_from_pairs(&pairs)
    }
}
