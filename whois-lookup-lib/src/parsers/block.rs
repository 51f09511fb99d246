//! Decoder for replies made of separate objects (RPSL-like registries).
//!
//! Such replies interleave the domain object with contact, registrar and
//! host objects, each a contiguous block. Only the domain's own block is
//! decoded; data from sibling objects never leaks into the record.

use super::fields::{
    has_domain_key, is_comment, is_not_found, mentions_domain, record_from_pairs, split_pair, Pair,
};
use super::ResponseDecoder;
use crate::types::{RawResponse, Record};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDecoder;

impl BlockDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Blank-line separated blocks; indented lines continue the previous key.
    fn blocks(text: &str) -> Vec<Vec<Pair>> {
        let mut blocks = Vec::new();
        let mut current: Vec<Pair> = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                continue;
            }
            if is_comment(line) {
                continue;
            }

            let continued = line.starts_with([' ', '\t']) && !current.is_empty();
            match split_pair(line) {
                Some(pair) if !continued || !pair.1.is_empty() => current.push(pair),
                _ if continued => {
                    if let Some((key, _)) = current.last() {
                        let key = key.clone();
                        current.push((key, line.trim().to_string()));
                    }
                }
                _ => {}
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }
        blocks
    }

    /// The block describing `domain`, or failing that the first domain block.
    fn extract_block(text: &str, domain: &str) -> Option<Vec<Pair>> {
        let blocks = Self::blocks(text);
        let pos = blocks
            .iter()
            .position(|block| mentions_domain(block, domain))
            .or_else(|| blocks.iter().position(|block| has_domain_key(block)))?;
        blocks.into_iter().nth(pos)
    }
}

impl ResponseDecoder for BlockDecoder {
    fn decode(&self, response: &RawResponse) -> Option<Record> {
        if is_not_found(&response.output, &response.domain) {
            return None;
        }
        let block = Self::extract_block(&response.output, &response.domain)?;
        record_from_pairs(&block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FR_REPLY: &str = "%%\n%% This is the AFNIC Whois server.\n%%\n\n\
        domain:                        example.fr\n\
        status:                        ACTIVE\n\
        hold:                          NO\n\
        holder-c:                      ANO00-FRNIC\n\
        registrar:                     EXAMPLE REGISTRAR SAS\n\
        Expiry Date:                   2030-03-01T10:00:00Z\n\
        created:                       2000-03-01T10:00:00Z\n\
        last-update:                   2024-02-01T10:00:00Z\n\
        nserver:                       ns1.example.fr\n\
        nserver:                       ns2.example.fr\n\n\
        registrar:                     EXAMPLE REGISTRAR SAS\n\
        address:                       1 rue de test\n\
        country:                       FR\n\
        created:                       1999-01-01T00:00:00Z\n\
        status:                        ACTIVE\n\n\
        nic-hdl:                       ANO00-FRNIC\n\
        type:                          PERSON\n\
        changed:                       2020-01-01T00:00:00Z\n";

    fn response(domain: &str, output: &str) -> RawResponse {
        RawResponse {
            domain: domain.to_string(),
            host: "whois.nic.fr".to_string(),
            query: format!("{}\r\n", domain),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_decodes_only_domain_block() {
        let record = BlockDecoder::new()
            .decode(&response("example.fr", FR_REPLY))
            .unwrap();

        assert_eq!(record.domain.as_deref(), Some("example.fr"));
        assert_eq!(record.registrar.as_deref(), Some("EXAMPLE REGISTRAR SAS"));
        assert_eq!(record.creation_date.as_deref(), Some("2000-03-01T10:00:00Z"));
        assert_eq!(record.expiration_date.as_deref(), Some("2030-03-01T10:00:00Z"));
        assert_eq!(record.updated_date.as_deref(), Some("2024-02-01T10:00:00Z"));
        assert_eq!(record.name_servers, vec!["ns1.example.fr", "ns2.example.fr"]);
        assert_eq!(record.statuses, vec!["ACTIVE"]);
    }

    #[test]
    fn test_indented_continuation_lines() {
        let text = concat!(
            "domain: example.test\nnameservers:\n",
            "    ns1.example.test\n    ns2.example.test\n",
            "status: ok\n",
        );
        let record = BlockDecoder::new()
            .decode(&response("example.test", text))
            .unwrap();
        assert_eq!(record.name_servers, vec!["ns1.example.test", "ns2.example.test"]);
        assert_eq!(record.statuses, vec!["ok"]);
    }

    #[test]
    fn test_no_domain_block() {
        let text = "nic-hdl: ANO00-FRNIC\ntype: PERSON\n\nregistrar: SOMEONE\n";
        assert!(BlockDecoder::new()
            .decode(&response("example.fr", text))
            .is_none());
    }

    #[test]
    fn test_falls_back_to_first_domain_block() {
        let text = "remarks: header\n\ndomain: EXAMPLE.TEST\nregistrar: R\n";
        let record = BlockDecoder::new()
            .decode(&response("xn--other.test", text))
            .unwrap();
        assert_eq!(record.registrar.as_deref(), Some("R"));
    }
}
