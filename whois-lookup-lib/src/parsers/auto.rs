//! Decoder that runs several strategies and keeps the most complete result.

use super::rank::{FieldRankCalculator, RankCalculator};
use super::{Decoder, DecoderKind, ResponseDecoder};
use crate::types::{RawResponse, Record};
use std::sync::Arc;

/// Strategies tried by default, in tie-break order.
pub const AUTO_CANDIDATES: &[DecoderKind] = &[
    DecoderKind::Common,
    DecoderKind::CommonFlat,
    DecoderKind::Block,
    DecoderKind::Indent,
    DecoderKind::IndentAutofix,
];

#[derive(Debug, Clone)]
pub struct AutoDecoder {
    decoders: Vec<Decoder>,
    rank: Arc<dyn RankCalculator>,
}

impl Default for AutoDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoDecoder {
    pub fn new() -> Self {
        Self {
            decoders: AUTO_CANDIDATES
                .iter()
                .map(|kind| Decoder::from_kind(*kind))
                .collect(),
            rank: Arc::new(FieldRankCalculator::new()),
        }
    }

    /// Replace the candidate list. Earlier candidates win ties.
    pub fn with_decoders(mut self, decoders: Vec<Decoder>) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn with_rank_calculator(mut self, rank: Arc<dyn RankCalculator>) -> Self {
        self.rank = rank;
        self
    }

    pub fn decoders(&self) -> &[Decoder] {
        &self.decoders
    }
}

impl ResponseDecoder for AutoDecoder {
    fn decode(&self, response: &RawResponse) -> Option<Record> {
        let mut best: Option<(u32, Record)> = None;

        for decoder in &self.decoders {
            let Some(record) = decoder.decode(response) else {
                continue;
            };
            let rank = self.rank.rank(&record);
            tracing::trace!("{} decoder ranked {} for {}", decoder.name(), rank, response.domain);
            if best.as_ref().map_or(true, |(top, _)| rank > *top) {
                best = Some((rank, record));
            }
        }

        best.map(|(_, record)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(domain: &str, output: &str) -> RawResponse {
        RawResponse {
            domain: domain.to_string(),
            host: "whois.test".to_string(),
            query: format!("{}\r\n", domain),
            output: output.to_string(),
        }
    }

    /// Counts fields, nothing else; every decoder here reads the same
    /// fields so ties fall to candidate order.
    #[derive(Debug)]
    struct CountOnly;

    impl RankCalculator for CountOnly {
        fn rank(&self, record: &Record) -> u32 {
            record.populated_fields() as u32
        }
    }

    #[test]
    fn test_picks_most_complete_record() {
        // Only the indent decoder sees the nested registrar and dates.
        let text = "Domain: example.eu\n\nRegistrar:\n        Name: Example Registrar\n\
                    Relevant dates:\n        Registered on: 2001-01-01\n";
        let record = AutoDecoder::new()
            .decode(&response("example.eu", text))
            .unwrap();
        assert_eq!(record.registrar.as_deref(), Some("Example Registrar"));
        assert_eq!(record.creation_date.as_deref(), Some("2001-01-01"));
    }

    #[test]
    fn test_skips_decoders_without_record() {
        // Block finds no domain block here, the flat decoder still does.
        let auto = AutoDecoder::new().with_decoders(vec![
            Decoder::from_kind(DecoderKind::Block),
            Decoder::from_kind(DecoderKind::CommonFlat),
        ]);
        let record = auto
            .decode(&response("example.test", "Registrar: Only Registrar\n"))
            .unwrap();
        assert_eq!(record.registrar.as_deref(), Some("Only Registrar"));
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        // Same field count; common prefers the domain group, flat reads top-down.
        let text = "Domain Name: EXAMPLE.TEST.EVIL\nRegistrar: Lookalike\n\n\
                    Domain Name: EXAMPLE.TEST\nRegistrar: Real\n";

        let common_first = AutoDecoder::new()
            .with_decoders(vec![
                Decoder::from_kind(DecoderKind::Common),
                Decoder::from_kind(DecoderKind::CommonFlat),
            ])
            .with_rank_calculator(Arc::new(CountOnly));
        let record = common_first.decode(&response("example.test", text)).unwrap();
        assert_eq!(record.registrar.as_deref(), Some("Real"));

        let flat_first = AutoDecoder::new()
            .with_decoders(vec![
                Decoder::from_kind(DecoderKind::CommonFlat),
                Decoder::from_kind(DecoderKind::Common),
            ])
            .with_rank_calculator(Arc::new(CountOnly));
        let record = flat_first.decode(&response("example.test", text)).unwrap();
        assert_eq!(record.registrar.as_deref(), Some("Lookalike"));
    }

    #[test]
    fn test_no_candidate_decodes() {
        let auto = AutoDecoder::new();
        assert!(auto.decode(&response("nope.test", "No match for nope.test\n")).is_none());
        assert!(auto.decode(&response("nope.test", "")).is_none());
    }
}
