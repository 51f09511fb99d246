//! Completeness ranking of decoded records.

use crate::types::Record;
use std::fmt::Debug;

/// Scores how complete a record is.
///
/// Scores must be monotonic: a record with more populated fields never
/// scores lower than one with fewer.
pub trait RankCalculator: Debug + Send + Sync {
    fn rank(&self, record: &Record) -> u32;
}

/// Default ranking: populated field count first, load-bearing fields second.
///
/// The field count is scaled so that the weights (which sum to less than the
/// scale) only ever break ties between records of equal size.
#[derive(Debug, Clone, Default)]
pub struct FieldRankCalculator;

const COUNT_SCALE: u32 = 100;

impl FieldRankCalculator {
    pub fn new() -> Self {
        Self
    }

    fn weight(record: &Record) -> u32 {
        let weighted = [
            (record.registrar.is_some(), 16),
            (record.creation_date.is_some(), 12),
            (record.expiration_date.is_some(), 12),
            (record.domain.is_some(), 8),
            (!record.name_servers.is_empty(), 6),
            (record.updated_date.is_some(), 4),
            (!record.statuses.is_empty(), 4),
            (record.owner.is_some(), 4),
            (record.referral_host.is_some(), 2),
        ];
        weighted
            .iter()
            .filter(|(populated, _)| *populated)
            .map(|(_, weight)| weight)
            .sum()
    }
}

impl RankCalculator for FieldRankCalculator {
    fn rank(&self, record: &Record) -> u32 {
        record.populated_fields() as u32 * COUNT_SCALE + Self::weight(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_more_fields_always_rank_higher() {
        let calc = FieldRankCalculator::new();

        let heavy_pair = Record {
            registrar: Some("R".into()),
            creation_date: Some("2000-01-01".into()),
            ..Default::default()
        };
        let light_triple = Record {
            referral_host: Some("whois.test".into()),
            owner: Some("O".into()),
            statuses: vec!["ok".into()],
            ..Default::default()
        };
        assert!(calc.rank(&light_triple) > calc.rank(&heavy_pair));
    }

    #[test]
    fn test_load_bearing_fields_break_ties() {
        let calc = FieldRankCalculator::new();

        let with_registrar = Record {
            domain: Some("example.test".into()),
            registrar: Some("R".into()),
            ..Default::default()
        };
        let with_referral = Record {
            domain: Some("example.test".into()),
            referral_host: Some("whois.test".into()),
            ..Default::default()
        };
        assert!(calc.rank(&with_registrar) > calc.rank(&with_referral));
        assert_eq!(calc.rank(&Record::default()), 0);
    }
}
