//! Decoders turning raw WHOIS text into [`Record`]s.
//!
//! Each registry family formats replies differently, so several strategies
//! exist side by side. Servers name theirs in the server table; the `auto`
//! decoder tries all of them and keeps the most complete record.

use crate::error::WhoisError;
use crate::types::{RawResponse, Record};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub mod auto;
pub mod block;
pub mod common;
pub(crate) mod fields;
pub mod indent;
pub mod rank;

pub use auto::AutoDecoder;
pub use block::BlockDecoder;
pub use common::CommonDecoder;
pub use indent::IndentDecoder;
pub use rank::{FieldRankCalculator, RankCalculator};

/// Turns one reply into a record.
///
/// `None` means the reply holds no usable record: the domain is unknown,
/// the text is empty or nothing in it was recognized. Decoding never fails.
pub trait ResponseDecoder {
    fn decode(&self, response: &RawResponse) -> Option<Record>;
}

/// Names accepted in configuration and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    Auto,
    Common,
    CommonFlat,
    Block,
    Indent,
    IndentAutofix,
}

impl DecoderKind {
    pub const ALL: &'static [DecoderKind] = &[
        DecoderKind::Auto,
        DecoderKind::Common,
        DecoderKind::CommonFlat,
        DecoderKind::Block,
        DecoderKind::Indent,
        DecoderKind::IndentAutofix,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::Auto => "auto",
            DecoderKind::Common => "common",
            DecoderKind::CommonFlat => "common_flat",
            DecoderKind::Block => "block",
            DecoderKind::Indent => "indent",
            DecoderKind::IndentAutofix => "indent_autofix",
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DecoderKind {
    type Err = WhoisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .find(|kind| kind.name() == wanted)
            .copied()
            .ok_or_else(|| WhoisError::unknown_decoder(s))
    }
}

/// A configured decoding strategy.
#[derive(Debug, Clone)]
pub enum Decoder {
    Common(CommonDecoder),
    Block(BlockDecoder),
    Indent(IndentDecoder),
    Auto(AutoDecoder),
}

impl Decoder {
    pub fn from_kind(kind: DecoderKind) -> Self {
        match kind {
            DecoderKind::Auto => Decoder::Auto(AutoDecoder::new()),
            DecoderKind::Common => Decoder::Common(CommonDecoder::new()),
            DecoderKind::CommonFlat => Decoder::Common(CommonDecoder::flat()),
            DecoderKind::Block => Decoder::Block(BlockDecoder::new()),
            DecoderKind::Indent => Decoder::Indent(IndentDecoder::new()),
            DecoderKind::IndentAutofix => Decoder::Indent(IndentDecoder::autofix()),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, WhoisError> {
        Ok(Self::from_kind(name.parse()?))
    }

    pub fn kind(&self) -> DecoderKind {
        match self {
            Decoder::Common(d) if d.is_flat() => DecoderKind::CommonFlat,
            Decoder::Common(_) => DecoderKind::Common,
            Decoder::Block(_) => DecoderKind::Block,
            Decoder::Indent(d) if d.is_autofix() => DecoderKind::IndentAutofix,
            Decoder::Indent(_) => DecoderKind::Indent,
            Decoder::Auto(_) => DecoderKind::Auto,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::from_kind(DecoderKind::Auto)
    }
}

impl ResponseDecoder for Decoder {
    fn decode(&self, response: &RawResponse) -> Option<Record> {
        match self {
            Decoder::Common(d) => d.decode(response),
            Decoder::Block(d) => d.decode(response),
            Decoder::Indent(d) => d.decode(response),
            Decoder::Auto(d) => d.decode(response),
        }
    }
}

impl Serialize for Decoder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_names_round_trip() {
        for kind in DecoderKind::ALL {
            let decoder = Decoder::from_name(kind.name()).unwrap();
            assert_eq!(decoder.kind(), *kind);
        }
        assert_eq!("Common-Flat".parse::<DecoderKind>().unwrap(), DecoderKind::CommonFlat);
    }

    #[test]
    fn test_unknown_decoder_name() {
        let err = Decoder::from_name("xml").unwrap_err();
        assert!(matches!(err, WhoisError::UnknownDecoder { .. }));
    }

    #[test]
    fn test_serializes_as_name() {
        let decoder = Decoder::from_kind(DecoderKind::IndentAutofix);
        assert_eq!(serde_json::to_string(&decoder).unwrap(), "\"indent_autofix\"");
    }
}
