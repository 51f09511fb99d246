//! Server table and zone matching.
//!
//! The table maps zone suffixes to the WHOIS servers authoritative for them.
//! It is built once at startup (built-in entries, optionally preceded by
//! configured ones) and passed to the lookup as a read-only value.

use crate::error::WhoisError;
use crate::parsers::{Decoder, DecoderKind};
use crate::types::ServerEntry;
use crate::utils::to_ascii_domain;
use std::cmp::Reverse;
use std::sync::Arc;

/// Verisign answers fuzzy matches unless the query names a domain object.
const VERISIGN_FORMAT: &str = "{strict:domain }{domain}\r\n";

/// DENIC only returns registration data for the `-T dn,ace` query type.
const DENIC_FORMAT: &str = "-T dn,ace {domain}\r\n";

/// JPRS answers in Japanese unless `/e` is appended.
const JPRS_FORMAT: &str = "{domain}/e\r\n";

const PLAIN_FORMAT: &str = "{domain}\r\n";

/// (zone, host, centralized, query format, decoder)
const BUILTIN_SERVERS: &[(&str, &str, bool, &str, DecoderKind)] = &[
    ("com", "whois.verisign-grs.com", false, VERISIGN_FORMAT, DecoderKind::Common),
    ("net", "whois.verisign-grs.com", false, VERISIGN_FORMAT, DecoderKind::Common),
    ("org", "whois.publicinterestregistry.org", true, PLAIN_FORMAT, DecoderKind::Common),
    ("info", "whois.nic.info", true, PLAIN_FORMAT, DecoderKind::Common),
    ("io", "whois.nic.io", true, PLAIN_FORMAT, DecoderKind::Common),
    ("ai", "whois.nic.ai", true, PLAIN_FORMAT, DecoderKind::Common),
    ("dev", "whois.nic.google", true, PLAIN_FORMAT, DecoderKind::Common),
    ("app", "whois.nic.google", true, PLAIN_FORMAT, DecoderKind::Common),
    ("uk", "whois.nic.uk", true, PLAIN_FORMAT, DecoderKind::IndentAutofix),
    ("co.uk", "whois.nic.uk", true, PLAIN_FORMAT, DecoderKind::IndentAutofix),
    ("de", "whois.denic.de", true, DENIC_FORMAT, DecoderKind::Common),
    ("ru", "whois.tcinet.ru", true, PLAIN_FORMAT, DecoderKind::Common),
    ("su", "whois.tcinet.ru", true, PLAIN_FORMAT, DecoderKind::Common),
    ("fr", "whois.nic.fr", true, PLAIN_FORMAT, DecoderKind::Block),
    ("eu", "whois.eu", true, PLAIN_FORMAT, DecoderKind::Indent),
    ("be", "whois.dns.be", true, PLAIN_FORMAT, DecoderKind::Indent),
    ("nl", "whois.domain-registry.nl", true, PLAIN_FORMAT, DecoderKind::Indent),
    ("jp", "whois.jprs.jp", true, JPRS_FORMAT, DecoderKind::Common),
    ("us", "whois.nic.us", true, PLAIN_FORMAT, DecoderKind::Common),
    ("co", "whois.nic.co", true, PLAIN_FORMAT, DecoderKind::Common),
    ("me", "whois.nic.me", true, PLAIN_FORMAT, DecoderKind::Common),
    ("edu", "whois.educause.edu", true, PLAIN_FORMAT, DecoderKind::Indent),
    ("gov", "whois.dotgov.gov", true, PLAIN_FORMAT, DecoderKind::Common),
    // IANA refers every other zone to its registry
    ("", "whois.iana.org", false, PLAIN_FORMAT, DecoderKind::Common),
];

/// Ordered, read-only list of server entries.
///
/// Order matters: among equally specific zones the earlier entry wins.
#[derive(Debug, Clone, Default)]
pub struct ServerTable {
    entries: Vec<ServerEntry>,
}

impl ServerTable {
    pub fn new(entries: Vec<ServerEntry>) -> Self {
        Self { entries }
    }

    /// The built-in registry list with an IANA catch-all.
    pub fn builtin() -> Self {
        let entries = BUILTIN_SERVERS
            .iter()
            .filter_map(|(zone, host, centralized, format, kind)| {
                let decoder = Arc::new(Decoder::from_kind(*kind));
                match ServerEntry::new(zone, host, *centralized, *format, decoder) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::error!("Skipping built-in server for zone '{}': {}", zone, e);
                        None
                    }
                }
            })
            .collect();
        Self { entries }
    }

    /// Table with `entries` placed ahead of the current ones.
    pub fn with_prepended(self, mut entries: Vec<ServerEntry>) -> Self {
        entries.extend(self.entries);
        Self { entries }
    }

    pub fn entries(&self) -> &[ServerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidate servers for `domain`, most specific first.
    pub fn match_domain(&self, domain: &str) -> Result<Vec<ServerEntry>, WhoisError> {
        match_servers(domain, self)
    }
}

/// Select the servers responsible for `domain`.
///
/// The domain is converted to its ASCII form first. A server matches when
/// its zone is the catch-all or a label-aligned suffix of the domain
/// (`.co.uk` matches `example.co.uk` but not `example.notco.uk`). Longer
/// zones come first; equal lengths keep table order, so the catch-all is
/// always last. An empty result is returned as is; the caller decides how
/// to report it.
pub fn match_servers(domain: &str, table: &ServerTable) -> Result<Vec<ServerEntry>, WhoisError> {
    let ascii = to_ascii_domain(domain)?;
    let dotted = format!(".{}", ascii);

    let mut matched: Vec<ServerEntry> = table
        .entries()
        .iter()
        .filter(|entry| entry.is_catch_all() || dotted.ends_with(&entry.zone))
        .cloned()
        .collect();
    matched.sort_by_key(|entry| Reverse(entry.zone.len()));

    tracing::debug!(
        "Zone match for {}: [{}]",
        ascii,
        matched
            .iter()
            .map(|entry| entry.host.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(matched)
}
