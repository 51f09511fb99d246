//! Core data types for WHOIS lookups.
//!
//! This module defines the data flowing through a lookup: the configured
//! server entries, the per-attempt raw responses and decoded records, and the
//! final outcome handed back to callers.

use crate::error::WhoisError;
use crate::parsers::{Decoder, DecoderKind};
use crate::protocols::query::{QueryBuilder, DEFAULT_QUERY_FORMAT};
use crate::utils::normalize_zone;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One authoritative WHOIS server for a zone.
///
/// Entries are created from configuration at startup and owned by the
/// [`ServerTable`](crate::ServerTable). They are never mutated; a lookup that
/// needs a different host or decoder works on a clone made with
/// [`with_host`](Self::with_host) / [`with_decoder`](Self::with_decoder).
#[derive(Debug, Clone, Serialize)]
pub struct ServerEntry {
    /// Dot-prefixed zone suffix (e.g. `".co.uk"`), `""` for the catch-all
    pub zone: String,

    /// Host name of the WHOIS server
    pub host: String,

    /// Replies from centralized registries are final; they never trigger recursion
    pub centralized: bool,

    /// Query template, see [`QueryBuilder`]
    pub query_format: String,

    /// Decoder used for replies from this server
    pub decoder: Arc<Decoder>,
}

impl ServerEntry {
    /// Create a validated server entry.
    ///
    /// The zone is normalized (trimmed, lowercased, IDN labels converted to
    /// ASCII, stored with a leading dot). The host must not be empty and the
    /// query format must contain the `{domain}` placeholder.
    pub fn new<Z, H, F>(
        zone: Z,
        host: H,
        centralized: bool,
        query_format: F,
        decoder: Arc<Decoder>,
    ) -> Result<Self, WhoisError>
    where
        Z: AsRef<str>,
        H: AsRef<str>,
        F: Into<String>,
    {
        let host = host.as_ref().trim().to_lowercase();
        if host.is_empty() {
            return Err(WhoisError::config(format!(
                "Host must be specified for zone '{}'",
                zone.as_ref()
            )));
        }
        let query_format = query_format.into();
        QueryBuilder::validate(&query_format)?;

        Ok(Self {
            zone: normalize_zone(zone.as_ref())?,
            host,
            centralized,
            query_format,
            decoder,
        })
    }

    /// Entry with the default query format and the auto decoder.
    pub fn simple<Z: AsRef<str>, H: AsRef<str>>(zone: Z, host: H) -> Result<Self, WhoisError> {
        Self::new(
            zone,
            host,
            false,
            DEFAULT_QUERY_FORMAT,
            Arc::new(Decoder::from_kind(DecoderKind::Auto)),
        )
    }

    /// Whether this is the catch-all entry.
    pub fn is_catch_all(&self) -> bool {
        self.zone.is_empty()
    }

    /// Clone of this entry pointing at another host.
    pub fn with_host<H: Into<String>>(&self, host: H) -> Self {
        Self {
            host: host.into(),
            ..self.clone()
        }
    }

    /// Clone of this entry using another decoder.
    pub fn with_decoder(&self, decoder: Arc<Decoder>) -> Self {
        Self {
            decoder,
            ..self.clone()
        }
    }
}

/// A rendered query for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub host: String,
    pub text: String,
}

/// Unparsed result of one transport round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// ASCII form of the domain that was queried
    pub domain: String,

    /// Host that answered
    pub host: String,

    /// Exact query text sent
    pub query: String,

    /// Reply text, already decoded and line-normalized
    pub output: String,
}

/// Decoded registration data.
///
/// A sparse view: every field that the reply did not carry stays `None`
/// (or empty for the list fields), so ranking can tell "missing" from "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// The registrar that manages this domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    /// Registrant / holder organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub name_servers: Vec<String>,

    /// Domain status codes (e.g., "clientTransferProhibited")
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub statuses: Vec<String>,

    /// WHOIS host the reply points to for more specific data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_host: Option<String>,
}

impl Record {
    /// Number of populated fields.
    pub fn populated_fields(&self) -> usize {
        [
            self.domain.is_some(),
            self.registrar.is_some(),
            self.owner.is_some(),
            self.creation_date.is_some(),
            self.expiration_date.is_some(),
            self.updated_date.is_some(),
            !self.name_servers.is_empty(),
            !self.statuses.is_empty(),
            self.referral_host.is_some(),
        ]
        .iter()
        .filter(|populated| **populated)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.populated_fields() == 0
    }
}

/// Pairing produced by one query attempt.
///
/// A record can only exist together with the response it was decoded from;
/// the constructors make any other combination unrepresentable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<RawResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<Record>,
}

impl AttemptResult {
    /// Attempt that never got a response.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attempt that got a response, decoded or not.
    pub fn new(response: RawResponse, record: Option<Record>) -> Self {
        Self {
            response: Some(response),
            record,
        }
    }

    pub fn response(&self) -> Option<&RawResponse> {
        self.response.as_ref()
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Neither response nor record.
    pub fn is_empty(&self) -> bool {
        self.response.is_none() && self.record.is_none()
    }

    pub fn into_parts(self) -> (Option<RawResponse>, Option<Record>) {
        (self.response, self.record)
    }
}

/// Final reconciled result of a lookup.
#[derive(Debug, Clone, Serialize)]
pub struct LookupOutcome {
    /// Domain as given by the caller
    pub domain: String,

    pub result: AttemptResult,

    /// Every server contacted, across candidates and referral hops, in order
    pub servers: Vec<ServerEntry>,
}

impl LookupOutcome {
    pub fn record(&self) -> Option<&Record> {
        self.result.record()
    }

    pub fn response(&self) -> Option<&RawResponse> {
        self.result.response()
    }

    /// Distinct hosts contacted, in first-contact order.
    pub fn contacted_hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = Vec::new();
        for server in &self.servers {
            if !hosts.contains(&server.host.as_str()) {
                hosts.push(server.host.as_str());
            }
        }
        hosts
    }
}

/// Per-call overrides for [`WhoisLookup::lookup`](crate::WhoisLookup::lookup).
#[derive(Debug, Clone, Default)]
pub struct LookupOverrides {
    /// Query this host instead of the matched servers' hosts
    pub host: Option<String>,

    /// Use exactly this server, bypassing zone matching
    pub server: Option<ServerEntry>,

    /// Decode every reply with this decoder
    pub decoder: Option<Arc<Decoder>>,
}

impl LookupOverrides {
    pub fn with_host<H: Into<String>>(mut self, host: H) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_server(mut self, server: ServerEntry) -> Self {
        self.server = Some(server);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }
}

/// Configuration options for lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Timeout for each network round trip
    /// Default: 10 seconds
    #[serde(skip)]
    pub timeout: Duration,

    /// How many referral hops a non-centralized server may trigger
    /// Default: 1
    pub recursion_limit: u32,

    /// Retry with the strict query syntax when the loose query decodes to nothing
    /// Default: true
    pub strict_retry: bool,

    /// Memoize raw replies per (host, query) for this long
    /// Default: disabled
    #[serde(skip)]
    pub cache_ttl: Option<Duration>,

    /// Maximum number of concurrent lookups in `lookup_many`
    /// Default: 10, Range: 1-100
    pub concurrency: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            recursion_limit: 1,
            strict_retry: true,
            cache_ttl: None,
            concurrency: 10,
        }
    }
}

impl LookupConfig {
    /// Set custom timeout per round trip.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Enable or disable the strict retry.
    pub fn with_strict_retry(mut self, enabled: bool) -> Self {
        self.strict_retry = enabled;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Automatically caps concurrency at 100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_entry_normalizes_zone() {
        let entry = ServerEntry::simple("CO.UK.", "Whois.Nic.UK").unwrap();
        assert_eq!(entry.zone, ".co.uk");
        assert_eq!(entry.host, "whois.nic.uk");
        assert!(!entry.is_catch_all());

        let catch_all = ServerEntry::simple("", "whois.iana.org").unwrap();
        assert_eq!(catch_all.zone, "");
        assert!(catch_all.is_catch_all());
    }

    #[test]
    fn test_server_entry_rejects_bad_input() {
        assert!(ServerEntry::simple("com", "  ").is_err());
        let decoder = Arc::new(Decoder::from_kind(DecoderKind::Common));
        assert!(ServerEntry::new("com", "whois.test", false, "no placeholder", decoder).is_err());
    }

    #[test]
    fn test_clone_with_overrides_keeps_original() {
        let entry = ServerEntry::simple("test", "whois.test").unwrap();
        let moved = entry.with_host("whois.other.test");
        assert_eq!(entry.host, "whois.test");
        assert_eq!(moved.host, "whois.other.test");
        assert_eq!(moved.zone, entry.zone);

        let flat = entry.with_decoder(Arc::new(Decoder::from_kind(DecoderKind::CommonFlat)));
        assert_eq!(flat.decoder.kind(), DecoderKind::CommonFlat);
        assert_eq!(entry.decoder.kind(), DecoderKind::Auto);
    }

    #[test]
    fn test_record_population() {
        let mut record = Record::default();
        assert!(record.is_empty());
        record.registrar = Some("Test Registrar".to_string());
        record.name_servers = vec!["ns1.example.test".to_string()];
        assert_eq!(record.populated_fields(), 2);
    }

    #[test]
    fn test_attempt_result_invariant() {
        let empty = AttemptResult::empty();
        assert!(empty.is_empty());

        let response = RawResponse {
            domain: "example.test".to_string(),
            host: "whois.test".to_string(),
            query: "example.test\r\n".to_string(),
            output: "nothing".to_string(),
        };
        let undecoded = AttemptResult::new(response, None);
        assert!(!undecoded.is_empty());
        assert!(undecoded.record().is_none());
    }

    #[test]
    fn test_lookup_config_builder() {
        let config = LookupConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_recursion_limit(2)
            .with_strict_retry(false)
            .with_concurrency(500);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.recursion_limit, 2);
        assert!(!config.strict_retry);
        assert_eq!(config.concurrency, 100);
        assert!(config.cache_ttl.is_none());
    }
}
