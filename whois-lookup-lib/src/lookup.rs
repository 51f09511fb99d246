//! Main lookup implementation.
//!
//! This module provides the [`WhoisLookup`] struct that picks the servers
//! for a domain and runs a [`LookupCommand`] against each of them until one
//! yields a record.

use crate::command::{CommandConfig, LookupCommand};
use crate::error::WhoisError;
use crate::protocols::cache::CachingTransport;
use crate::protocols::registry::ServerTable;
use crate::protocols::whois::Transport;
use crate::types::{
    AttemptResult, LookupConfig, LookupOutcome, LookupOverrides, RawResponse, Record, ServerEntry,
};
use crate::utils::to_ascii_domain;
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Entry point for WHOIS lookups.
///
/// The server table, the transport and the configuration are all explicit
/// constructor arguments; a `WhoisLookup` holds no other state, so one
/// instance can serve any number of concurrent lookups.
///
/// # Example
///
/// ```rust,no_run
/// use whois_lookup_lib::WhoisLookup;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let lookup = WhoisLookup::with_defaults();
///     let record = lookup.load_domain_record("example.com").await?;
///     println!("Registrar: {:?}", record.and_then(|r| r.registrar));
///     Ok(())
/// }
/// ```
pub struct WhoisLookup {
    config: LookupConfig,
    servers: Arc<ServerTable>,
    transport: Arc<dyn Transport>,
}

impl WhoisLookup {
    /// Create a lookup over `servers`, sending queries through `transport`.
    ///
    /// When `config.cache_ttl` is set the transport is wrapped in a
    /// [`CachingTransport`].
    pub fn new(servers: ServerTable, transport: Arc<dyn Transport>, config: LookupConfig) -> Self {
        let transport: Arc<dyn Transport> = match config.cache_ttl {
            Some(ttl) => Arc::new(CachingTransport::new(transport, ttl)),
            None => transport,
        };
        Self {
            config,
            servers: Arc::new(servers),
            transport,
        }
    }

    /// Built-in server table, real network, default configuration.
    #[cfg(feature = "socket")]
    pub fn with_defaults() -> Self {
        Self::new(
            ServerTable::builtin(),
            Arc::new(crate::protocols::whois::SocketTransport::new()),
            LookupConfig::default(),
        )
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn servers(&self) -> &ServerTable {
        &self.servers
    }

    /// Look up a domain.
    ///
    /// Candidates are tried most specific first. The first one whose chain
    /// yields a record wins. If none does, the most specific reply without a
    /// record is returned; "no registration data" is a valid outcome.
    ///
    /// # Errors
    ///
    /// - [`WhoisError::ServerMismatch`] when no server serves the domain
    ///   (nothing is sent in that case)
    /// - [`WhoisError::Protocol`] as soon as any server flags a rate limit
    /// - [`WhoisError::Connection`] when no server could be reached at all
    /// - [`WhoisError::NoResponse`] when every candidate came back empty
    pub async fn lookup(
        &self,
        domain: &str,
        overrides: &LookupOverrides,
    ) -> Result<LookupOutcome, WhoisError> {
        let ascii = to_ascii_domain(domain)?;
        let candidates = self.candidates(&ascii, overrides)?;
        if candidates.is_empty() {
            return Err(WhoisError::server_mismatch(domain));
        }
        info!("Looking up {} ({} candidate servers)", ascii, candidates.len());

        let mut servers = Vec::new();
        let mut unresolved: Option<AttemptResult> = None;
        let mut connection_error: Option<WhoisError> = None;

        for server in candidates {
            let mut config = CommandConfig::new(ascii.as_str(), server, &self.config);
            if config.server.centralized {
                config.recursion_limit = 0;
            }
            let mut command = LookupCommand::new(config, self.transport.clone());
            let outcome = command.execute().await;
            servers.extend(command.contacted_servers());

            match outcome {
                Ok(result) if result.record().is_some() => {
                    return Ok(LookupOutcome {
                        domain: domain.to_string(),
                        result,
                        servers,
                    });
                }
                Ok(result) => {
                    debug!("No record for {} from {}", ascii, command.config().server.host);
                    if unresolved.is_none() && !result.is_empty() {
                        unresolved = Some(result);
                    }
                }
                Err(e) if e.is_connection() => {
                    warn!("Trying next server for {}: {}", ascii, e);
                    connection_error.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }

        match (unresolved, connection_error) {
            (Some(result), _) => Ok(LookupOutcome {
                domain: domain.to_string(),
                result,
                servers,
            }),
            (None, Some(e)) => Err(e),
            (None, None) => Err(WhoisError::no_response(domain)),
        }
    }

    /// Look up a domain without overrides.
    pub async fn lookup_domain(&self, domain: &str) -> Result<LookupOutcome, WhoisError> {
        self.lookup(domain, &LookupOverrides::default()).await
    }

    /// The reply the lookup settled on.
    pub async fn load_domain_response(&self, domain: &str) -> Result<RawResponse, WhoisError> {
        let outcome = self.lookup_domain(domain).await?;
        outcome
            .result
            .into_parts()
            .0
            .ok_or_else(|| WhoisError::no_response(domain))
    }

    /// The decoded record, `None` when the registry has no data.
    pub async fn load_domain_record(&self, domain: &str) -> Result<Option<Record>, WhoisError> {
        let outcome = self.lookup_domain(domain).await?;
        Ok(outcome.result.into_parts().1)
    }

    /// Look up several domains concurrently.
    ///
    /// At most `concurrency` lookups run at once. Results come back in input
    /// order; one failing domain does not affect the others.
    pub async fn lookup_many(&self, domains: &[String]) -> Vec<Result<LookupOutcome, WhoisError>> {
        self.lookup_stream(domains).collect().await
    }

    /// Like [`lookup_many`](Self::lookup_many), yielding each result as soon
    /// as it and all earlier ones are done.
    pub fn lookup_stream(
        &self,
        domains: &[String],
    ) -> Pin<Box<dyn Stream<Item = Result<LookupOutcome, WhoisError>> + Send + '_>> {
        let domains = domains.to_vec();
        let stream = stream::iter(domains)
            .map(move |domain| async move { self.lookup_domain(&domain).await })
            .buffered(self.config.concurrency.max(1));

        Box::pin(stream)
    }

    /// Servers to try for `domain` after applying `overrides`.
    fn candidates(
        &self,
        domain: &str,
        overrides: &LookupOverrides,
    ) -> Result<Vec<ServerEntry>, WhoisError> {
        let host = overrides.host.as_deref().map(|h| h.trim().to_lowercase());

        let mut candidates = match (&overrides.server, host) {
            (Some(server), Some(host)) => vec![server.with_host(host)],
            (Some(server), None) => vec![server.clone()],
            (None, Some(host)) => {
                let matched = self.servers.match_domain(domain)?;
                let same_host: Vec<ServerEntry> = matched
                    .iter()
                    .filter(|server| server.host == host)
                    .cloned()
                    .collect();
                if !same_host.is_empty() {
                    same_host
                } else if let Some(most_specific) = matched.first() {
                    vec![most_specific.with_host(host)]
                } else {
                    vec![ServerEntry::simple("", host)?]
                }
            }
            (None, None) => self.servers.match_domain(domain)?,
        };

        if let Some(decoder) = &overrides.decoder {
            candidates = candidates
                .iter()
                .map(|server| server.with_decoder(decoder.clone()))
                .collect();
        }
        Ok(candidates)
    }
}

#[cfg(feature = "socket")]
impl Default for WhoisLookup {
    fn default() -> Self {
        Self::with_defaults()
    }
}
