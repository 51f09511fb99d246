//! One referral-following lookup against one server.
//!
//! A [`LookupCommand`] queries its server loosely, retries with the strict
//! query syntax when that decodes to nothing, and follows the referral
//! found in the resulting record by running a child command against the
//! referred host. The child's record, when it has one, supersedes the
//! parent's.

use crate::error::WhoisError;
use crate::parsers::ResponseDecoder;
use crate::protocols::query::QueryBuilder;
use crate::protocols::whois::Transport;
use crate::types::{AttemptResult, LookupConfig, Query, RawResponse, ServerEntry};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Immutable settings of one command.
///
/// A referral hop gets a copy with the host replaced and the recursion
/// budget decremented; nothing is shared with the parent.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// ASCII form of the domain
    pub domain: String,
    pub server: ServerEntry,
    /// Remaining referral hops
    pub recursion_limit: u32,
    pub strict_retry: bool,
    pub timeout: Duration,
}

impl CommandConfig {
    pub fn new<D: Into<String>>(domain: D, server: ServerEntry, config: &LookupConfig) -> Self {
        Self {
            domain: domain.into(),
            server,
            recursion_limit: config.recursion_limit,
            strict_retry: config.strict_retry,
            timeout: config.timeout,
        }
    }

    /// Settings for following a referral to `host`.
    pub fn for_referral(&self, host: &str) -> Self {
        Self {
            server: self.server.with_host(host),
            recursion_limit: self.recursion_limit.saturating_sub(1),
            ..self.clone()
        }
    }
}

pub struct LookupCommand {
    config: CommandConfig,
    transport: Arc<dyn Transport>,
    builder: QueryBuilder,
    /// Hosts contacted earlier in this chain
    ancestors: Vec<String>,
    attempts: Vec<AttemptResult>,
    child: Option<Box<LookupCommand>>,
    result: AttemptResult,
    last_error: Option<WhoisError>,
}

impl LookupCommand {
    pub fn new(config: CommandConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_ancestors(config, transport, Vec::new())
    }

    fn with_ancestors(
        config: CommandConfig,
        transport: Arc<dyn Transport>,
        ancestors: Vec<String>,
    ) -> Self {
        Self {
            config,
            transport,
            builder: QueryBuilder::new(),
            ancestors,
            attempts: Vec::new(),
            child: None,
            result: AttemptResult::empty(),
            last_error: None,
        }
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Resolved result of the last [`execute`](Self::execute).
    pub fn result(&self) -> &AttemptResult {
        &self.result
    }

    /// This hop's attempts, loose first.
    pub fn attempts(&self) -> &[AttemptResult] {
        &self.attempts
    }

    pub fn child(&self) -> Option<&LookupCommand> {
        self.child.as_deref()
    }

    /// Servers contacted by this hop and every hop below it.
    pub fn contacted_servers(&self) -> Vec<ServerEntry> {
        let mut servers = Vec::new();
        if !self.attempts.is_empty() {
            servers.push(self.config.server.clone());
        }
        if let Some(child) = &self.child {
            servers.extend(child.contacted_servers());
        }
        servers
    }

    /// Run the lookup.
    ///
    /// Connection failures of single attempts are tolerated; one is returned
    /// only when no record was produced anywhere in the chain. Protocol
    /// failures abort immediately. A reply without a record is a valid
    /// outcome, not an error.
    pub fn execute(&mut self) -> BoxFuture<'_, Result<AttemptResult, WhoisError>> {
        Box::pin(async move {
            self.clear();
            self.builder.reset();
            self.builder.set_format(&self.config.server.query_format)?;

            self.attempt(false).await?;
            let decoded = self.attempts.last().and_then(|a| a.record()).is_some();
            if !decoded && self.config.strict_retry {
                self.attempt(true).await?;
            }
            self.resolve();

            if let Some(host) = self.referral_target() {
                info!(
                    "Following referral for {} from {} to {}",
                    self.config.domain, self.config.server.host, host
                );
                let mut ancestors = self.ancestors.clone();
                ancestors.push(self.config.server.host.clone());
                let mut child = LookupCommand::with_ancestors(
                    self.config.for_referral(&host),
                    self.transport.clone(),
                    ancestors,
                );

                match child.execute().await {
                    Ok(_) => {}
                    Err(e) if e.is_connection() => {
                        warn!(
                            "Referral to {} failed, keeping {}'s reply: {}",
                            host, self.config.server.host, e
                        );
                        self.last_error.get_or_insert(e);
                    }
                    Err(e) => return Err(e),
                }
                self.child = Some(Box::new(child));
                self.resolve();
            }

            if self.result.record().is_none() {
                if let Some(e) = self.last_error.take() {
                    return Err(e);
                }
            }
            Ok(self.result.clone())
        })
    }

    fn clear(&mut self) {
        self.attempts.clear();
        self.child = None;
        self.result = AttemptResult::empty();
        self.last_error = None;
    }

    async fn attempt(&mut self, strict: bool) -> Result<(), WhoisError> {
        self.builder.set_strict(strict);
        let query = Query {
            host: self.config.server.host.clone(),
            text: self.builder.build(&self.config.domain)?,
        };
        debug!(
            "Querying {} for {} (strict: {})",
            query.host, self.config.domain, strict
        );

        match self
            .transport
            .send(&query.host, &query.text, self.config.timeout)
            .await
        {
            Ok(output) => {
                trace!("Reply from {}:\n{}", query.host, output);
                let response = RawResponse {
                    domain: self.config.domain.clone(),
                    host: query.host,
                    query: query.text,
                    output,
                };
                let record = self.config.server.decoder.decode(&response);
                debug!(
                    "{} decoder {} a record from {}",
                    self.config.server.decoder.name(),
                    if record.is_some() { "found" } else { "found no" },
                    response.host
                );
                self.attempts.push(AttemptResult::new(response, record));
            }
            Err(e) if e.is_connection() => {
                warn!("{}", e);
                self.last_error = Some(e);
                self.attempts.push(AttemptResult::empty());
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// The child's record if it has one, otherwise the last attempt that got
    /// anything at all, otherwise the last attempt.
    // TODO: a later reply without a record still beats an earlier decoded
    // one here; prefer attempts with a record once callers stop relying on it.
    fn resolve(&mut self) {
        if let Some(child) = &self.child {
            if child.result.record().is_some() {
                self.result = child.result.clone();
                return;
            }
        }
        self.result = self
            .attempts
            .iter()
            .rev()
            .find(|attempt| !attempt.is_empty())
            .or(self.attempts.last())
            .cloned()
            .unwrap_or_default();
    }

    fn referral_target(&self) -> Option<String> {
        let host = self.result.record()?.referral_host.clone()?;
        let current = &self.config.server.host;

        if host.eq_ignore_ascii_case(current)
            || self.config.server.centralized
            || self.config.recursion_limit == 0
        {
            return None;
        }
        if self.ancestors.iter().any(|seen| seen.eq_ignore_ascii_case(&host)) {
            warn!(
                "Referral loop for {}: {} points back to {}",
                self.config.domain, current, host
            );
            return None;
        }
        Some(host)
    }
}
