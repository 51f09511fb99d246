//! # WHOIS Lookup Library
//!
//! A library for resolving domain registration records over the WHOIS
//! protocol: it picks the authoritative server for a domain's zone, follows
//! referrals to thinner registries, and decodes the free-form text replies
//! into a structured [`Record`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_lookup_lib::WhoisLookup;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lookup = WhoisLookup::with_defaults();
//!     let outcome = lookup.lookup_domain("example.com").await?;
//!
//!     if let Some(record) = outcome.record() {
//!         println!("Registrar: {:?}", record.registrar);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Zone Matching**: Most specific configured zone first, IANA as the catch-all
//! - **Referral Following**: Thin registries hand over to the registrar's server
//! - **Loose/Strict Queries**: Exact-match retry for registries that answer fuzzily
//! - **Pluggable Decoders**: Several reply grammars, auto-ranked by completeness
//! - **Configurable**: TOML files, environment variables and explicit overrides

// Re-export main public API types and functions
// This makes them available as whois_lookup_lib::TypeName
pub use command::{CommandConfig, LookupCommand};
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig, ServerConfig,
};
pub use error::WhoisError;
pub use lookup::WhoisLookup;
pub use parsers::{
    AutoDecoder, BlockDecoder, CommonDecoder, Decoder, DecoderKind, FieldRankCalculator,
    IndentDecoder, RankCalculator, ResponseDecoder,
};
#[cfg(feature = "socket")]
pub use protocols::SocketTransport;
pub use protocols::{
    build_query, match_servers, CachingTransport, FixedTextTransport, QueryBuilder, ServerTable,
    Transport, DEFAULT_QUERY_FORMAT,
};
pub use types::{
    AttemptResult, LookupConfig, LookupOutcome, LookupOverrides, Query, RawResponse, Record,
    ServerEntry,
};
pub use utils::{normalize_host, to_ascii_domain, validate_domain};

// Public modules
pub mod parsers;
pub mod protocols;

// Internal modules - these are not part of the public API
mod command;
mod config;
mod error;
mod lookup;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WhoisError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub features: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "socket")]
    features.push("socket");

    features
}
