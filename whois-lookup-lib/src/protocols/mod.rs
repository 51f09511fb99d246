//! Protocol plumbing for WHOIS lookups.
//!
//! Query rendering, the transports that carry queries to port 43, the
//! caching decorator, and the server table that decides where to send them.

/// Query templates
pub mod query;

/// WHOIS transports
pub mod whois;

/// Memoizing transport decorator
pub mod cache;

/// Server table and zone matching
pub mod registry;

pub use cache::CachingTransport;
pub use query::{build_query, QueryBuilder, DEFAULT_QUERY_FORMAT};
pub use registry::{match_servers, ServerTable};
#[cfg(feature = "socket")]
pub use whois::SocketTransport;
pub use whois::{FixedTextTransport, Transport};
