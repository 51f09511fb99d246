//! WHOIS transport: one `(host, query)` round trip returning reply text.
//!
//! The lookup logic only sees the [`Transport`] trait. [`SocketTransport`]
//! talks to real servers on TCP port 43; [`FixedTextTransport`] replays a
//! saved reply, which is how replies are decoded offline.

use crate::error::WhoisError;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
#[cfg(feature = "socket")]
use tokio::io::{AsyncReadExt, AsyncWriteExt};
#[cfg(feature = "socket")]
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Well-known WHOIS port
pub const WHOIS_PORT: u16 = 43;

/// Replies are cut off beyond this size
pub const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

lazy_static! {
    static ref RATE_LIMIT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)^WHOIS\s+.*?LIMIT\s+EXCEEDED").unwrap(),
        Regex::new(r"(?im)^[%#\s]*(query|request|connection) (rate )?limit exceeded").unwrap(),
        Regex::new(r"(?im)^[%#\s]*too many (queries|requests)").unwrap(),
    ];
}

/// Sends one query to one host.
///
/// Implementations must return text already decoded to UTF-8 and must honor
/// `timeout` for the whole round trip, reporting an expired timeout as a
/// [`WhoisError::Connection`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, host: &str, query: &str, timeout: Duration) -> Result<String, WhoisError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, host: &str, query: &str, timeout: Duration) -> Result<String, WhoisError> {
        (**self).send(host, query, timeout).await
    }
}

/// TCP transport speaking the plain WHOIS protocol.
#[cfg(feature = "socket")]
#[derive(Debug, Clone)]
pub struct SocketTransport {
    port: u16,
    max_response_bytes: u64,
}

#[cfg(feature = "socket")]
impl SocketTransport {
    pub fn new() -> Self {
        Self {
            port: WHOIS_PORT,
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }

    /// Talk to a non-standard port (test servers, proxies).
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::new()
        }
    }

    async fn round_trip(&self, host: &str, query: &str) -> Result<String, WhoisError> {
        let mut stream = TcpStream::connect((host, self.port)).await.map_err(|e| {
            WhoisError::connection_with_source(host, "Host is unreachable", e.to_string())
        })?;

        let mut payload = query.to_string();
        if !payload.ends_with("\r\n") {
            payload.push_str("\r\n");
        }
        stream.write_all(payload.as_bytes()).await.map_err(|e| {
            WhoisError::connection_with_source(host, "Query cannot be written", e.to_string())
        })?;

        let mut buf = Vec::with_capacity(8192);
        (&mut stream)
            .take(self.max_response_bytes)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| {
                WhoisError::connection_with_source(host, "Response cannot be read", e.to_string())
            })?;
        debug!(host, bytes = buf.len(), "received WHOIS reply");

        let text = decode_text(&buf);
        trace!(host, "reply text:\n{}", text);
        check_rate_limit(host, &text)?;
        Ok(text)
    }
}

#[cfg(feature = "socket")]
impl Default for SocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "socket")]
#[async_trait]
impl Transport for SocketTransport {
    async fn send(&self, host: &str, query: &str, timeout: Duration) -> Result<String, WhoisError> {
        match tokio::time::timeout(timeout, self.round_trip(host, query)).await {
            Ok(result) => result,
            Err(_) => Err(WhoisError::connection(
                host,
                format!("Timed out after {:?}", timeout),
            )),
        }
    }
}

/// Answers every query with the same text.
#[derive(Debug, Clone)]
pub struct FixedTextTransport {
    text: String,
}

impl FixedTextTransport {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self {
            text: normalize_newlines(&text.into()),
        }
    }

    /// Load a saved reply from disk.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, WhoisError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            WhoisError::file_error(
                path.to_string_lossy(),
                format!("Failed to read reply file: {}", e),
            )
        })?;
        Ok(Self {
            text: decode_text(&bytes),
        })
    }
}

#[async_trait]
impl Transport for FixedTextTransport {
    async fn send(
        &self,
        host: &str,
        _query: &str,
        _timeout: Duration,
    ) -> Result<String, WhoisError> {
        check_rate_limit(host, &self.text)?;
        Ok(self.text.clone())
    }
}

/// Decode raw reply bytes: UTF-8 when valid, Latin-1 otherwise.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };
    normalize_newlines(&text)
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Reject replies in which the server reports a rate limit.
pub fn check_rate_limit(host: &str, text: &str) -> Result<(), WhoisError> {
    for pattern in RATE_LIMIT_PATTERNS.iter() {
        if let Some(found) = pattern.find(text) {
            return Err(WhoisError::protocol(host, found.as_str().trim()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(check_rate_limit("whois.test", "WHOIS LIMIT EXCEEDED - SEE WWW.TEST").is_err());
        assert!(check_rate_limit("whois.test", "whois query limit exceeded").is_err());
        assert!(check_rate_limit("whois.test", "% Query rate limit exceeded\n").is_err());
        assert!(check_rate_limit("whois.test", "%% Too many requests, slow down").is_err());

        let err = check_rate_limit("whois.test", "WHOIS LIMIT EXCEEDED").unwrap_err();
        assert!(err.is_protocol());

        assert!(check_rate_limit("whois.test", "Domain Name: EXAMPLE.COM\nRegistrar: X").is_ok());
        // Only a reply that *starts* by announcing the limit is rejected
        assert!(check_rate_limit(
            "whois.test",
            "Domain: example.test\nremarks: the WHOIS service has a LIMIT EXCEEDED policy"
        )
        .is_ok());
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(
            decode_text(b"Domain: a.test\r\nStatus: ok\r\n"),
            "Domain: a.test\nStatus: ok\n"
        );
        // 0xE9 is 'é' in Latin-1 and invalid as standalone UTF-8
        assert_eq!(decode_text(b"Owner: Soci\xe9t\xe9"), "Owner: Société");
        assert_eq!(decode_text("Owner: Société".as_bytes()), "Owner: Société");
    }

    #[test]
    fn test_fixed_text_transport() {
        use tokio_test::{assert_err, assert_ok, block_on};

        let transport = FixedTextTransport::new("Domain: example.test\r\n");
        let text = assert_ok!(block_on(transport.send(
            "whois.test",
            "example.test\r\n",
            Duration::from_secs(1)
        )));
        assert_eq!(text, "Domain: example.test\n");

        let limited = FixedTextTransport::new("WHOIS LIMIT EXCEEDED");
        let err = assert_err!(block_on(limited.send(
            "whois.test",
            "example.test",
            Duration::from_secs(1)
        )));
        assert!(err.is_protocol());
    }

    #[test]
    fn test_fixed_text_transport_missing_file() {
        let err = FixedTextTransport::from_file("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, WhoisError::FileError { .. }));
    }

    #[cfg(feature = "socket")]
    #[tokio::test]
    async fn test_socket_transport_round_trip() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"example.test\r\n");
            socket
                .write_all(b"Domain: example.test\r\nRegistrar: Test Registrar\r\n")
                .await
                .unwrap();
        });

        let transport = SocketTransport::with_port(port);
        let text = transport
            .send("127.0.0.1", "example.test", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "Domain: example.test\nRegistrar: Test Registrar\n");
    }

    #[cfg(feature = "socket")]
    #[tokio::test]
    async fn test_socket_transport_timeout_is_connection_error() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let transport = SocketTransport::with_port(port);
        let err = transport
            .send("127.0.0.1", "example.test", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.is_connection());
    }
}
