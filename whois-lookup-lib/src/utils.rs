//! Utility functions for domain processing and validation.
//!
//! This module contains the normalization helpers shared by zone matching,
//! query rendering and reply decoding.

use crate::error::WhoisError;
use std::net::IpAddr;

/// Validate a domain name format.
///
/// This is a basic validation - labels are checked more thoroughly by the
/// IDNA conversion in [`to_ascii_domain`].
pub fn validate_domain(domain: &str) -> Result<(), WhoisError> {
    let domain = domain.trim();

    if domain.is_empty() {
        return Err(WhoisError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if domain.len() > 253 {
        return Err(WhoisError::invalid_domain(domain, "Domain name too long"));
    }

    if domain.split('.').any(|label| label.len() > 63) {
        return Err(WhoisError::invalid_domain(domain, "Label longer than 63 characters"));
    }

    if domain.chars().any(char::is_whitespace) {
        return Err(WhoisError::invalid_domain(
            domain,
            "Domain name cannot contain whitespace",
        ));
    }

    Ok(())
}

/// Convert a domain to its lowercase ASCII (punycode) form.
///
/// A trailing root dot is dropped: `"Bücher.Example."` becomes
/// `"xn--bcher-kva.example"`.
pub fn to_ascii_domain(domain: &str) -> Result<String, WhoisError> {
    validate_domain(domain)?;
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(WhoisError::invalid_domain(domain, "Domain name cannot be empty"));
    }

    idna::domain_to_ascii(trimmed)
        .map_err(|e| WhoisError::invalid_domain(domain, format!("IDNA conversion failed: {}", e)))
}

/// Normalize a configured zone to its dot-prefixed ASCII suffix.
///
/// `""` (or only dots) is the catch-all and stays empty.
pub fn normalize_zone(zone: &str) -> Result<String, WhoisError> {
    let trimmed = zone.trim().trim_matches('.');
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let ascii = idna::domain_to_ascii(trimmed).map_err(|e| {
        WhoisError::config(format!("Invalid zone '{}': IDNA conversion failed: {}", zone, e))
    })?;
    Ok(format!(".{}", ascii))
}

/// Normalize a host name taken from a reply (referral targets).
///
/// Strips `whois://` / `rwhois://` schemes, ports, trailing dots and
/// lowercases. Returns `None` for anything that does not look like a host.
pub fn normalize_host(raw: &str) -> Option<String> {
    let mut host = raw.trim();
    for scheme in ["rwhois://", "whois://"] {
        if let Some(prefix) = host.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                host = &host[scheme.len()..];
            }
        }
    }
    if host.contains("://") {
        return None;
    }

    let host = host.split('/').next().unwrap_or_default();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if !is_ip_address(host) && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    };
    let host = host.trim_end_matches('.').to_lowercase();

    let valid = !host.is_empty()
        && !host.contains(char::is_whitespace)
        && (host.contains('.') || is_ip_address(&host));
    valid.then_some(host)
}

/// Whether the text is a literal IPv4/IPv6 address.
pub fn is_ip_address(text: &str) -> bool {
    text.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("test").is_ok());
        assert!(validate_domain("").is_err());
        assert!(validate_domain("bad domain.com").is_err());
        assert!(validate_domain(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_to_ascii_domain() {
        assert_eq!(to_ascii_domain("Example.COM").unwrap(), "example.com");
        assert_eq!(to_ascii_domain("example.com.").unwrap(), "example.com");
        assert_eq!(
            to_ascii_domain("bücher.example").unwrap(),
            "xn--bcher-kva.example"
        );
        assert_eq!(to_ascii_domain("пример.рф").unwrap(), "xn--e1afmkfd.xn--p1ai");
        assert!(to_ascii_domain(".").is_err());
    }

    #[test]
    fn test_normalize_zone() {
        assert_eq!(normalize_zone("com").unwrap(), ".com");
        assert_eq!(normalize_zone(".CO.UK.").unwrap(), ".co.uk");
        assert_eq!(normalize_zone("рф").unwrap(), ".xn--p1ai");
        assert_eq!(normalize_zone("").unwrap(), "");
        assert_eq!(normalize_zone(" . ").unwrap(), "");
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("whois.markmonitor.com").as_deref(),
            Some("whois.markmonitor.com")
        );
        assert_eq!(
            normalize_host("  WHOIS.Example.NET. ").as_deref(),
            Some("whois.example.net")
        );
        assert_eq!(
            normalize_host("rwhois://rwhois.example.net:4321").as_deref(),
            Some("rwhois.example.net")
        );
        assert_eq!(
            normalize_host("whois://whois.ripe.net").as_deref(),
            Some("whois.ripe.net")
        );
        assert_eq!(normalize_host("https://rdap.example.com/"), None);
        assert_eq!(normalize_host(""), None);
        assert_eq!(normalize_host("localhost"), None);
    }

    #[test]
    fn test_is_ip_address() {
        assert!(is_ip_address("192.0.2.1"));
        assert!(is_ip_address("2001:db8::1"));
        assert!(!is_ip_address("ns1.example.com"));
    }
}
