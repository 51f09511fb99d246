//! Field vocabulary shared by every decoder.
//!
//! Registries label the same data in dozens of ways. Decoders reduce a reply
//! to normalized `(key, value)` pairs; this module maps those keys onto
//! [`Record`] fields.

use crate::types::Record;
use crate::utils::{is_ip_address, normalize_host};

/// A `key: value` pair with the key normalized by [`normalize_key`].
pub(crate) type Pair = (String, String);

const DOMAIN_KEYS: &[&str] = &["domain name", "domain", "domainname", "domain information"];

const REGISTRAR_KEYS: &[&str] = &[
    "registrar",
    "registrar name",
    "sponsoring registrar",
    "registrar organization",
    "registrar organisation",
    "registrar handle",
    "authorized agency",
];

const OWNER_KEYS: &[&str] = &[
    "registrant organization",
    "registrant organisation",
    "registrant",
    "registrant name",
    "holder",
    "org",
    "organization",
    "owner",
];

const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "created date",
    "registered on",
    "registered",
    "registration date",
    "registration time",
    "domain registration date",
    "domain record activated",
];

const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expires",
    "expires on",
    "expire date",
    "expiration time",
    "paid-till",
    "free-date",
    "renewal date",
    "domain expiration date",
    "record expires on",
];

const UPDATED_KEYS: &[&str] = &[
    "updated date",
    "last updated",
    "last updated on",
    "updated",
    "last modified",
    "last update",
    "last-update",
    "modified",
    "changed",
];

const NAME_SERVER_KEYS: &[&str] = &[
    "name server",
    "name servers",
    "nameserver",
    "nameservers",
    "nserver",
    "dns",
    "domain servers in listed order",
];

const STATUS_KEYS: &[&str] = &[
    "domain status",
    "status",
    "state",
    "registration status",
    "domain state",
];

const REFERRAL_KEYS: &[&str] = &[
    "registrar whois server",
    "whois server",
    "whois",
    "refer",
    "referralserver",
];

/// Line prefixes (after comment markers) meaning "no such domain".
const NOT_FOUND_MARKERS: &[&str] = &[
    "no match",
    "not found",
    "no entries found",
    "no data found",
    "no object found",
    "nothing found",
    "domain not found",
    "object does not exist",
    "the queried object does not exist",
    "status: free",
    "status: available",
    "no information available",
    "this domain name has not been registered",
    "error:101: no entries found",
];

/// Lowercase, collapse whitespace, drop dot leaders and brackets.
///
/// `"Registry Expiry Date"` → `"registry expiry date"`,
/// `"Domain Name......"` → `"domain name"`, `"[Registrant]"` → `"registrant"`.
pub(crate) fn normalize_key(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches(['.', ' ', '\t'])
        .replace('_', " ")
        .to_lowercase();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether the line is a remark rather than data.
pub(crate) fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('%')
        || trimmed.starts_with('#')
        || trimmed.starts_with(">>>")
        || trimmed.starts_with("NOTICE:")
        || trimmed.starts_with("TERMS OF USE:")
}

/// Split one line into a normalized pair.
///
/// Accepts `Key: value`, `Key:value`, `Key.....: value` and the bracketed
/// `[Key]   value` style. Lines without a recognizable key return `None`.
pub(crate) fn split_pair(line: &str) -> Option<Pair> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix('[') {
        let (key, value) = rest.split_once(']')?;
        let key = normalize_key(key);
        return (!key.is_empty()).then(|| (key, value.trim().to_string()));
    }

    let (key, value) = trimmed.split_once(':')?;
    if value.starts_with("//") {
        return None;
    }
    let key = normalize_key(key);
    if key.is_empty() || key.len() > 60 {
        return None;
    }
    Some((key, value.trim().to_string()))
}

/// Whether the reply says `domain` is not registered.
///
/// A marker on a data line is final. A marker inside a remark only counts
/// when no data line names `domain`, so disclaimers around a full record
/// do not discard it.
pub(crate) fn is_not_found(text: &str, domain: &str) -> bool {
    let mut in_remark = false;
    for line in text.lines() {
        let cleaned = line
            .trim()
            .trim_start_matches(['%', '#', ' ', '\t'])
            .to_lowercase();
        if NOT_FOUND_MARKERS.iter().any(|marker| cleaned.starts_with(marker)) {
            if !is_comment(line) {
                return true;
            }
            in_remark = true;
        }
    }
    in_remark && !names_domain(text, domain)
}

fn names_domain(text: &str, domain: &str) -> bool {
    let pairs: Vec<Pair> = text
        .lines()
        .filter(|line| !is_comment(line))
        .filter_map(split_pair)
        .collect();
    mentions_domain(&pairs, domain)
}

/// Whether a pair list names `domain` in one of its domain fields.
pub(crate) fn mentions_domain(pairs: &[Pair], domain: &str) -> bool {
    pairs.iter().any(|(key, value)| {
        DOMAIN_KEYS.contains(&key.as_str()) && same_domain(value, domain)
    })
}

/// Whether a pair list carries any domain field.
pub(crate) fn has_domain_key(pairs: &[Pair]) -> bool {
    pairs
        .iter()
        .any(|(key, value)| DOMAIN_KEYS.contains(&key.as_str()) && !value.is_empty())
}

fn same_domain(value: &str, domain: &str) -> bool {
    value
        .split_whitespace()
        .next()
        .map(|first| first.trim_end_matches('.').eq_ignore_ascii_case(domain.trim_end_matches('.')))
        .unwrap_or(false)
}

/// Map pairs onto a record. `None` when no field is recognized.
///
/// Single-valued fields take the first value of the highest-priority key;
/// list fields collect every value of every matching key.
pub(crate) fn record_from_pairs(pairs: &[Pair]) -> Option<Record> {
    let record = Record {
        domain: first_value(pairs, DOMAIN_KEYS).and_then(|value| {
            value
                .split_whitespace()
                .next()
                .map(|name| name.trim_end_matches('.').to_lowercase())
        }),
        registrar: first_value(pairs, REGISTRAR_KEYS),
        owner: first_value(pairs, OWNER_KEYS),
        creation_date: first_value(pairs, CREATION_KEYS),
        expiration_date: first_value(pairs, EXPIRATION_KEYS),
        updated_date: first_value(pairs, UPDATED_KEYS),
        name_servers: name_servers(pairs),
        statuses: statuses(pairs),
        referral_host: all_values(pairs, REFERRAL_KEYS)
            .iter()
            .find_map(|value| normalize_host(value)),
    };

    (!record.is_empty()).then_some(record)
}

fn first_value(pairs: &[Pair], keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|wanted| {
        pairs
            .iter()
            .find(|(key, value)| key == wanted && !value.is_empty())
            .map(|(_, value)| value.clone())
    })
}

fn all_values<'a>(pairs: &'a [Pair], keys: &[&str]) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(key, value)| keys.contains(&key.as_str()) && !value.is_empty())
        .map(|(_, value)| value.as_str())
        .collect()
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.iter().any(|existing| existing.eq_ignore_ascii_case(&value)) {
        list.push(value);
    }
}

fn name_servers(pairs: &[Pair]) -> Vec<String> {
    let mut servers = Vec::new();
    for value in all_values(pairs, NAME_SERVER_KEYS) {
        for token in value.split(|c: char| c.is_whitespace() || c == ',') {
            let host = token.trim_end_matches('.').to_lowercase();
            if host.contains('.') && !is_ip_address(&host) && !host.starts_with('(') {
                push_unique(&mut servers, host);
            }
        }
    }
    servers
}

fn statuses(pairs: &[Pair]) -> Vec<String> {
    let mut statuses = Vec::new();
    for value in all_values(pairs, STATUS_KEYS) {
        for part in value.split(',') {
            let status = part
                .split_whitespace()
                .take_while(|word| !word.starts_with("http") && !word.starts_with('('))
                .collect::<Vec<_>>()
                .join(" ");
            if !status.is_empty() {
                push_unique(&mut statuses, status);
            }
        }
    }
    statuses
}
