//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables and merging them with proper precedence rules.

use crate::error::WhoisError;
use crate::parsers::Decoder;
use crate::protocols::query::{QueryBuilder, DEFAULT_QUERY_FORMAT};
use crate::types::{LookupConfig, ServerEntry};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// timeout = "10s"
/// recursion_limit = 1
///
/// [[servers]]
/// zone = ".test"
/// host = "whois.test"
/// decoder = "common"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for lookup options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Servers placed ahead of the built-in table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<ServerConfig>>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Per round trip timeout (as string, e.g., "5s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursion_limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_retry: Option<bool>,

    /// Reply cache lifetime (as string, e.g., "10m", "1h")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

/// One `[[servers]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerConfig {
    /// Zone suffix; empty for a catch-all
    #[serde(default)]
    pub zone: String,

    pub host: String,

    #[serde(default)]
    pub centralized: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_format: Option<String>,

    /// Decoder name, `auto` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoder: Option<String>,
}

impl ServerConfig {
    pub fn to_entry(&self) -> Result<ServerEntry, WhoisError> {
        let decoder = match &self.decoder {
            Some(name) => Decoder::from_name(name)?,
            None => Decoder::default(),
        };
        ServerEntry::new(
            &self.zone,
            &self.host,
            self.centralized,
            self.query_format.as_deref().unwrap_or(DEFAULT_QUERY_FORMAT),
            Arc::new(decoder),
        )
    }
}

impl FileConfig {
    /// Configured servers in file order.
    pub fn server_entries(&self) -> Result<Vec<ServerEntry>, WhoisError> {
        self.servers
            .iter()
            .flatten()
            .map(ServerConfig::to_entry)
            .collect()
    }

    /// Apply the `[defaults]` section on top of `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_timeout(Duration::from_secs(timeout));
        }
        if let Some(limit) = defaults.recursion_limit {
            config = config.with_recursion_limit(limit);
        }
        if let Some(strict) = defaults.strict_retry {
            config = config.with_strict_retry(strict);
        }
        if let Some(ttl) = defaults.cache_ttl.as_deref().and_then(parse_timeout_string) {
            config = config.with_cache_ttl(Some(Duration::from_secs(ttl)));
        }
        if let Some(concurrency) = defaults.concurrency {
            config = config.with_concurrency(concurrency);
        }
        config
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if parsing fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WhoisError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WhoisError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| WhoisError::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", e),
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks for configuration files in standard locations and merges them
    /// according to precedence rules.
    pub fn discover_and_load(&self) -> Result<FileConfig, WhoisError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let discovered = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        // Lowest precedence first
        for path in discovered.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!("Ignoring config file {}: {}", path.display(), e),
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            warn!("Multiple config files found, later ones take precedence:");
            for path in &loaded_files {
                warn!("   {}", path.display());
            }
        } else if let Some(path) = loaded_files.first() {
            debug!("Loaded config file {}", path.display());
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    ///
    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./whois-lookup.toml", "./.whois-lookup.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path.
    ///
    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".whois-lookup.toml", "whois-lookup.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    ///
    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-lookup").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`; the
    /// server lists are concatenated with `higher`'s servers first.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    recursion_limit: higher_defaults
                        .recursion_limit
                        .or(lower_defaults.recursion_limit),
                    strict_retry: higher_defaults.strict_retry.or(lower_defaults.strict_retry),
                    cache_ttl: higher_defaults.cache_ttl.or(lower_defaults.cache_ttl),
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                }),
                (None, Some(higher_defaults)) => Some(higher_defaults),
                (Some(lower_defaults), None) => Some(lower_defaults),
                (None, None) => None,
            },
            servers: match (lower.servers, higher.servers) {
                (Some(lower_servers), Some(mut higher_servers)) => {
                    higher_servers.extend(lower_servers);
                    Some(higher_servers)
                }
                (None, Some(higher_servers)) => Some(higher_servers),
                (Some(lower_servers), None) => Some(lower_servers),
                (None, None) => None,
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), WhoisError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(WhoisError::config("Concurrency must be between 1 and 100"));
                }
            }

            let durations = [("timeout", &defaults.timeout), ("cache_ttl", &defaults.cache_ttl)];
            for (name, value) in durations {
                if let Some(value) = value {
                    if parse_timeout_string(value).is_none() {
                        return Err(WhoisError::config(format!(
                            "Invalid {} format '{}'. Use format like '5s', '2m', '1h'",
                            name, value
                        )));
                    }
                }
            }
        }

        for server in config.servers.iter().flatten() {
            if server.host.trim().is_empty() {
                return Err(WhoisError::config(format!(
                    "Server for zone '{}' has no host",
                    server.zone
                )));
            }
            if let Some(format) = &server.query_format {
                QueryBuilder::validate(format)?;
            }
            if let Some(decoder) = &server.decoder {
                Decoder::from_name(decoder)?;
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via WL_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub timeout: Option<String>,
    pub recursion_limit: Option<u32>,
    pub strict_retry: Option<bool>,
    pub cache_ttl: Option<String>,
}

impl EnvConfig {
    /// Apply the set variables on top of `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(timeout) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_timeout(Duration::from_secs(timeout));
        }
        if let Some(limit) = self.recursion_limit {
            config = config.with_recursion_limit(limit);
        }
        if let Some(strict) = self.strict_retry {
            config = config.with_strict_retry(strict);
        }
        if let Some(ttl) = self.cache_ttl.as_deref().and_then(parse_timeout_string) {
            config = config.with_cache_ttl(Some(Duration::from_secs(ttl)));
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(|name| env::var(name).ok(), verbose)
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(lookup: F, verbose: bool) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // WL_TIMEOUT - per round trip timeout
    if let Some(timeout_str) = lookup("WL_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            if verbose {
                debug!("Using WL_TIMEOUT={}", timeout_str);
            }
            env_config.timeout = Some(timeout_str);
        } else {
            warn!(
                "Invalid WL_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                timeout_str
            );
        }
    }

    // WL_RECURSION_LIMIT - referral hops
    if let Some(val) = lookup("WL_RECURSION_LIMIT") {
        match val.trim().parse::<u32>() {
            Ok(limit) => {
                if verbose {
                    debug!("Using WL_RECURSION_LIMIT={}", limit);
                }
                env_config.recursion_limit = Some(limit);
            }
            Err(_) => warn!("Invalid WL_RECURSION_LIMIT='{}', must be a number", val),
        }
    }

    // WL_STRICT_RETRY - enable/disable the strict retry
    if let Some(val) = lookup("WL_STRICT_RETRY") {
        match parse_bool(&val) {
            Some(strict) => {
                if verbose {
                    debug!("Using WL_STRICT_RETRY={}", strict);
                }
                env_config.strict_retry = Some(strict);
            }
            None => warn!("Invalid WL_STRICT_RETRY='{}', use true/false", val),
        }
    }

    // WL_CACHE_TTL - reply cache lifetime
    if let Some(ttl_str) = lookup("WL_CACHE_TTL") {
        if parse_timeout_string(&ttl_str).is_some() {
            if verbose {
                debug!("Using WL_CACHE_TTL={}", ttl_str);
            }
            env_config.cache_ttl = Some(ttl_str);
        } else {
            warn!("Invalid WL_CACHE_TTL='{}', use format like '10m', '1h'", ttl_str);
        }
    }

    env_config
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration string like "5s", "2m", "1h" into seconds.
///
/// A bare number is taken as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| m * 60)
    } else if let Some(hours) = timeout_str.strip_suffix('h') {
        hours.parse::<u64>().ok().map(|h| h * 3600)
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::DecoderKind;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30s"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("1h"), Some(3600));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
timeout = "3s"
recursion_limit = 2
strict_retry = false
cache_ttl = "1h"

[[servers]]
zone = ".test"
host = "whois.test"
decoder = "common_flat"

[[servers]]
host = "whois.fallback.test"
query_format = "{strict:=}{domain}\r\n"
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();

        let lookup = config.apply_to(LookupConfig::default());
        assert_eq!(lookup.timeout, Duration::from_secs(3));
        assert_eq!(lookup.recursion_limit, 2);
        assert!(!lookup.strict_retry);
        assert_eq!(lookup.cache_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(lookup.concurrency, 10);

        let entries = config.server_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].zone, ".test");
        assert_eq!(entries[0].decoder.kind(), DecoderKind::CommonFlat);
        assert!(entries[1].is_catch_all());
        assert_eq!(entries[1].query_format, "{strict:=}{domain}\r\n");
        assert_eq!(entries[1].decoder.kind(), DecoderKind::Auto);
    }

    #[test]
    fn test_invalid_configs() {
        let manager = ConfigManager::new(false);
        for content in [
            "[defaults]\nconcurrency = 0\n",
            "[defaults]\ntimeout = \"soon\"\n",
            "[[servers]]\nzone = \"test\"\nhost = \"\"\n",
            "[[servers]]\nhost = \"whois.test\"\nquery_format = \"no placeholder\"\n",
            "[[servers]]\nhost = \"whois.test\"\ndecoder = \"xml\"\n",
            "not toml at all [",
        ] {
            let temp_file = write_config(content);
            assert!(manager.load_file(temp_file.path()).is_err(), "{}", content);
        }
        assert!(manager.load_file("/nonexistent/whois-lookup.toml").is_err());
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let server = |host: &str| ServerConfig {
            zone: "test".to_string(),
            host: host.to_string(),
            ..Default::default()
        };

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                timeout: Some("10s".to_string()),
                recursion_limit: Some(1),
                ..Default::default()
            }),
            servers: Some(vec![server("whois.lower.test")]),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                timeout: Some("2s".to_string()),
                ..Default::default()
            }),
            servers: Some(vec![server("whois.higher.test")]),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();
        assert_eq!(defaults.timeout, Some("2s".to_string())); // Higher wins
        assert_eq!(defaults.recursion_limit, Some(1)); // Lower preserved

        let hosts: Vec<String> = merged.servers.unwrap().into_iter().map(|s| s.host).collect();
        assert_eq!(hosts, vec!["whois.higher.test", "whois.lower.test"]);
    }

    #[test]
    fn test_env_config() {
        let vars: HashMap<&str, &str> = [
            ("WL_TIMEOUT", "4s"),
            ("WL_RECURSION_LIMIT", "3"),
            ("WL_STRICT_RETRY", "off"),
            ("WL_CACHE_TTL", "bogus"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|name| vars.get(name).map(|v| v.to_string()), false);
        assert_eq!(env_config.timeout, Some("4s".to_string()));
        assert_eq!(env_config.recursion_limit, Some(3));
        assert_eq!(env_config.strict_retry, Some(false));
        assert_eq!(env_config.cache_ttl, None);

        let config = env_config.apply_to(LookupConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(4));
        assert_eq!(config.recursion_limit, 3);
        assert!(!config.strict_retry);
        assert!(config.cache_ttl.is_none());
    }
}
