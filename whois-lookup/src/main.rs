//! WHOIS Lookup CLI Application
//!
//! A command-line interface for resolving domain registration records over WHOIS.
//! This CLI application provides a user-friendly interface to the whois-lookup-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use whois_lookup_lib::{load_env_config, parse_timeout_string, ConfigManager, FileConfig};
use whois_lookup_lib::{
    Decoder, DecoderKind, FixedTextTransport, LookupConfig, LookupOverrides, ServerTable,
    SocketTransport, Transport, WhoisLookup,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Referral chains deeper than this are almost certainly loops
const MAX_RECURSION: u32 = 10;

/// CLI arguments for whois-lookup
#[derive(Parser, Debug)]
#[command(name = "whois-lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Look up domain registration records over WHOIS")]
#[command(
    long_about = "Look up domain registration records over WHOIS.\n\n\
                  Picks the registry server for the domain's zone, follows referrals to the \
                  registrar's server and decodes the plain-text reply into a structured record."
)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output results in JSON format
    #[arg(
        short = 'j',
        long = "json",
        global = true,
        help_heading = "Output Format"
    )]
    pub json: bool,

    /// Use a specific config file instead of automatic discovery
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Configuration"
    )]
    pub config: Option<String>,

    /// Timeout for each WHOIS round trip (e.g. 5s, 1m)
    #[arg(
        long = "timeout",
        value_name = "DURATION",
        global = true,
        help_heading = "Lookup Settings"
    )]
    pub timeout: Option<String>,

    /// How many referrals to follow past the first server
    #[arg(
        short = 'r',
        long = "recursion",
        value_name = "N",
        global = true,
        help_heading = "Lookup Settings"
    )]
    pub recursion: Option<u32>,

    /// Never retry with the server's exact-match query form
    #[arg(long = "no-strict", global = true, help_heading = "Lookup Settings")]
    pub no_strict: bool,

    /// Reuse replies for this long (e.g. 10m, 1h)
    #[arg(
        long = "cache-ttl",
        value_name = "DURATION",
        global = true,
        help_heading = "Lookup Settings"
    )]
    pub cache_ttl: Option<String>,

    /// Decode a saved WHOIS reply instead of querying the network
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        global = true,
        help_heading = "Lookup Settings"
    )]
    pub file: Option<String>,

    /// Show debug logs on stderr
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        help_heading = "Debugging"
    )]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up domains and print the reply and the decoded record
    Lookup {
        /// Domain names to look up
        #[arg(value_name = "DOMAIN", required = true)]
        domains: Vec<String>,
    },
    /// Print the decoded record of one domain
    Info {
        /// Domain name to look up
        #[arg(value_name = "DOMAIN")]
        domain: String,

        /// Ask this WHOIS host instead of the zone's server
        #[arg(long = "host", value_name = "HOST")]
        host: Option<String>,

        /// Reply decoder: auto, common, common_flat, block, indent, indent_autofix
        #[arg(long = "parser", value_name = "NAME")]
        parser: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_tracing(args.verbose);
    let lib = whois_lookup_lib::info();
    debug!(
        "whois-lookup v{} starting (library v{}, features: {})",
        env!("CARGO_PKG_VERSION"),
        lib.version,
        lib.features.join(", ")
    );

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Send logs to stderr so stdout stays machine-readable.
///
/// `RUST_LOG` picks the filter; `--verbose` forces debug.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    for (flag, value) in [("--timeout", &args.timeout), ("--cache-ttl", &args.cache_ttl)] {
        if let Some(value) = value {
            match parse_timeout_string(value) {
                Some(0) => return Err(format!("{} must be greater than zero", flag)),
                Some(_) => {}
                None => {
                    return Err(format!(
                        "Invalid {} value '{}'. Use format like '5s', '2m', '1h'",
                        flag, value
                    ))
                }
            }
        }
    }

    if let Some(limit) = args.recursion {
        if limit > MAX_RECURSION {
            return Err(format!("--recursion must be at most {}", MAX_RECURSION));
        }
    }

    if let Command::Info {
        parser: Some(name), ..
    } = &args.command
    {
        name.parse::<DecoderKind>().map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Main lookup logic
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let (config, servers) = build_config(&args)?;

    let transport: Arc<dyn Transport> = match &args.file {
        Some(path) => {
            debug!("Decoding saved reply from {}", path);
            Arc::new(FixedTextTransport::from_file(path)?)
        }
        None => Arc::new(SocketTransport::new()),
    };

    let lookup = WhoisLookup::new(servers, transport, config);

    match &args.command {
        Command::Lookup { domains } => run_lookup(&lookup, domains, args.json).await,
        Command::Info {
            domain,
            host,
            parser,
        } => {
            let mut overrides = LookupOverrides::default();
            if let Some(host) = host {
                overrides = overrides.with_host(host.as_str());
            }
            if let Some(name) = parser {
                overrides = overrides.with_decoder(Arc::new(Decoder::from_name(name)?));
            }

            let outcome = lookup.lookup(domain, &overrides).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome.record())?);
            } else {
                ui::print_record(&outcome.domain, outcome.record());
            }
            Ok(())
        }
    }
}

/// Look up one or more domains, printing each outcome in input order.
async fn run_lookup(
    lookup: &WhoisLookup,
    domains: &[String],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let [domain] = domains {
        let outcome = lookup.lookup_domain(domain).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            ui::print_outcome(&outcome);
        }
        return Ok(());
    }

    let results = lookup.lookup_many(domains).await;

    if json {
        let values = domains
            .iter()
            .zip(&results)
            .map(|(domain, result)| match result {
                Ok(outcome) => serde_json::to_value(outcome),
                Err(e) => Ok(serde_json::json!({
                    "domain": domain,
                    "error": e.to_string(),
                })),
            })
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for (domain, result) in domains.iter().zip(&results) {
            match result {
                Ok(outcome) => ui::print_outcome(outcome),
                Err(e) => ui::print_failure(domain, e),
            }
        }
    }

    let failed = results.iter().filter(|result| result.is_err()).count();
    if failed > 0 {
        return Err(format!("{} of {} lookups failed", failed, domains.len()).into());
    }
    Ok(())
}

/// Build the lookup configuration and server table.
///
/// Precedence, lowest first: built-in defaults, config file, `WL_*`
/// environment variables, command line flags. Configured servers go before
/// the built-in ones.
fn build_config(args: &Args) -> Result<(LookupConfig, ServerTable), Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: Load config files
    let file_config = if let Some(explicit_config_path) = &args.config {
        debug!(
            "Using explicit config file (CLI --config): {}",
            explicit_config_path
        );
        config_manager
            .load_file(explicit_config_path)
            .map_err(|e| {
                format!(
                    "Failed to load config file '{}': {}",
                    explicit_config_path, e
                )
            })?
    } else if let Ok(env_config_path) = std::env::var("WL_CONFIG") {
        debug!(
            "Using explicit config file (WL_CONFIG env var): {}",
            env_config_path
        );
        config_manager
            .load_file(&env_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", env_config_path, e))?
    } else {
        config_manager.discover_and_load().unwrap_or_else(|e| {
            warn!("Config discovery warning: {}", e);
            FileConfig::default()
        })
    };

    let servers = ServerTable::builtin().with_prepended(file_config.server_entries()?);
    let config = file_config.apply_to(LookupConfig::default());

    // Step 2: Apply environment variables (WL_*)
    let config = load_env_config(args.verbose).apply_to(config);

    // Step 3: Apply CLI arguments (highest precedence)
    let config = apply_cli_args_to_config(config, args)?;

    Ok((config, servers))
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(mut config: LookupConfig, args: &Args) -> Result<LookupConfig, String> {
    if let Some(timeout) = &args.timeout {
        let secs = parse_timeout_string(timeout)
            .ok_or_else(|| format!("Invalid --timeout value '{}'", timeout))?;
        config = config.with_timeout(Duration::from_secs(secs));
    }

    if let Some(limit) = args.recursion {
        config = config.with_recursion_limit(limit);
    }

    // Only override when the flag is passed, so config/env values survive
    if args.no_strict {
        config = config.with_strict_retry(false);
    }

    if let Some(ttl) = &args.cache_ttl {
        let secs = parse_timeout_string(ttl)
            .ok_or_else(|| format!("Invalid --cache-ttl value '{}'", ttl))?;
        config = config.with_cache_ttl(Some(Duration::from_secs(secs)));
    }

    // A saved reply answers every host the same way, so referrals lead nowhere
    if args.file.is_some() {
        config = config.with_recursion_limit(0).with_cache_ttl(None);
    }

    Ok(config)
}
