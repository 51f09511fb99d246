//! Display logic for whois-lookup CLI.
//!
//! Styled, human-readable rendering of lookup outcomes and decoded records.
//! JSON output bypasses this module entirely. Uses only the `console` crate.

use console::{pad_str, style, Alignment};
use whois_lookup_lib::{LookupOutcome, Record, WhoisError};

/// Width of the field label column
const LABEL_WIDTH: usize = 16;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print the domain with the chain of servers that were asked.
fn print_header(domain: &str, hosts: &[&str]) {
    if hosts.is_empty() {
        println!("{}", style(domain).bold());
    } else {
        println!(
            "{} {}",
            style(domain).bold(),
            style(format!("via {}", hosts.join(" -> "))).dim(),
        );
    }
}

// ── Full outcome ─────────────────────────────────────────────────────────────

/// Print the raw reply of the chosen server followed by the decoded record.
pub fn print_outcome(outcome: &LookupOutcome) {
    print_header(&outcome.domain, &outcome.contacted_hosts());
    println!();

    match outcome.response() {
        Some(response) => {
            println!(
                "{} {}",
                style("Reply from").yellow().bold(),
                style(&response.host).cyan(),
            );
            for line in response.output.lines() {
                println!("  {}", style(line).dim());
            }
        }
        None => println!("{}", style("No reply").yellow()),
    }
    println!();

    print_fields(outcome.record());
    println!();
}

// ── Record only ──────────────────────────────────────────────────────────────

/// Print the decoded record of `domain`.
pub fn print_record(domain: &str, record: Option<&Record>) {
    print_header(domain, &[]);
    print_fields(record);
}

fn print_fields(record: Option<&Record>) {
    let Some(record) = record else {
        println!("  {}", style("No registration data").yellow());
        return;
    };

    let singles = [
        ("Domain", &record.domain),
        ("Registrar", &record.registrar),
        ("Registrant", &record.owner),
        ("Created", &record.creation_date),
        ("Expires", &record.expiration_date),
        ("Updated", &record.updated_date),
        ("Referral", &record.referral_host),
    ];
    for (label, value) in singles {
        if let Some(value) = value {
            print_field(label, value);
        }
    }

    print_list("Name servers", &record.name_servers);
    print_list("Status", &record.statuses);
}

fn print_field(label: &str, value: &str) {
    println!(
        "  {}  {}",
        style(pad_str(label, LABEL_WIDTH, Alignment::Left, None)).green(),
        value
    );
}

/// First value next to the label, the rest aligned underneath.
fn print_list(label: &str, values: &[String]) {
    for (i, value) in values.iter().enumerate() {
        let label = if i == 0 { label } else { "" };
        print_field(label, value);
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Print a failed lookup inside a batch; the run keeps going.
pub fn print_failure(domain: &str, error: &WhoisError) {
    println!(
        "{}  {}  {}",
        style(domain).bold(),
        style("FAILED").red().bold(),
        style(error).dim(),
    );
    println!();
}
