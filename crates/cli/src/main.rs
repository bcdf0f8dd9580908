mod builtin;
mod config;
mod error;
mod logging;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use runtime::{Catalog, Registry};
use storage::{AuditEntry, AuditLog, Outcome, TrustLedger};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "toolgate.toml";
const LEDGER_ENV: &str = "TOOLGATE_LEDGER";

#[derive(Parser)]
#[command(name = "toolgate")]
#[command(about = "Trust-gated capability registry", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every capability with its classification and trust tier
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Promote every non-destructive capability to verified
    Verify,
    /// Promote a capability to trusted, or every capability when no name is given
    Trust {
        /// Capability name
        name: Option<String>,
        /// Skip the confirmation prompt when trusting everything
        #[arg(short, long)]
        yes: bool,
    },
    /// Demote capabilities back to untrusted
    Reset {
        /// Capability name
        #[arg(required_unless_present = "all")]
        name: Option<String>,
        /// Reset every capability
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },
    /// Invoke a capability through the trust gate
    Invoke {
        /// Capability name
        name: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Show the audit trail
    Audit {
        /// Show only the last N entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only entries for this capability
        #[arg(short, long)]
        capability: Option<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;
    logging::init(&config.logging)?;

    let registry = open_registry(&config)?;

    match cli.command.unwrap_or(Commands::Status { json: false }) {
        Commands::Status { json } => cmd_status(&registry, json),
        Commands::Verify => cmd_verify(&registry),
        Commands::Trust { name, yes } => cmd_trust(&registry, name.as_deref(), yes),
        Commands::Reset { name, all } => {
            cmd_reset(&registry, if all { None } else { name.as_deref() })
        }
        Commands::Invoke { name, args } => cmd_invoke(&registry, &name, &args),
        Commands::Audit { limit, capability } => cmd_audit(&registry, limit, capability.as_deref()),
    }
}

fn cmd_status(registry: &Registry, json: bool) -> Result<()> {
    let status = registry.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{:<24}  {:<10}  {:<11}  {:<9}  REASON",
        "CAPABILITY", "SOURCE", "DESTRUCTIVE", "TIER"
    );
    println!("{}", "-".repeat(72));
    for row in status {
        println!(
            "{:<24}  {:<10}  {:<11}  {:<9}  {}",
            row.name,
            row.source.to_string(),
            if row.destructive { "yes" } else { "no" },
            row.tier.as_str(),
            row.reason
        );
    }
    Ok(())
}

fn cmd_verify(registry: &Registry) -> Result<()> {
    let promoted = registry.verify_all_safe()?;
    println!("Verified {promoted} non-destructive capabilities.");
    Ok(())
}

fn cmd_trust(registry: &Registry, name: Option<&str>, yes: bool) -> Result<()> {
    if let Some(name) = name {
        registry.trust_tool(name)?;
        println!("{name} is now trusted.");
        return Ok(());
    }

    let total = registry.catalog().len();
    let destructive = registry.status().iter().filter(|s| s.destructive).count();
    if !yes
        && !confirm(&format!(
            "Trust all {total} capabilities, including {destructive} destructive? [y/N] "
        ))?
    {
        return Err(Error::Aborted);
    }

    let promoted = registry.trust_all()?;
    println!("Trusted {promoted} capabilities ({total} total).");
    Ok(())
}

fn cmd_reset(registry: &Registry, name: Option<&str>) -> Result<()> {
    let removed = registry.reset(name)?;
    match name {
        Some(name) => println!("{name} reset to untrusted."),
        None => println!("Reset {removed} capabilities to untrusted."),
    }
    Ok(())
}

fn cmd_invoke(registry: &Registry, name: &str, args: &str) -> Result<()> {
    let args: serde_json::Value = serde_json::from_str(args).map_err(Error::InvalidArgs)?;
    let value = registry.invoke(name, &args)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_audit(registry: &Registry, limit: usize, capability: Option<&str>) -> Result<()> {
    let entries = match capability {
        Some(name) => {
            let all = registry.audit().for_capability(name)?;
            let skip = all.len().saturating_sub(limit);
            all.into_iter().skip(skip).collect()
        }
        None => registry.audit().recent(limit)?,
    };

    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

fn print_entry(entry: &AuditEntry) {
    let time = Local
        .from_utc_datetime(&entry.timestamp.naive_utc())
        .format("%Y-%m-%d %H:%M:%S");

    let detail = match &entry.outcome {
        Outcome::Success => "SUCCESS".to_string(),
        Outcome::Failure { error } => format!("FAILURE: {error}"),
        Outcome::Denied { required } => format!("DENIED (requires {required})"),
    };
    println!(
        "[{time}] {} at {}: {detail}",
        entry.capability, entry.tier_at_call
    );
}

fn confirm(prompt: &str) -> Result<bool> {
    let mut stdout = io::stdout();
    print!("{prompt}");
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn open_registry(config: &Config) -> Result<Registry> {
    let mut builder = Catalog::builder();
    builder
        .register_static(builtin::static_capabilities())?
        .discover_dynamic(&[&builtin::fs_source()]);
    let catalog = builder.build()?;

    let data_dir = dirs_data_dir().unwrap_or_else(|| ".toolgate".into());
    let ledger_path =
        config.ledger_path(std::env::var_os(LEDGER_ENV).map(PathBuf::from), &data_dir);
    let audit = AuditLog::open(config.audit_path(&data_dir))?;

    tracing::debug!(ledger = %ledger_path.display(), "opening registry");
    Ok(Registry::new(catalog, TrustLedger::open(ledger_path), audit))
}

fn load_config() -> Result<Config> {
    let path = PathBuf::from(CONFIG_FILE);

    if path.exists() {
        Ok(Config::load(&path)?)
    } else {
        Ok(Config::default())
    }
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/toolgate"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("toolgate"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("toolgate"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}
