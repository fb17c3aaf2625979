//! Journal Index CLI
//!
//! Command-line interface for inspecting a journal directory:
//! - Build the index and list journals
//! - Find the journal current at a point in time
//! - Create new journal files
//! - Generate a default config

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use journal_index::config::{generate_default_config, Config, LoggingConfig};
use journal_index::{JournalDescriptor, ResourceManager};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "journal-index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find the journal that was current at a point in time")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the journal directory and list every indexed journal
    Scan {
        /// Journal directory (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Find the journal current at a timestamp
    Find {
        /// Timestamp: "now", Unix milliseconds, or RFC 3339
        timestamp: String,
        /// Journal directory (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Create a new journal file
    Create {
        /// Journal directory (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Create time (default: now)
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default()?,
    };

    init_logging(&config.logging);

    match cli.command {
        Commands::Scan { dir } => {
            if let Some(dir) = dir {
                config.journal.dir = dir.to_string_lossy().to_string();
            }

            let manager = ResourceManager::open(&config).context("building journal index")?;
            let journals = manager.entries()?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&journals)?),
                _ => {
                    print_table(&journals);
                    println!();
                    println!("{}", manager.stats()?);
                }
            }

            manager.shutdown()?;
        }

        Commands::Find { timestamp, dir } => {
            if let Some(dir) = dir {
                config.journal.dir = dir.to_string_lossy().to_string();
            }

            let timestamp = parse_timestamp(&timestamp)?;
            let manager = ResourceManager::open(&config).context("building journal index")?;

            match (manager.find_with_position(timestamp)?, cli.format.as_str()) {
                (Some((position, journal)), "json") => {
                    let body = serde_json::json!({
                        "timestamp": timestamp,
                        "position": position,
                        "journal": journal,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                (Some((position, journal)), _) => {
                    println!(
                        "Journal current at {} (position {}):",
                        format_time(timestamp),
                        position
                    );
                    print_table(std::slice::from_ref(&journal));
                }
                (None, _) => {
                    eprintln!("No journal exists at or before {}", format_time(timestamp));
                    std::process::exit(1);
                }
            }

            manager.shutdown()?;
        }

        Commands::Create { dir, time } => {
            if let Some(dir) = dir {
                config.journal.dir = dir.to_string_lossy().to_string();
            }

            let create_time = match time {
                Some(t) => parse_timestamp(&t)?,
                None => Utc::now().timestamp_millis(),
            };

            let manager = ResourceManager::open(&config).context("building journal index")?;
            let journal = manager.create_journal(create_time)?;
            println!("Created {} at {}", journal.file.display(), format_time(create_time));
            manager.shutdown()?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing config to {:?}", path))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("journal_index={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays machine-readable
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_timestamp(s: &str) -> anyhow::Result<i64> {
    if s == "now" {
        return Ok(Utc::now().timestamp_millis());
    }
    if let Ok(ts) = s.parse::<i64>() {
        return Ok(ts);
    }

    let dt = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid timestamp format: {}", s))?;
    Ok(dt.timestamp_millis())
}

fn format_time(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn print_table(journals: &[JournalDescriptor]) {
    println!(
        "{:<15} {:<26} {:<14} {:>12}  {}",
        "CREATE_TIME", "CREATED", "KIND", "SIZE", "FILE"
    );
    for journal in journals {
        println!(
            "{:<15} {:<26} {:<14} {:>12}  {}",
            journal.create_time,
            format_time(journal.create_time),
            journal.kind.to_string(),
            journal.size,
            journal.file.display()
        );
    }
}
