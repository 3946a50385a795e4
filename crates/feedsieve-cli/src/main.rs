//! feedsieve CLI - rule-based filtering for social media feeds
//!
//! Subcommands:
//! - filter: Run one filter pass over a saved page of posts
//! - rules: List, add, remove, toggle, validate, export and import rules
//! - settings: Show or change the global toggles
//! - stats: Show or reset the hidden-post counters
//! - backup: Export or restore the whole store
//! - watch: Re-run the filter pass whenever the posts or the store change

mod config;
mod filter;
mod manage;
mod output;
mod watch;

use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use config::Config;
use feedsieve_store::FileStore;
use filter::FilterArgs;
use manage::{BackupCommand, RulesCommand, SettingsCommand, StatsCommand};
use output::OutputFormat;
use watch::WatchArgs;

#[derive(Parser)]
#[command(name = "feedsieve")]
#[command(version)]
#[command(about = "Rule-based filtering for social media feeds")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Store file (default: from config, else the user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Output format: text, json
    #[arg(long, global = true, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, global = true, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .feedsieve.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, global = true)]
    no_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run one filter pass over a posts file
    Filter(FilterArgs),

    /// Manage stored rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Show or change global settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Show or reset filtering statistics
    Stats {
        #[command(subcommand)]
        command: StatsCommand,
    },

    /// Export or restore a full backup
    Backup {
        #[command(subcommand)]
        command: BackupCommand,
    },

    /// Re-run the filter pass when the posts file or the store changes
    Watch(WatchArgs),
}

/// State shared by every subcommand
pub struct Context {
    pub config: Config,
    pub store: FileStore,
    pub store_path: PathBuf,
    pub format: OutputFormat,
    pub verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `-v`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = if cli.no_config {
        Config::default()
    } else if let Some(config_path) = &cli.config {
        let cfg = Config::load_path(config_path)?;
        tracing::info!(path = %config_path.display(), "using config");
        cfg
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                tracing::info!(path = %path.display(), "using config");
                cfg
            }
            None => Config::default(),
        }
    };

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        let name = cli
            .format
            .as_deref()
            .or(config.output.format.as_deref())
            .unwrap_or("text");
        OutputFormat::from_str(name).ok_or_else(|| {
            anyhow::anyhow!("Invalid output format '{}'. Valid options: text, json", name)
        })?
    };

    let store_path = config
        .store_path(cli.store.as_deref())
        .context("Failed to locate the store")?;
    tracing::debug!(path = %store_path.display(), "using store");

    let mut ctx = Context {
        store: FileStore::open(&store_path),
        store_path,
        config,
        format,
        verbose: cli.verbose > 0,
    };

    match cli.command {
        Command::Filter(args) => filter::run_filter(&mut ctx, &args),
        Command::Rules { command } => manage::run_rules(&mut ctx, command),
        Command::Settings { command } => manage::run_settings(&mut ctx, command),
        Command::Stats { command } => manage::run_stats(&mut ctx, command),
        Command::Backup { command } => manage::run_backup(&mut ctx, command),
        Command::Watch(args) => {
            watch::run_watch(&mut ctx, &args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
