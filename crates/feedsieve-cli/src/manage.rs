//! Rule, settings, stats and backup management commands

use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use colored::*;
use feedsieve_core::Rule;
use feedsieve_rules::{load_rules_from_file, validate_rule, validate_rule_set, RuleInfo, RuleIssue};
use feedsieve_store::backup::{self, Backup};
use feedsieve_store::Settings;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::output::{print_issues, print_json, print_rules, print_stats, OutputFormat};
use crate::Context;

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List stored rules in evaluation order
    List,

    /// Print one rule as JSON
    Show {
        /// Rule id or name
        rule: String,
    },

    /// Add every rule from a JSON or YAML file
    Add {
        file: PathBuf,

        /// Store rules even if validation reports issues
        #[arg(long)]
        force: bool,
    },

    /// Delete a rule
    Remove {
        /// Rule id or name
        rule: String,
    },

    /// Enable a rule
    Enable {
        /// Rule id or name
        rule: String,
    },

    /// Disable a rule
    Disable {
        /// Rule id or name
        rule: String,
    },

    /// Check stored rules, or the rules in a file, for configuration errors
    Validate { file: Option<PathBuf> },

    /// Write one rule to a file named after it
    Export {
        /// Rule id or name
        rule: String,

        /// Directory to write into
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,
    },

    /// Import a single exported rule under a fresh id
    Import { file: PathBuf },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the current settings
    Show,

    /// Change one setting (enabled, theme, hidePromoted, hideFeedUpdates, ...)
    Set { key: String, value: String },
}

#[derive(Subcommand)]
pub enum StatsCommand {
    /// Show hidden-post counts
    Show,

    /// Zero every counter
    Reset,
}

#[derive(Subcommand)]
pub enum BackupCommand {
    /// Write rules, settings and stats to a backup file
    Export {
        /// Output file (default: feedsieve-backup-<date>.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Overwrite the store with the contents of a backup file
    Import {
        file: PathBuf,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn find_rule(ctx: &Context, key: &str) -> Result<Rule> {
    ctx.store
        .find_rule(key)?
        .with_context(|| format!("No rule with id or name '{}'", key))
}

pub fn run_rules(ctx: &mut Context, command: RulesCommand) -> Result<ExitCode> {
    match command {
        RulesCommand::List => {
            let rules = ctx.store.rules()?;
            let infos: Vec<RuleInfo> = rules.iter().map(RuleInfo::from).collect();
            print_rules(ctx.format, &infos)?;
        }
        RulesCommand::Show { rule } => {
            print_json(&find_rule(ctx, &rule)?)?;
        }
        RulesCommand::Add { file, force } => add_rules(ctx, &file, force)?,
        RulesCommand::Remove { rule } => {
            let rule = find_rule(ctx, &rule)?;
            ctx.store.delete_rule(&rule.id)?;
            println!("{} Removed rule '{}'", "OK".green(), rule.name);
        }
        RulesCommand::Enable { rule } => set_enabled(ctx, &rule, true)?,
        RulesCommand::Disable { rule } => set_enabled(ctx, &rule, false)?,
        RulesCommand::Validate { file } => {
            let rules = match &file {
                Some(path) => load_rules_from_file(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => ctx.store.rules()?,
            };
            if print_issues(ctx.format, &validate_rule_set(&rules))? {
                return Ok(ExitCode::from(1));
            }
        }
        RulesCommand::Export { rule, output } => {
            let rule = find_rule(ctx, &rule)?;
            let path = output.join(backup::rule_file_name(&rule));
            std::fs::write(&path, backup::export_rule_json(&rule)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Exported '{}' to {}", "OK".green(), rule.name, path.display());
        }
        RulesCommand::Import { file } => {
            let rule = backup::import_rule(&mut ctx.store, &read_file(&file)?)
                .with_context(|| format!("Failed to import rule from {}", file.display()))?;
            println!(
                "{} Rule '{}' imported as {}",
                "OK".green(),
                rule.name,
                rule.id.dimmed()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Validate new rules against the stored set and append them
fn add_rules(ctx: &mut Context, file: &Path, force: bool) -> Result<()> {
    let new_rules = load_rules_from_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    if new_rules.is_empty() {
        bail!("No rules found in {}", file.display());
    }

    let mut combined = ctx.store.rules()?;
    combined.extend(new_rules.iter().cloned());

    let issues: Vec<RuleIssue> = new_rules
        .iter()
        .flat_map(|rule| {
            validate_rule(rule, &combined)
                .into_iter()
                .map(move |issue| RuleIssue {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    issue,
                })
        })
        .collect();

    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("  {} {}", "!".yellow(), issue);
        }
        if !force {
            bail!("{} validation issue(s); use --force to add anyway", issues.len());
        }
    }

    for rule in new_rules {
        let name = rule.name.clone();
        let id = ctx.store.add_rule(rule)?;
        println!("{} Added rule '{}' {}", "OK".green(), name, id.dimmed());
    }
    Ok(())
}

fn set_enabled(ctx: &mut Context, key: &str, enabled: bool) -> Result<()> {
    let rule = find_rule(ctx, key)?;
    let name = rule.name.clone();
    ctx.store.update_rule(rule.with_enabled(enabled))?;
    let state = if enabled { "Enabled" } else { "Disabled" };
    println!("{} {} rule '{}'", "OK".green(), state, name);
    Ok(())
}

pub fn run_settings(ctx: &mut Context, command: SettingsCommand) -> Result<ExitCode> {
    match command {
        SettingsCommand::Show => {
            let settings = ctx.store.settings()?;
            if ctx.format == OutputFormat::Json {
                print_json(&settings)?;
            } else {
                let value = serde_json::to_value(&settings)?;
                if let Value::Object(fields) = value {
                    for (key, value) in fields {
                        println!("  {}: {}", key.bold(), value);
                    }
                }
            }
        }
        SettingsCommand::Set { key, value } => {
            let mut settings = ctx.store.settings()?;
            apply_setting(&mut settings, &key, &value)?;
            ctx.store.save_settings(&settings)?;
            println!("{} {} = {}", "OK".green(), key, value);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("Setting '{}' expects true or false, got '{}'", key, value),
    }
}

/// Change one setting by its stored (camelCase) or snake_case name
pub fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "enabled" => settings.enabled = parse_bool(key, value)?,
        "theme" => settings.theme = value.to_string(),
        "hidePromoted" | "hide_promoted" => settings.hide_promoted = parse_bool(key, value)?,
        "hideFeedUpdates" | "hide_feed_updates" => {
            settings.hide_feed_updates = parse_bool(key, value)?
        }
        _ => {
            let parsed =
                serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
            settings.other.insert(key.to_string(), parsed);
        }
    }
    Ok(())
}

pub fn run_stats(ctx: &mut Context, command: StatsCommand) -> Result<ExitCode> {
    match command {
        StatsCommand::Show => print_stats(ctx.format, &ctx.store.stats()?)?,
        StatsCommand::Reset => {
            ctx.store.reset_stats()?;
            println!("{} Statistics reset", "OK".green());
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_backup(ctx: &mut Context, command: BackupCommand) -> Result<ExitCode> {
    match command {
        BackupCommand::Export { output } => {
            let backup = backup::export_backup(&ctx.store)?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(backup::backup_file_name(
                    backup.timestamp.unwrap_or_else(chrono::Utc::now),
                ))
            });
            std::fs::write(&path, serde_json::to_string_pretty(&backup)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Backup written to {}", "OK".green(), path.display());
        }
        BackupCommand::Import { file, yes } => {
            let backup = backup::parse_backup(&read_file(&file)?)
                .with_context(|| format!("Failed to restore {}", file.display()))?;
            if !yes && !confirm_restore(&backup)? {
                println!("Aborted");
                return Ok(ExitCode::SUCCESS);
            }
            let summary = backup::restore_backup(&mut ctx.store, &backup)?;
            println!(
                "{} Backup restored ({} rule(s), settings: {}, stats: {})",
                "OK".green(),
                summary.rules.unwrap_or(0),
                if summary.settings { "yes" } else { "no" },
                if summary.stats { "yes" } else { "no" },
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn confirm_restore(backup: &Backup) -> Result<bool> {
    let rules = backup.rules.as_ref().map_or(0, Vec::len);
    print!(
        "This will overwrite your current rules and settings with {} rule(s) from a {} backup. Continue? [y/N] ",
        rules,
        if backup.version.is_empty() { "unversioned" } else { backup.version.as_str() }
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
