//! Output formatting for feedsieve
//!
//! Supports text (colored terminal) and JSON output formats.

use anyhow::Result;
use colored::*;
use feedsieve_feed::{Outcome, PassReport};
use feedsieve_rules::{RuleInfo, RuleIssue};
use feedsieve_store::Stats;
use serde::Serialize;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Pretty-print any serializable value as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Full JSON output of a filter pass
#[derive(Debug, Serialize)]
pub struct PassOutput<'a> {
    pub version: &'static str,
    pub site: &'a str,
    #[serde(flatten)]
    pub report: &'a PassReport,
}

/// Reporter for filter passes
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Print the outcome of one pass
    pub fn report_pass(&self, site: &str, report: &PassReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => print_json(&PassOutput {
                version: env!("CARGO_PKG_VERSION"),
                site,
                report,
            }),
            OutputFormat::Text => {
                for outcome in &report.outcomes {
                    match &outcome.outcome {
                        Outcome::Hidden { reason, .. } => println!(
                            "  {} {} {}",
                            "hide".red(),
                            outcome.label.bold(),
                            format!("({reason})").dimmed()
                        ),
                        Outcome::SeeFirst { reason, .. } => println!(
                            "  {} {} {}",
                            "first".green(),
                            outcome.label.bold(),
                            format!("({reason})").dimmed()
                        ),
                        Outcome::Shown if self.verbose => {
                            println!("  {} {}", "show".dimmed(), outcome.label)
                        }
                        Outcome::Shown => {}
                    }
                }

                println!();
                println!("{}", "Summary".bold().underline());
                println!("  Site: {}", site);
                println!("  Posts evaluated: {}", report.evaluated);
                println!("  Hidden: {}", report.hidden);
                println!("  Highlighted: {}", report.highlighted);
                Ok(())
            }
        }
    }
}

/// Print a rule listing
pub fn print_rules(format: OutputFormat, rules: &[RuleInfo]) -> Result<()> {
    if format == OutputFormat::Json {
        #[derive(Serialize)]
        struct Row<'a> {
            id: &'a str,
            name: &'a str,
            site: &'a str,
            action: &'a str,
            enabled: bool,
            conditions: usize,
        }
        let rows: Vec<Row> = rules
            .iter()
            .map(|r| Row {
                id: &r.id,
                name: &r.name,
                site: &r.site,
                action: &r.action,
                enabled: r.enabled,
                conditions: r.condition_count,
            })
            .collect();
        return print_json(&rows);
    }

    if rules.is_empty() {
        println!("{}", "No rules stored".dimmed());
        return Ok(());
    }

    for (index, rule) in rules.iter().enumerate() {
        let status = if rule.enabled {
            "on ".green()
        } else {
            "off".dimmed()
        };
        println!(
            "{:>3}. [{}] {} {} {}",
            index + 1,
            status,
            rule.name.bold(),
            format!("({})", rule.id).dimmed(),
            format!("site={} action={} conditions={}", rule.site, rule.action, rule.condition_count)
                .dimmed()
        );
    }
    Ok(())
}

/// Print validation issues; returns whether there were any
pub fn print_issues(format: OutputFormat, issues: &[RuleIssue]) -> Result<bool> {
    if format == OutputFormat::Json {
        let messages: Vec<String> = issues.iter().map(ToString::to_string).collect();
        print_json(&messages)?;
        return Ok(!issues.is_empty());
    }

    if issues.is_empty() {
        println!("{} All rules are valid", "OK".green());
        return Ok(false);
    }
    for issue in issues {
        println!("  {} {}", "!".yellow(), issue);
    }
    println!();
    println!("{} issue(s) found", issues.len());
    Ok(true)
}

pub fn print_stats(format: OutputFormat, stats: &Stats) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(stats);
    }
    println!("{}", "Filtered posts".bold().underline());
    println!("  Total: {}", stats.filtered_count);
    for (site, count) in &stats.sites {
        println!("  {}: {}", site, count);
    }
    Ok(())
}
