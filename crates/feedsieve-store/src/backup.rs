//! Bulk backups and single-rule exchange files
//!
//! A backup carries every store section under its storage key:
//!
//! ```json
//! {
//!   "version": "1.2.1",
//!   "timestamp": "2024-05-01T10:00:00.000Z",
//!   "cf_rules": [ ... ],
//!   "cf_settings": { ... },
//!   "cf_stats": { ... }
//! }
//! ```
//!
//! Restoring overwrites each section that is present and leaves absent
//! sections alone. A single-rule file is just the rule object.

use chrono::{DateTime, Utc};
use feedsieve_core::Rule;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::blob::BlobStore;
use crate::error::StoreError;
use crate::id::generate_id;
use crate::settings::{Settings, Stats};
use crate::store::RuleStore;

/// Format version written into new backups
pub const BACKUP_VERSION: &str = "1.2.1";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Invalid backup file: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid rule format: {0}")]
    InvalidRule(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Snapshot of a whole store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "cf_rules", alias = "rules", default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(rename = "cf_settings", alias = "settings", default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(rename = "cf_stats", alias = "stats", default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

/// Which sections a restore overwrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub rules: Option<usize>,
    pub settings: bool,
    pub stats: bool,
}

/// Capture everything in the store
pub fn export_backup<B: BlobStore>(store: &RuleStore<B>) -> Result<Backup, StoreError> {
    Ok(Backup {
        version: BACKUP_VERSION.to_string(),
        timestamp: Some(Utc::now()),
        rules: Some(store.rules()?),
        settings: Some(store.settings()?),
        stats: Some(store.stats()?),
    })
}

pub fn parse_backup(text: &str) -> Result<Backup, BackupError> {
    serde_json::from_str(text).map_err(BackupError::Parse)
}

/// Overwrite the store sections present in `backup`
pub fn restore_backup<B: BlobStore>(
    store: &mut RuleStore<B>,
    backup: &Backup,
) -> Result<RestoreSummary, StoreError> {
    let mut summary = RestoreSummary::default();

    if let Some(rules) = &backup.rules {
        store.save_rules(rules)?;
        summary.rules = Some(rules.len());
    }
    if let Some(settings) = &backup.settings {
        store.save_settings(settings)?;
        summary.settings = true;
    }
    if let Some(stats) = &backup.stats {
        store.save_stats(stats)?;
        summary.stats = true;
    }

    tracing::info!(
        version = %backup.version,
        rules = ?summary.rules,
        settings = summary.settings,
        stats = summary.stats,
        "backup restored"
    );
    Ok(summary)
}

/// File name for a backup taken at `at`
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("feedsieve-backup-{}.json", at.format("%Y-%m-%d"))
}

/// File name a single exported rule is saved under
pub fn rule_file_name(rule: &Rule) -> String {
    let slug = rule
        .name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    format!("rule-{slug}.json")
}

pub fn export_rule_json(rule: &Rule) -> Result<String, BackupError> {
    serde_json::to_string_pretty(rule).map_err(|source| {
        BackupError::Store(StoreError::Encode {
            key: rule.id.clone(),
            source,
        })
    })
}

/// Parse a single-rule file for import
///
/// The rule must have a non-empty `name` and a `conditions` array. It
/// always gets a fresh id so it cannot collide with an existing rule.
pub fn parse_rule_import(text: &str) -> Result<Rule, BackupError> {
    let value: Value = serde_json::from_str(text).map_err(BackupError::Parse)?;

    let has_name = value
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !has_name {
        return Err(BackupError::InvalidRule("missing name".to_string()));
    }
    if !value.get("conditions").is_some_and(Value::is_array) {
        return Err(BackupError::InvalidRule("missing conditions".to_string()));
    }

    let mut rule: Rule = serde_json::from_value(value).map_err(BackupError::Parse)?;
    rule.id = generate_id();
    Ok(rule)
}

/// Import a single-rule file and append it to the store
pub fn import_rule<B: BlobStore>(store: &mut RuleStore<B>, text: &str) -> Result<Rule, BackupError> {
    let rule = parse_rule_import(text)?;
    store.add_rule(rule.clone())?;
    Ok(rule)
}
