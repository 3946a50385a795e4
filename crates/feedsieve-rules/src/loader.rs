//! Rule loader
//!
//! Load rules from JSON or YAML files, directories, or strings. A document
//! may hold a single rule or a list of rules. Rules are returned in document
//! order, and directory contents in path order, since evaluation order
//! decides which rule wins.

use feedsieve_core::Rule;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validate::{validate_rule, Issue};

/// Errors that can occur when loading rules
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid rule '{name}': {issue}")]
    Validation { name: String, issue: Issue },
}

/// Serialization format of a rule document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Json,
    Yaml,
}

impl RuleFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<RuleFormat> {
        match path.extension()?.to_str()? {
            "json" => Some(RuleFormat::Json),
            "yaml" | "yml" => Some(RuleFormat::Yaml),
            _ => None,
        }
    }

    /// Guess the format from the document itself
    pub fn sniff(text: &str) -> RuleFormat {
        match text.trim_start().chars().next() {
            Some('{') | Some('[') => RuleFormat::Json,
            _ => RuleFormat::Yaml,
        }
    }
}

/// Load rules from a string, detecting JSON or YAML
pub fn load_rules_from_string(text: &str) -> Result<Vec<Rule>, LoadError> {
    load_rules_with_format(text, RuleFormat::sniff(text))
}

/// Load rules from a string in a known format
///
/// A top-level sequence is a list of rules, anything else a single rule.
pub fn load_rules_with_format(text: &str, format: RuleFormat) -> Result<Vec<Rule>, LoadError> {
    match format {
        RuleFormat::Json => {
            let document: serde_json::Value = serde_json::from_str(text)?;
            if document.is_array() {
                Ok(serde_json::from_value(document)?)
            } else {
                Ok(vec![serde_json::from_value(document)?])
            }
        }
        RuleFormat::Yaml => {
            let document: serde_yaml::Value = serde_yaml::from_str(text)?;
            if document.is_sequence() {
                Ok(serde_yaml::from_value(document)?)
            } else {
                Ok(vec![serde_yaml::from_value(document)?])
            }
        }
    }
}

/// Load rules from a file
pub fn load_rules_from_file(path: &Path) -> Result<Vec<Rule>, LoadError> {
    let content = fs::read_to_string(path)?;
    let format = RuleFormat::from_path(path).unwrap_or_else(|| RuleFormat::sniff(&content));
    load_rules_with_format(&content, format)
}

/// Load all rule files from a directory, recursively, in path order
///
/// Files that fail to parse are skipped with a warning.
pub fn load_rules_from_dir(dir: &Path) -> Result<Vec<Rule>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    collect_rule_files(dir, &mut files)?;
    files.sort();

    let mut all_rules = Vec::new();
    for path in files {
        match load_rules_from_file(&path) {
            Ok(loaded) => all_rules.extend(loaded),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load rule file");
            }
        }
    }

    Ok(all_rules)
}

fn collect_rule_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_rule_files(&path, files)?;
        } else if RuleFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    Ok(())
}

/// Parse and validate a rule document without keeping it
///
/// Reference issues are judged against the document's own rules.
pub fn validate_rule_string(text: &str) -> Result<(), LoadError> {
    let rules = load_rules_from_string(text)?;
    for rule in &rules {
        if let Some(issue) = validate_rule(rule, &rules).into_iter().next() {
            return Err(LoadError::Validation {
                name: rule.name.clone(),
                issue,
            });
        }
    }
    Ok(())
}

/// Summary of a rule, for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInfo {
    pub id: String,
    pub name: String,
    pub site: String,
    pub action: String,
    pub enabled: bool,
    pub condition_count: usize,
}

impl From<&Rule> for RuleInfo {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            site: rule.site.clone(),
            action: rule.action.to_string(),
            enabled: rule.enabled,
            condition_count: rule.conditions.len(),
        }
    }
}

/// Get information about rules in a file
pub fn get_rule_info(path: &Path) -> Result<Vec<RuleInfo>, LoadError> {
    let rules = load_rules_from_file(path)?;
    Ok(rules.iter().map(RuleInfo::from).collect())
}
