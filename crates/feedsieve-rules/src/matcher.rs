//! Operator implementations
//!
//! Every operator is a total function over two strings: it always returns a
//! boolean and never panics. Configuration problems (unknown operator, a
//! pattern that does not compile, a list given to a scalar operator, a single
//! string given to `in_list`) make the comparison fail and are logged as warnings.

use feedsieve_core::{Condition, ConditionValue, Operator, Rule};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

/// Upper bound on compiled pattern size, keeps hostile patterns cheap to reject
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Compile a `matches` pattern the way rules expect it: case-insensitive
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

/// Compiled `matches` patterns for one rule snapshot
///
/// Patterns that fail to compile are remembered as failures so each one is
/// reported once per snapshot instead of once per post.
#[derive(Debug, Default, Clone)]
pub struct PatternCache {
    patterns: HashMap<String, Option<Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precompile every `matches` pattern found in the rules
    pub fn for_rules(rules: &[Rule]) -> Self {
        let mut cache = Self::new();
        for rule in rules {
            cache.collect(&rule.conditions);
        }
        cache
    }

    fn collect(&mut self, conditions: &[Condition]) {
        for condition in conditions {
            match condition {
                Condition::Field(leaf) if leaf.operator == Operator::Matches => {
                    if let ConditionValue::Text(pattern) = &leaf.value {
                        self.insert(pattern);
                    }
                }
                Condition::Group(group) => self.collect(&group.conditions),
                _ => {}
            }
        }
    }

    fn insert(&mut self, pattern: &str) {
        if self.patterns.contains_key(pattern) {
            return;
        }
        let compiled = match compile_pattern(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "invalid regular expression, condition will never match");
                None
            }
        };
        self.patterns.insert(pattern.to_string(), compiled);
    }

    /// Number of distinct patterns seen
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Look up a pattern, compiling it on the spot if it was not precompiled
    fn regex(&self, pattern: &str) -> Option<Regex> {
        match self.patterns.get(pattern) {
            Some(compiled) => compiled.clone(),
            None => match compile_pattern(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "invalid regular expression, condition will never match");
                    None
                }
            },
        }
    }
}

/// Apply `operator` to a post value and a rule value
pub fn matches(operator: &Operator, post_value: &str, rule_value: &ConditionValue) -> bool {
    matches_with(operator, post_value, rule_value, &PatternCache::new())
}

/// Like [`matches`], reusing patterns compiled for the current rule snapshot
pub fn matches_with(
    operator: &Operator,
    post_value: &str,
    rule_value: &ConditionValue,
    patterns: &PatternCache,
) -> bool {
    if operator.takes_list() {
        return in_list(post_value, rule_value);
    }

    let target = match rule_value {
        ConditionValue::Text(target) => target.as_str(),
        ConditionValue::List(_) => {
            tracing::warn!(operator = %operator, "operator expects a single value, got a list");
            return false;
        }
    };

    match operator {
        Operator::Equals => post_value.to_lowercase() == target.to_lowercase(),
        Operator::Contains => post_value.to_lowercase().contains(&target.to_lowercase()),
        Operator::StartsWith => post_value.to_lowercase().starts_with(&target.to_lowercase()),
        Operator::EndsWith => post_value.to_lowercase().ends_with(&target.to_lowercase()),
        Operator::ContainsExactly => post_value.contains(target),
        Operator::StartsWithExactly => post_value.starts_with(target),
        Operator::EndsWithExactly => post_value.ends_with(target),
        Operator::NotEqual => post_value.to_lowercase() != target.to_lowercase(),
        Operator::NotContains => !post_value.to_lowercase().contains(&target.to_lowercase()),
        Operator::Matches => patterns
            .regex(target)
            .is_some_and(|regex| regex.is_match(post_value)),
        Operator::InList => in_list(post_value, rule_value),
        Operator::Unknown(name) => {
            tracing::warn!(operator = %name, "unknown operator, condition will never match");
            false
        }
    }
}

/// True if the post value contains any list element, ignoring case
fn in_list(post_value: &str, rule_value: &ConditionValue) -> bool {
    let ConditionValue::List(items) = rule_value else {
        tracing::warn!("in_list expects a list value, got a single string");
        return false;
    };
    let haystack = post_value.to_lowercase();
    list_items(items).any(|item| haystack.contains(&item.to_lowercase()))
}

/// Non-empty, trimmed elements of a list value
pub fn list_items(items: &[String]) -> impl Iterator<Item = &str> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
}
