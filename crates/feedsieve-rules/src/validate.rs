//! Rule validation
//!
//! Catches configuration mistakes when a rule is saved or imported, before
//! they silently turn into non-matching conditions at evaluation time. The
//! engine keeps its runtime fallbacks either way, so rules that were stored
//! before validation existed still evaluate safely.

use feedsieve_core::{Condition, ConditionValue, Operator, Rule};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::matcher::{compile_pattern, list_items};

/// A problem found in a rule definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    #[error("rule has no name")]
    MissingName,

    #[error("rule has no conditions and can never match")]
    NoConditions,

    #[error("condition group at {path} is empty and can never match")]
    EmptyGroup { path: String },

    #[error("condition at {path} has no field name")]
    MissingField { path: String },

    #[error("condition at {path} uses unknown operator '{operator}'")]
    UnknownOperator { path: String, operator: String },

    #[error("condition at {path} has an invalid regular expression: {error}")]
    InvalidPattern { path: String, error: String },

    #[error("condition at {path} uses in_list without any list items")]
    EmptyList { path: String },

    #[error("condition at {path} uses in_list with a single value instead of a list")]
    ExpectedList { path: String },

    #[error("condition at {path} uses '{operator}' with a list value")]
    UnexpectedList { path: String, operator: String },

    #[error("condition at {path} references unknown rule '{target}'")]
    UnresolvedReference { path: String, target: String },

    #[error("condition at {path} references the rule itself")]
    SelfReference { path: String },

    #[error("rule id '{id}' is used by more than one rule")]
    DuplicateId { id: String },

    #[error("rule references form a cycle: {}", cycle.join(" -> "))]
    ReferenceCycle { cycle: Vec<String> },
}

/// An issue attributed to a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    pub rule_id: String,
    pub rule_name: String,
    pub issue: Issue,
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.rule_name, self.rule_id, self.issue)
    }
}

/// Validate one rule against the rule set it will live in
pub fn validate_rule(rule: &Rule, all_rules: &[Rule]) -> Vec<Issue> {
    let mut issues = Vec::new();

    if rule.name.trim().is_empty() {
        issues.push(Issue::MissingName);
    }
    if rule.conditions.is_empty() {
        issues.push(Issue::NoConditions);
    }

    check_conditions(rule, &rule.conditions, "conditions", all_rules, &mut issues);
    issues
}

fn check_conditions(
    rule: &Rule,
    conditions: &[Condition],
    prefix: &str,
    all_rules: &[Rule],
    issues: &mut Vec<Issue>,
) {
    for (index, condition) in conditions.iter().enumerate() {
        let path = format!("{prefix}[{index}]");
        match condition {
            Condition::Field(leaf) => {
                if leaf.field.trim().is_empty() {
                    issues.push(Issue::MissingField { path: path.clone() });
                }
                match (&leaf.operator, &leaf.value) {
                    (Operator::Unknown(name), _) => issues.push(Issue::UnknownOperator {
                        path,
                        operator: name.clone(),
                    }),
                    (Operator::InList, ConditionValue::List(items)) => {
                        if list_items(items).next().is_none() {
                            issues.push(Issue::EmptyList { path });
                        }
                    }
                    (Operator::InList, ConditionValue::Text(_)) => {
                        issues.push(Issue::ExpectedList { path })
                    }
                    (operator, ConditionValue::List(_)) => issues.push(Issue::UnexpectedList {
                        path,
                        operator: operator.to_string(),
                    }),
                    (Operator::Matches, ConditionValue::Text(pattern)) => {
                        if let Err(e) = compile_pattern(pattern) {
                            issues.push(Issue::InvalidPattern {
                                path,
                                error: e.to_string(),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Condition::Group(group) => {
                if group.conditions.is_empty() {
                    issues.push(Issue::EmptyGroup { path: path.clone() });
                }
                let nested = format!("{path}.conditions");
                check_conditions(rule, &group.conditions, &nested, all_rules, issues);
            }
            Condition::RuleRef(target) => {
                if rule.is_named(target) {
                    issues.push(Issue::SelfReference { path });
                } else if resolve(all_rules, target).is_none() {
                    issues.push(Issue::UnresolvedReference {
                        path,
                        target: target.clone(),
                    });
                }
            }
        }
    }
}

/// Validate a whole rule set: every rule, duplicate ids, and reference cycles
pub fn validate_rule_set(rules: &[Rule]) -> Vec<RuleIssue> {
    let mut found = Vec::new();
    let attribute = |rule: &Rule, issue: Issue| RuleIssue {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        issue,
    };

    let mut seen_ids = HashSet::new();
    for rule in rules {
        if !seen_ids.insert(rule.id.as_str()) {
            found.push(attribute(rule, Issue::DuplicateId { id: rule.id.clone() }));
        }
        for issue in validate_rule(rule, rules) {
            found.push(attribute(rule, issue));
        }
    }

    for cycle in find_cycles(rules) {
        let first = &rules[cycle[0]];
        let names = cycle.iter().map(|&i| rules[i].name.clone()).collect();
        found.push(attribute(first, Issue::ReferenceCycle { cycle: names }));
    }

    found
}

/// Same lookup order as evaluation: id first, then name
fn resolve(rules: &[Rule], target: &str) -> Option<usize> {
    rules
        .iter()
        .position(|rule| rule.id == target)
        .or_else(|| rules.iter().position(|rule| rule.name == target))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Reference cycles of length two or more, as rule indices (first repeated last)
fn find_cycles(rules: &[Rule]) -> Vec<Vec<usize>> {
    let edges: HashMap<usize, Vec<usize>> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let targets = rule
                .referenced_rules()
                .into_iter()
                .filter_map(|target| resolve(rules, target))
                .filter(|&j| j != i)
                .collect();
            (i, targets)
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; rules.len()];
    let mut path = Vec::new();
    let mut cycles = Vec::new();

    for start in 0..rules.len() {
        if marks[start] == Mark::Unvisited {
            visit(start, &edges, &mut marks, &mut path, &mut cycles);
        }
    }
    cycles
}

fn visit(
    node: usize,
    edges: &HashMap<usize, Vec<usize>>,
    marks: &mut [Mark],
    path: &mut Vec<usize>,
    cycles: &mut Vec<Vec<usize>>,
) {
    marks[node] = Mark::OnPath;
    path.push(node);

    for &next in edges.get(&node).map(Vec::as_slice).unwrap_or_default() {
        match marks[next] {
            Mark::Unvisited => visit(next, edges, marks, path, cycles),
            Mark::OnPath => {
                if let Some(start) = path.iter().position(|&n| n == next) {
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    cycles.push(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    path.pop();
    marks[node] = Mark::Done;
}
