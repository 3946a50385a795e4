//! Condition tree evaluation
//!
//! Evaluates leaf comparisons, nested groups and references to other rules
//! against a single post record. Nothing in here can fail: absent fields,
//! unknown operators, bad patterns and unresolvable or cyclic references all
//! evaluate to `false`.

use feedsieve_core::{Condition, FieldCondition, Logic, PostRecord, Rule};
use std::collections::HashSet;

use crate::matcher::{matches_with, PatternCache};

/// Ids of the rules on the current reference path
pub type Visited<'r> = HashSet<&'r str>;

/// Identity of a rule on the reference path; rules without an id go by name
fn path_key(rule: &Rule) -> &str {
    if rule.id.is_empty() {
        &rule.name
    } else {
        &rule.id
    }
}

/// Evaluates condition trees with access to the whole rule set for references
pub struct Evaluator<'r> {
    rules: &'r [Rule],
    patterns: &'r PatternCache,
}

impl<'r> Evaluator<'r> {
    pub fn new(rules: &'r [Rule], patterns: &'r PatternCache) -> Self {
        Self { rules, patterns }
    }

    /// Resolve a reference by id first, then by name
    pub fn resolve(&self, target: &str) -> Option<&'r Rule> {
        self.rules
            .iter()
            .find(|rule| rule.id == target)
            .or_else(|| self.rules.iter().find(|rule| rule.name == target))
    }

    /// Evaluate a rule's top-level conditions with the rule already on the path
    pub fn evaluate_rule(&self, rule: &'r Rule, record: &PostRecord) -> bool {
        let mut visited = Visited::new();
        visited.insert(path_key(rule));
        self.evaluate_all(rule.condition_logic, &rule.conditions, record, &mut visited)
    }

    /// Combine a condition list. Empty lists never match under either logic.
    pub fn evaluate_all(
        &self,
        logic: Logic,
        conditions: &'r [Condition],
        record: &PostRecord,
        visited: &mut Visited<'r>,
    ) -> bool {
        if conditions.is_empty() {
            return false;
        }
        match logic {
            Logic::And => conditions
                .iter()
                .all(|condition| self.evaluate(condition, record, visited)),
            Logic::Or => conditions
                .iter()
                .any(|condition| self.evaluate(condition, record, visited)),
        }
    }

    /// Evaluate one condition node
    pub fn evaluate(
        &self,
        condition: &'r Condition,
        record: &PostRecord,
        visited: &mut Visited<'r>,
    ) -> bool {
        match condition {
            Condition::Field(leaf) => self.evaluate_field(leaf, record),
            Condition::Group(group) => {
                self.evaluate_all(group.logic, &group.conditions, record, visited)
            }
            Condition::RuleRef(target) => self.evaluate_reference(target, record, visited),
        }
    }

    fn evaluate_field(&self, leaf: &FieldCondition, record: &PostRecord) -> bool {
        let Some(post_value) = record.get(&leaf.field) else {
            tracing::trace!(field = %leaf.field, "field absent, skipping comparison");
            return false;
        };

        let result = matches_with(&leaf.operator, post_value, &leaf.value, self.patterns);
        tracing::trace!(
            field = %leaf.field,
            operator = %leaf.operator,
            value = ?leaf.value,
            result,
            "compared field"
        );
        result
    }

    /// A referenced rule is used purely as a boolean fragment: its own
    /// `enabled` flag and `site` are not consulted.
    fn evaluate_reference(
        &self,
        target: &str,
        record: &PostRecord,
        visited: &mut Visited<'r>,
    ) -> bool {
        let Some(rule) = self.resolve(target) else {
            tracing::warn!(reference = target, "rule reference does not resolve to any rule");
            return false;
        };

        if !visited.insert(path_key(rule)) {
            tracing::warn!(reference = target, rule_id = %rule.id, "circular rule reference, treating as no match");
            return false;
        }

        let result = self.evaluate_all(rule.condition_logic, &rule.conditions, record, visited);
        visited.remove(path_key(rule));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsieve_core::{field, Operator};

    fn eval(rules: &[Rule], rule_index: usize, record: &PostRecord) -> bool {
        let patterns = PatternCache::for_rules(rules);
        Evaluator::new(rules, &patterns).evaluate_rule(&rules[rule_index], record)
    }

    #[test]
    fn test_empty_lists_never_match() {
        let and_rule = Rule::new("1", "and", vec![]);
        let or_rule = Rule::new("2", "or", vec![]).with_logic(Logic::Or);
        let record = PostRecord::new("linkedin").with(field::CONTENT, "anything");

        assert!(!eval(&[and_rule], 0, &record));
        assert!(!eval(&[or_rule], 0, &record));
    }

    #[test]
    fn test_empty_group_never_matches() {
        let rule = Rule::new(
            "1",
            "group",
            vec![Condition::group(Logic::Or, vec![])],
        )
        .with_logic(Logic::Or);
        assert!(!eval(&[rule], 0, &PostRecord::new("x").with(field::AUTHOR, "a")));
    }

    #[test]
    fn test_absent_field_is_false_for_every_operator() {
        let record = PostRecord::new("linkedin").with(field::AUTHOR, "");
        for op in Operator::ALL {
            // not_equal / not_contains would be true for an empty string if compared
            let rule = Rule::new("1", "r", vec![Condition::field(field::AUTHOR, op, "John")]);
            assert!(!eval(&[rule], 0, &record));
        }
    }

    #[test]
    fn test_and_or_logic() {
        let conditions = vec![
            Condition::field(field::AUTHOR, Operator::Equals, "Ahmed"),
            Condition::field(field::CONTENT, Operator::Contains, "crypto"),
        ];
        let and_rule = Rule::new("1", "and", conditions.clone());
        let or_rule = Rule::new("2", "or", conditions).with_logic(Logic::Or);

        let both = PostRecord::new("x")
            .with(field::AUTHOR, "Ahmed")
            .with(field::CONTENT, "crypto news");
        let one = PostRecord::new("x")
            .with(field::AUTHOR, "Ahmed")
            .with(field::CONTENT, "cat pictures");

        assert!(eval(&[and_rule.clone()], 0, &both));
        assert!(!eval(&[and_rule], 0, &one));
        assert!(eval(&[or_rule.clone()], 0, &one));
        assert!(!eval(&[or_rule], 0, &PostRecord::new("x").with(field::AUTHOR, "Jane")));
    }

    #[test]
    fn test_reference_ignores_target_enabled_and_site() {
        let template = Rule::new(
            "tpl",
            "Recruiter template",
            vec![Condition::field(field::LINKEDIN_JOB_TITLE, Operator::Contains, "recruiter")],
        )
        .with_enabled(false)
        .with_site("facebook");
        let user = Rule::new("use", "Uses template", vec![Condition::rule_ref("Recruiter template")]);
        let rules = vec![template, user];

        let record = PostRecord::new("linkedin").with(field::LINKEDIN_JOB_TITLE, "Tech Recruiter");
        assert!(eval(&rules, 1, &record));
    }

    #[test]
    fn test_reference_resolves_id_before_name() {
        let by_name = Rule::new(
            "a",
            "target",
            vec![Condition::field(field::AUTHOR, Operator::Equals, "nobody")],
        );
        let by_id = Rule::new(
            "target",
            "other",
            vec![Condition::field(field::AUTHOR, Operator::Equals, "Ahmed")],
        );
        let referrer = Rule::new("r", "referrer", vec![Condition::rule_ref("target")]);
        let rules = vec![by_name, by_id, referrer];

        let record = PostRecord::new("x").with(field::AUTHOR, "Ahmed");
        assert!(eval(&rules, 2, &record));
    }

    #[test]
    fn test_unresolved_reference_is_false() {
        let rule = Rule::new("1", "dangling", vec![Condition::rule_ref("missing")]);
        assert!(!eval(&[rule], 0, &PostRecord::new("x").with(field::AUTHOR, "a")));
    }

    #[test]
    fn test_self_reference_is_false() {
        let rule = Rule::new(
            "self",
            "Self",
            vec![Condition::rule_ref("self")],
        );
        assert!(!eval(&[rule], 0, &PostRecord::new("x").with(field::AUTHOR, "a")));
    }

    #[test]
    fn test_deep_cycle_terminates() {
        let rules: Vec<Rule> = (0..3)
            .map(|i| {
                Rule::new(
                    format!("r{i}"),
                    format!("Rule {i}"),
                    vec![Condition::rule_ref(format!("r{}", (i + 1) % 3))],
                )
            })
            .collect();
        let record = PostRecord::new("x").with(field::AUTHOR, "a");
        for i in 0..3 {
            assert!(!eval(&rules, i, &record));
        }
    }

    #[test]
    fn test_same_rule_referenced_twice_is_not_a_cycle() {
        let ahmed = Rule::new(
            "ahmed",
            "Ahmed",
            vec![Condition::field(field::AUTHOR, Operator::Equals, "Ahmed")],
        );
        let twice = Rule::new(
            "twice",
            "Twice",
            vec![
                Condition::rule_ref("ahmed"),
                Condition::group(Logic::And, vec![Condition::rule_ref("Ahmed")]),
            ],
        );
        let rules = vec![ahmed, twice];
        assert!(eval(&rules, 1, &PostRecord::new("x").with(field::AUTHOR, "Ahmed")));
    }

    #[test]
    fn test_rules_without_ids_compose_by_name() {
        let ahmed = Rule::new(
            "",
            "Ahmed",
            vec![Condition::field(field::AUTHOR, Operator::Equals, "Ahmed")],
        );
        let referrer = Rule::new("", "Referrer", vec![Condition::rule_ref("Ahmed")]);
        let rules = vec![ahmed, referrer];
        assert!(eval(&rules, 1, &PostRecord::new("x").with(field::AUTHOR, "Ahmed")));
    }
}
