//! First-match rule selection
//!
//! The engine walks an ordered rule snapshot and returns the first enabled
//! rule, applicable to the post's site, whose conditions hold. Rules are
//! checked strictly in list order; the engine never reorders them.

use feedsieve_core::{PostRecord, Rule};
use rayon::prelude::*;

use crate::evaluator::Evaluator;
use crate::matcher::PatternCache;

/// Return the first rule matching the record, if any
///
/// Convenience wrapper that compiles the snapshot's patterns for a single
/// call. Use [`RuleEngine`] when evaluating many posts against one snapshot.
pub fn evaluate<'r>(rules: &'r [Rule], record: &PostRecord) -> Option<&'r Rule> {
    RuleEngine::new(rules).evaluate(record)
}

/// A rule snapshot prepared for evaluation
pub struct RuleEngine<'r> {
    rules: &'r [Rule],
    patterns: PatternCache,
}

impl<'r> RuleEngine<'r> {
    /// Prepare a snapshot. Regular expressions are compiled once here.
    pub fn new(rules: &'r [Rule]) -> Self {
        Self {
            rules,
            patterns: PatternCache::for_rules(rules),
        }
    }

    pub fn rules(&self) -> &'r [Rule] {
        self.rules
    }

    /// Return the first enabled, site-applicable rule whose conditions hold
    pub fn evaluate(&self, record: &PostRecord) -> Option<&'r Rule> {
        let evaluator = Evaluator::new(self.rules, &self.patterns);

        for rule in self.rules {
            if !rule.enabled {
                continue;
            }
            if !rule.applies_to_site(record.site()) {
                continue;
            }
            if evaluator.evaluate_rule(rule, record) {
                tracing::debug!(rule = %rule.name, rule_id = %rule.id, post = %record.label(), "rule matched");
                return Some(rule);
            }
        }

        None
    }

    /// Evaluate independent records in parallel. Results keep input order.
    pub fn evaluate_batch(&self, records: &[PostRecord]) -> Vec<Option<&'r Rule>> {
        records
            .par_iter()
            .map(|record| self.evaluate(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsieve_core::{field, Condition, Operator};

    fn crypto_rule(id: &str) -> Rule {
        Rule::new(
            id,
            format!("Crypto {id}"),
            vec![Condition::field(field::CONTENT, Operator::Contains, "crypto")],
        )
    }

    #[test]
    fn test_empty_rule_list() {
        let record = PostRecord::new("linkedin").with(field::CONTENT, "crypto");
        assert!(evaluate(&[], &record).is_none());
    }

    #[test]
    fn test_disabled_rule_never_matches() {
        let rules = vec![crypto_rule("1").with_enabled(false)];
        let record = PostRecord::new("linkedin").with(field::CONTENT, "crypto");
        assert!(evaluate(&rules, &record).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![crypto_rule("a"), crypto_rule("b")];
        let record = PostRecord::new("linkedin").with(field::CONTENT, "crypto");
        assert_eq!(evaluate(&rules, &record).map(|r| r.id.as_str()), Some("a"));

        let swapped = vec![crypto_rule("b"), crypto_rule("a")];
        assert_eq!(evaluate(&swapped, &record).map(|r| r.id.as_str()), Some("b"));
    }

    #[test]
    fn test_site_gate() {
        let rules = vec![crypto_rule("fb").with_site("facebook")];
        let linkedin = PostRecord::new("linkedin").with(field::CONTENT, "crypto");
        let facebook = PostRecord::new("facebook").with(field::CONTENT, "crypto");

        assert!(evaluate(&rules, &linkedin).is_none());
        assert!(evaluate(&rules, &facebook).is_some());
    }

    #[test]
    fn test_skips_non_matching_rules() {
        let rules = vec![
            Rule::new(
                "author",
                "Block John",
                vec![Condition::field(field::AUTHOR, Operator::Equals, "John Doe")],
            ),
            crypto_rule("content"),
        ];
        let record = PostRecord::new("linkedin")
            .with(field::AUTHOR, "Jane")
            .with(field::CONTENT, "crypto");
        assert_eq!(evaluate(&rules, &record).map(|r| r.id.as_str()), Some("content"));
    }

    #[test]
    fn test_batch_preserves_order() {
        let rules = vec![crypto_rule("1")];
        let engine = RuleEngine::new(&rules);
        let records: Vec<PostRecord> = (0..64)
            .map(|i| {
                let content = if i % 2 == 0 { "crypto" } else { "cats" };
                PostRecord::new("reddit").with(field::CONTENT, content)
            })
            .collect();

        let results = engine.evaluate_batch(&records);
        assert_eq!(results.len(), 64);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.is_some(), i % 2 == 0);
        }
    }
}
