//! feedsieve-rules: Rule matching engine
//!
//! - `matcher`: The string comparison operators
//! - `evaluator`: Condition tree evaluation with cycle-safe rule references
//! - `engine`: First-match-wins selection over an ordered rule snapshot
//! - `validate`: Configuration checks for rules and rule sets
//! - `loader`: Reading rules from JSON and YAML documents

pub mod engine;
pub mod evaluator;
pub mod loader;
pub mod matcher;
pub mod validate;

pub use engine::{evaluate, RuleEngine};
pub use evaluator::Evaluator;
pub use loader::{
    load_rules_from_dir, load_rules_from_file, load_rules_from_string, LoadError, RuleFormat,
    RuleInfo,
};
pub use matcher::{matches, PatternCache};
pub use validate::{validate_rule, validate_rule_set, Issue, RuleIssue};
