//! feedsieve-core: Shared data model for feed filtering
//!
//! This crate provides:
//! - `PostRecord`: The normalized field map extracted from one feed post
//! - `Rule`: A user-defined predicate plus the action to take on a match
//! - `Condition`: Leaf comparison, nested group, or reference to another rule
//! - `Operator`: The closed set of string comparison kinds
//! - `field`: Names of the fields the bundled post sources produce

mod error;
pub mod record;
pub mod rule;

pub use error::CoreError;
pub use record::{field, PostRecord};
pub use rule::{
    Action, Condition, ConditionGroup, ConditionValue, FieldCondition, Logic, Operator, Rule,
    ANY_SITE,
};
