//! Rule and condition tree definitions
//!
//! Rules are stored as JSON objects in the shape the browser extension
//! persists them:
//!
//! ```json
//! {
//!   "id": "k2x9",
//!   "name": "Crypto spam",
//!   "enabled": true,
//!   "site": "*",
//!   "action": "hide",
//!   "conditionLogic": "OR",
//!   "conditions": [
//!     { "type": "content", "operator": "contains", "value": "crypto" },
//!     { "type": "group", "logic": "AND", "conditions": [ ... ] },
//!     { "type": "rule", "value": "Recruiters" }
//!   ]
//! }
//! ```
//!
//! A condition's `type` is either a post field name, `group`, or `rule`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::CoreError;

/// Site value that makes a rule apply to every site
pub const ANY_SITE: &str = "*";

const GROUP_TYPE: &str = "group";
const RULE_REF_TYPE: &str = "rule";

/// How a list of conditions is combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

impl From<String> for Logic {
    /// Anything that is not `AND` combines with OR
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("and") {
            Logic::And
        } else {
            Logic::Or
        }
    }
}

impl From<Logic> for String {
    fn from(logic: Logic) -> Self {
        logic.as_str().to_string()
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the presentation layer does with a matched post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    /// Collapse the post behind a placeholder
    #[default]
    Hide,
    /// Move the post to the top of the feed with a "See First" banner
    Highlight,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Hide => "hide",
            Action::Highlight => "highlight",
        }
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "highlight" | "see_first" => Action::Highlight,
            _ => Action::Hide,
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String comparison applied by a leaf condition
///
/// Unrecognized operator names are kept as `Unknown` so that rules saved by
/// a newer or buggy editor still load; such conditions never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    ContainsExactly,
    StartsWithExactly,
    EndsWithExactly,
    NotEqual,
    NotContains,
    Matches,
    InList,
    Unknown(String),
}

impl Operator {
    /// All supported operators, in the order editors list them
    pub const ALL: [Operator; 11] = [
        Operator::Equals,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::ContainsExactly,
        Operator::StartsWithExactly,
        Operator::EndsWithExactly,
        Operator::NotEqual,
        Operator::NotContains,
        Operator::Matches,
        Operator::InList,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::ContainsExactly => "contains_exactly",
            Operator::StartsWithExactly => "starts_with_exactly",
            Operator::EndsWithExactly => "ends_with_exactly",
            Operator::NotEqual => "not_equal",
            Operator::NotContains => "not_contains",
            Operator::Matches => "matches",
            Operator::InList => "in_list",
            Operator::Unknown(name) => name,
        }
    }

    /// Whether the operator compares against a list of strings
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::InList)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Operator::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Operator::Unknown(s.to_string()))
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Operator::from(s.as_str())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a leaf condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionValue {
    Text(String),
    List(Vec<String>),
}

impl ConditionValue {
    /// The scalar value, if this is not a list
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConditionValue::Text(s) => Some(s),
            ConditionValue::List(_) => None,
        }
    }

    fn from_json(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match scalar_to_string(item) {
                    Some(s) => Ok(s),
                    None => Err(CoreError::InvalidValue("a nested list or object".into())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ConditionValue::List),
            Value::Object(_) => Err(CoreError::InvalidValue("an object".into())),
            other => Ok(ConditionValue::Text(scalar_to_string(other).unwrap_or_default())),
        }
    }

    fn into_json(self) -> Value {
        match self {
            ConditionValue::Text(s) => Value::String(s),
            ConditionValue::List(items) => {
                Value::Array(items.into_iter().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        ConditionValue::Text(s.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(s: String) -> Self {
        ConditionValue::Text(s)
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(items: Vec<&str>) -> Self {
        ConditionValue::List(items.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(items: Vec<String>) -> Self {
        ConditionValue::List(items)
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Compare one post field against a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

/// Nested list of conditions with its own combining logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionGroup {
    pub logic: Logic,
    pub conditions: Vec<Condition>,
}

/// One node of a rule's condition tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    Field(FieldCondition),
    Group(ConditionGroup),
    /// Evaluate another rule's conditions, looked up by id then by name
    RuleRef(String),
}

impl Condition {
    pub fn field(
        field: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Condition::Field(FieldCondition {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        })
    }

    pub fn group(logic: Logic, conditions: Vec<Condition>) -> Self {
        Condition::Group(ConditionGroup { logic, conditions })
    }

    pub fn rule_ref(target: impl Into<String>) -> Self {
        Condition::RuleRef(target.into())
    }
}

/// Stored shape of a condition, discriminated by `type`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCondition {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logic: Option<Logic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditions: Option<Vec<Condition>>,
}

impl TryFrom<RawCondition> for Condition {
    type Error = CoreError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            GROUP_TYPE => Ok(Condition::Group(ConditionGroup {
                logic: raw.logic.unwrap_or_default(),
                conditions: raw.conditions.unwrap_or_default(),
            })),
            RULE_REF_TYPE => match raw.value {
                Some(Value::String(target)) => Ok(Condition::RuleRef(target)),
                Some(other) => Err(CoreError::InvalidRuleRef(other.to_string())),
                None => Err(CoreError::MissingField {
                    kind: raw.kind,
                    field: "value",
                }),
            },
            _ => {
                let value = match raw.value {
                    Some(value) => ConditionValue::from_json(value)?,
                    None => ConditionValue::Text(String::new()),
                };
                Ok(Condition::Field(FieldCondition {
                    field: raw.kind,
                    operator: raw.operator.unwrap_or_else(|| Operator::Unknown(String::new())),
                    value,
                }))
            }
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Field(leaf) => RawCondition {
                kind: leaf.field,
                operator: Some(leaf.operator),
                value: Some(leaf.value.into_json()),
                ..RawCondition::default()
            },
            Condition::Group(group) => RawCondition {
                kind: GROUP_TYPE.to_string(),
                logic: Some(group.logic),
                conditions: Some(group.conditions),
                ..RawCondition::default()
            },
            Condition::RuleRef(target) => RawCondition {
                kind: RULE_REF_TYPE.to_string(),
                value: Some(Value::String(target)),
                ..RawCondition::default()
            },
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_site() -> String {
    ANY_SITE.to_string()
}

/// A user-defined predicate over post records plus the action to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Site identifier this rule applies to, or `*` for all sites
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default)]
    pub action: Action,
    /// Logic combining the top-level `conditions`
    #[serde(default)]
    pub condition_logic: Logic,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    /// Create an enabled, all-sites hide rule combining its conditions with AND
    pub fn new(id: impl Into<String>, name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            site: default_site(),
            action: Action::Hide,
            condition_logic: Logic::And,
            conditions,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.condition_logic = logic;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Exact, case-sensitive site match unless the rule targets every site
    pub fn applies_to_site(&self, site: &str) -> bool {
        self.site == ANY_SITE || self.site == site
    }

    /// Whether this rule is the target of a reference by id or name
    pub fn is_named(&self, target: &str) -> bool {
        self.id == target || self.name == target
    }

    /// Targets of every rule reference in this rule's tree, in tree order
    pub fn referenced_rules(&self) -> Vec<&str> {
        fn collect<'a>(conditions: &'a [Condition], out: &mut Vec<&'a str>) {
            for condition in conditions {
                match condition {
                    Condition::RuleRef(target) => out.push(target),
                    Condition::Group(group) => collect(&group.conditions, out),
                    Condition::Field(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.conditions, &mut out);
        out
    }
}
