use thiserror::Error;

/// Errors raised while decoding rules from their stored representation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Condition of type '{kind}' is missing '{field}'")]
    MissingField { kind: String, field: &'static str },

    #[error("Rule reference must name a rule by id or name, got {0}")]
    InvalidRuleRef(String),

    #[error("Condition value must be a string or a list of strings, got {0}")]
    InvalidValue(String),
}
