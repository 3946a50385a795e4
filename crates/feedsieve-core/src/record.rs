//! Post records
//!
//! A `PostRecord` is built fresh for every post on every filter pass and is
//! never mutated once handed to the rule engine. Fields that a post source
//! could not read are stored as empty strings and read back as absent, so a
//! condition on them can never match.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field names produced by the bundled post sources
pub mod field {
    pub const SITE: &str = "site";
    pub const AUTHOR: &str = "author";
    pub const CONTENT: &str = "content";
    pub const LINKEDIN_CONNECTION: &str = "linkedin_connection";
    pub const LINKEDIN_JOB_TITLE: &str = "linkedin_job_title";
    pub const LINKEDIN_PROMOTED: &str = "linkedin_promoted";
    pub const LINKEDIN_FEED_UPDATE: &str = "linkedin_feed_update";
    pub const FACEBOOK_SPONSORED: &str = "facebook_sponsored";
    pub const REDDIT_SUBREDDIT: &str = "reddit_subreddit";

    /// Every field a bundled post source can emit, in display order
    pub const KNOWN: &[&str] = &[
        SITE,
        AUTHOR,
        CONTENT,
        LINKEDIN_CONNECTION,
        LINKEDIN_JOB_TITLE,
        LINKEDIN_PROMOTED,
        LINKEDIN_FEED_UPDATE,
        FACEBOOK_SPONSORED,
        REDDIT_SUBREDDIT,
    ];
}

/// Normalized field map for one feed post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, String>"
)]
pub struct PostRecord {
    site: String,
    author: String,
    content: String,
    /// Site-specific fields (e.g. `linkedin_connection`)
    extra: BTreeMap<String, String>,
}

impl PostRecord {
    /// Create a record for the given site with every other field absent
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter, see [`PostRecord::set`]
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field. Setting a field to the empty string marks it absent.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match name {
            field::SITE => self.site = value,
            field::AUTHOR => self.author = value,
            field::CONTENT => self.content = value,
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// The site this post was scraped from (may be empty)
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Look up a field. Missing and empty fields are both `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            field::SITE => self.site.as_str(),
            field::AUTHOR => self.author.as_str(),
            field::CONTENT => self.content.as_str(),
            _ => self.extra.get(name).map(String::as_str)?,
        };
        (!value.is_empty()).then_some(value)
    }

    /// Whether the field is present with a non-empty value
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether a boolean-style field is set to `"true"`
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    /// Names of all present fields
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = [field::SITE, field::AUTHOR, field::CONTENT]
            .into_iter()
            .filter(|name| self.has(name))
            .collect();
        names.extend(
            self.extra
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(name, _)| name.as_str()),
        );
        names
    }

    /// Short label for log lines: the author, else the start of the content
    pub fn label(&self) -> String {
        if let Some(author) = self.get(field::AUTHOR) {
            return author.to_string();
        }
        match self.get(field::CONTENT) {
            Some(content) => content.chars().take(30).collect(),
            None => "Unknown Post".to_string(),
        }
    }
}

/// Stringify a loosely-typed field value. `null` and nested structures are absent.
fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

impl From<BTreeMap<String, Value>> for PostRecord {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        let mut record = PostRecord::default();
        for (name, value) in fields {
            record.set(&name, stringify(value));
        }
        record
    }
}

impl From<PostRecord> for BTreeMap<String, String> {
    fn from(record: PostRecord) -> Self {
        let mut map = record.extra;
        map.insert(field::SITE.to_string(), record.site);
        map.insert(field::AUTHOR.to_string(), record.author);
        map.insert(field::CONTENT.to_string(), record.content);
        map
    }
}
