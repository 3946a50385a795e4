//! Raw posts as handed over by the page scraper
//!
//! The host pulls the text of a handful of named elements out of each post
//! element and passes them here as a flat map. Adapters only ever read
//! these fragments; nothing in this crate touches a DOM.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fragment names shared by the bundled adapters
pub mod fragment {
    /// Full visible text of the post element
    pub const TEXT: &str = "text";
    pub const AUTHOR: &str = "author";
    pub const CONTENT: &str = "content";
    /// Actor headline (LinkedIn job title)
    pub const DESCRIPTION: &str = "description";
    /// Supplementary actor info holding the connection degree
    pub const ACTOR_INFO: &str = "actor_info";
    /// Sub-description of the original author on shared posts
    pub const SUB_DESCRIPTION: &str = "sub_description";
    /// "X liked this" style header; presence marks a feed update
    pub const UPDATE_HEADER: &str = "update_header";
    /// Control menu container, present on friend-activity posts
    pub const CONTROL_MENU: &str = "control_menu";
    /// Text or aria-label of a promoted/sponsored indicator element
    pub const PROMOTED_INDICATOR: &str = "promoted_indicator";
    /// Newline-separated hrefs of links inside the post
    pub const LINKS: &str = "links";
    pub const SUBREDDIT: &str = "subreddit";
}

/// Named text fragments of one post element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPost {
    fragments: BTreeMap<String, String>,
}

impl RawPost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, text: impl Into<String>) -> Self {
        self.fragments.insert(name.to_string(), text.into());
        self
    }

    /// Trimmed fragment text. Missing and blank fragments are `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fragments
            .get(name)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
    }

    /// Trimmed fragment text, empty if missing
    pub fn text(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Whether the host found the element at all, even if it had no text
    pub fn has(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    /// Lowercased fragment text for keyword checks
    pub fn lower(&self, name: &str) -> String {
        self.text(name).to_lowercase()
    }
}

impl FromIterator<(String, String)> for RawPost {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fragments_are_absent_but_present() {
        let raw: RawPost = serde_json::from_str(r#"{"author": "  Jane  ", "update_header": ""}"#).unwrap();
        assert_eq!(raw.get(fragment::AUTHOR), Some("Jane"));
        assert_eq!(raw.get(fragment::UPDATE_HEADER), None);
        assert!(raw.has(fragment::UPDATE_HEADER));
        assert!(!raw.has(fragment::CONTENT));
        assert_eq!(raw.text(fragment::CONTENT), "");
    }
}
