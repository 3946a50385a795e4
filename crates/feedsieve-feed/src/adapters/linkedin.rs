use feedsieve_core::{field, PostRecord};

use super::PostSource;
use crate::raw::{fragment, RawPost};

const ACTIVITY_PHRASES: &[&str] = &[
    "liked this",
    "shared this",
    "commented on this",
    "reposted this",
    "reacted to this",
];

/// LinkedIn feed posts
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedInAdapter;

impl PostSource for LinkedInAdapter {
    fn site(&self) -> &'static str {
        "linkedin"
    }

    fn post_selector(&self) -> &'static str {
        ".feed-shared-update-v2, [data-id^=\"urn:li:activity:\"], .update-components-definition-list"
    }

    fn extract(&self, post: &RawPost) -> PostRecord {
        PostRecord::new(self.site())
            .with(field::AUTHOR, post.text(fragment::AUTHOR))
            .with(field::CONTENT, post.text(fragment::CONTENT))
            .with(field::LINKEDIN_CONNECTION, connection_degree(post))
            .with(field::LINKEDIN_JOB_TITLE, post.text(fragment::DESCRIPTION))
            .with(field::LINKEDIN_PROMOTED, is_promoted(post).to_string())
            .with(field::LINKEDIN_FEED_UPDATE, is_feed_update(post).to_string())
    }
}

fn degree_in(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    ["1st", "2nd", "3rd"]
        .into_iter()
        .find(|degree| text.contains(degree))
}

/// Connection degree of the actor, or of the original author on shared posts
fn connection_degree(post: &RawPost) -> &'static str {
    if let Some(degree) = degree_in(post.text(fragment::ACTOR_INFO)) {
        return degree;
    }
    if post.has(fragment::UPDATE_HEADER) {
        if let Some(degree) = degree_in(post.text(fragment::SUB_DESCRIPTION)) {
            return degree;
        }
    }
    ""
}

fn is_feed_update(post: &RawPost) -> bool {
    if post.has(fragment::UPDATE_HEADER) {
        return true;
    }
    if !post.has(fragment::CONTROL_MENU) {
        return false;
    }
    let text = post.lower(fragment::TEXT);
    ACTIVITY_PHRASES.iter().any(|phrase| text.contains(phrase))
}

fn is_promoted(post: &RawPost) -> bool {
    [
        fragment::TEXT,
        fragment::PROMOTED_INDICATOR,
        fragment::SUB_DESCRIPTION,
    ]
    .into_iter()
    .map(|name| post.lower(name))
    .any(|text| text.contains("promoted") || text.contains("sponsored"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_post() {
        let post = RawPost::new()
            .with(fragment::AUTHOR, " Ahmed Ali ")
            .with(fragment::CONTENT, "We are hiring!")
            .with(fragment::DESCRIPTION, "HR Manager at Acme")
            .with(fragment::ACTOR_INFO, "• 2nd")
            .with(fragment::TEXT, "Ahmed Ali • 2nd HR Manager at Acme We are hiring!");

        let record = LinkedInAdapter.extract(&post);
        assert_eq!(record.site(), "linkedin");
        assert_eq!(record.get(field::AUTHOR), Some("Ahmed Ali"));
        assert_eq!(record.get(field::LINKEDIN_CONNECTION), Some("2nd"));
        assert_eq!(record.get(field::LINKEDIN_JOB_TITLE), Some("HR Manager at Acme"));
        assert_eq!(record.get(field::LINKEDIN_PROMOTED), Some("false"));
        assert_eq!(record.get(field::LINKEDIN_FEED_UPDATE), Some("false"));
    }

    #[test]
    fn test_shared_post_uses_original_author_degree() {
        let post = RawPost::new()
            .with(fragment::UPDATE_HEADER, "Jane Doe likes this")
            .with(fragment::SUB_DESCRIPTION, "3rd+ • Founder");

        let record = LinkedInAdapter.extract(&post);
        assert_eq!(record.get(field::LINKEDIN_CONNECTION), Some("3rd"));
        assert!(record.flag(field::LINKEDIN_FEED_UPDATE));
    }

    #[test]
    fn test_activity_text_needs_control_menu() {
        let text = "Jane Doe reposted this";
        let without_menu = RawPost::new().with(fragment::TEXT, text);
        let with_menu = without_menu.clone().with(fragment::CONTROL_MENU, "");

        assert!(!LinkedInAdapter.extract(&without_menu).flag(field::LINKEDIN_FEED_UPDATE));
        assert!(LinkedInAdapter.extract(&with_menu).flag(field::LINKEDIN_FEED_UPDATE));
    }

    #[test]
    fn test_promoted_detection() {
        let by_text = RawPost::new().with(fragment::TEXT, "Acme Corp Promoted Try our product");
        let by_indicator = RawPost::new().with(fragment::PROMOTED_INDICATOR, "Sponsored");
        let plain = RawPost::new().with(fragment::TEXT, "Just a post");

        assert!(LinkedInAdapter.extract(&by_text).flag(field::LINKEDIN_PROMOTED));
        assert!(LinkedInAdapter.extract(&by_indicator).flag(field::LINKEDIN_PROMOTED));
        assert!(!LinkedInAdapter.extract(&plain).flag(field::LINKEDIN_PROMOTED));
    }
}
