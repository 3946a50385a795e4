//! Post sources for the supported sites
//!
//! Each adapter knows the selector the host uses to find post elements on
//! its site and how to turn a post's raw fragments into a [`PostRecord`].
//! Extraction never fails: anything the host could not find simply leaves
//! the corresponding field empty, which the engine treats as absent.

mod facebook;
mod linkedin;
mod reddit;

pub use facebook::FacebookAdapter;
pub use linkedin::LinkedInAdapter;
pub use reddit::RedditAdapter;

use feedsieve_core::PostRecord;

use crate::raw::RawPost;

/// A site-specific extractor of post records
pub trait PostSource: Send + Sync {
    /// Site identifier written into every record, matched against `Rule::site`
    fn site(&self) -> &'static str;

    /// CSS selector locating post elements on the site
    fn post_selector(&self) -> &'static str;

    /// Normalize one post's fragments into a record
    fn extract(&self, post: &RawPost) -> PostRecord;
}

static ADAPTERS: [&dyn PostSource; 3] = [&LinkedInAdapter, &FacebookAdapter, &RedditAdapter];

/// All bundled adapters
pub fn all_adapters() -> &'static [&'static dyn PostSource] {
    &ADAPTERS
}

/// Pick the adapter for a page URL by host substring
pub fn adapter_for_url(url: &str) -> Option<&'static dyn PostSource> {
    let site = if url.contains("linkedin.com") {
        "linkedin"
    } else if url.contains("facebook.com") {
        "facebook"
    } else if url.contains("reddit.com") {
        "reddit"
    } else {
        return None;
    };
    adapter_for_site(site)
}

/// Look up an adapter by its site identifier
pub fn adapter_for_site(site: &str) -> Option<&'static dyn PostSource> {
    ADAPTERS.iter().copied().find(|adapter| adapter.site() == site)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_for_url() {
        let site = |url: &str| adapter_for_url(url).map(|a| a.site());
        assert_eq!(site("https://www.linkedin.com/feed/"), Some("linkedin"));
        assert_eq!(site("https://www.facebook.com/"), Some("facebook"));
        assert_eq!(site("https://old.reddit.com/r/rust"), Some("reddit"));
        assert_eq!(site("https://example.com/"), None);
    }

    #[test]
    fn test_adapters_are_distinct() {
        let sites: Vec<&str> = all_adapters().iter().map(|a| a.site()).collect();
        assert_eq!(sites, vec!["linkedin", "facebook", "reddit"]);
        assert!(all_adapters().iter().all(|a| !a.post_selector().is_empty()));
        assert!(adapter_for_site("mastodon").is_none());
    }

    #[test]
    fn test_empty_post_still_has_site() {
        for adapter in all_adapters() {
            let record = adapter.extract(&RawPost::new());
            assert_eq!(record.site(), adapter.site());
            assert!(record.get("author").is_none());
            assert!(record.get("content").is_none());
        }
    }
}
