use feedsieve_core::{field, PostRecord};

use super::PostSource;
use crate::raw::{fragment, RawPost};

/// Facebook feed units
#[derive(Debug, Clone, Copy, Default)]
pub struct FacebookAdapter;

impl PostSource for FacebookAdapter {
    fn site(&self) -> &'static str {
        "facebook"
    }

    fn post_selector(&self) -> &'static str {
        "[data-pagelet^=\"FeedUnit_\"], [role=\"article\"]"
    }

    fn extract(&self, post: &RawPost) -> PostRecord {
        let sponsored = post.lower(fragment::TEXT).contains("sponsored")
            || post.text(fragment::LINKS).lines().any(|href| href.contains("/ads/"));

        PostRecord::new(self.site())
            .with(field::AUTHOR, post.text(fragment::AUTHOR))
            .with(field::CONTENT, post.text(fragment::CONTENT))
            .with(field::FACEBOOK_SPONSORED, sponsored.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sponsored_by_text_or_ad_link() {
        let by_text = RawPost::new()
            .with(fragment::AUTHOR, "Shop")
            .with(fragment::TEXT, "Shop · Sponsored · Buy now");
        let by_link = RawPost::new().with(
            fragment::LINKS,
            "https://www.facebook.com/shop\nhttps://www.facebook.com/ads/about",
        );
        let organic = RawPost::new()
            .with(fragment::AUTHOR, "Friend")
            .with(fragment::CONTENT, "Holiday photos");

        assert!(FacebookAdapter.extract(&by_text).flag(field::FACEBOOK_SPONSORED));
        assert!(FacebookAdapter.extract(&by_link).flag(field::FACEBOOK_SPONSORED));

        let record = FacebookAdapter.extract(&organic);
        assert_eq!(record.get(field::FACEBOOK_SPONSORED), Some("false"));
        assert_eq!(record.get(field::CONTENT), Some("Holiday photos"));
    }
}
