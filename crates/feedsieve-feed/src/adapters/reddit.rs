use feedsieve_core::{field, PostRecord};

use super::PostSource;
use crate::raw::{fragment, RawPost};

/// Reddit post containers
#[derive(Debug, Clone, Copy, Default)]
pub struct RedditAdapter;

impl PostSource for RedditAdapter {
    fn site(&self) -> &'static str {
        "reddit"
    }

    fn post_selector(&self) -> &'static str {
        "[data-testid=\"post-container\"]"
    }

    fn extract(&self, post: &RawPost) -> PostRecord {
        let author = post.text(fragment::AUTHOR);
        let subreddit = post.text(fragment::SUBREDDIT);

        PostRecord::new(self.site())
            .with(field::AUTHOR, author.strip_prefix("u/").unwrap_or(author))
            .with(field::CONTENT, post.text(fragment::CONTENT))
            .with(
                field::REDDIT_SUBREDDIT,
                subreddit.strip_prefix("r/").unwrap_or(subreddit),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_stripped() {
        let post = RawPost::new()
            .with(fragment::AUTHOR, "u/rustacean")
            .with(fragment::SUBREDDIT, " r/rust ")
            .with(fragment::CONTENT, "Announcing a new release");

        let record = RedditAdapter.extract(&post);
        assert_eq!(record.get(field::AUTHOR), Some("rustacean"));
        assert_eq!(record.get(field::REDDIT_SUBREDDIT), Some("rust"));
        assert_eq!(record.get(field::CONTENT), Some("Announcing a new release"));
    }
}
