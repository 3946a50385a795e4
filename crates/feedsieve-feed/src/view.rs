//! Presentation of filtering decisions
//!
//! A [`Presenter`] applies the visual effect of a decision to one post:
//! collapsing it behind a placeholder, or moving it to the top of the feed
//! under a "See First" banner. Every operation is idempotent, since the
//! filter pass runs again whenever the feed changes.

use serde::Serialize;

/// Display state of one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PostState {
    Visible,
    /// Collapsed behind a placeholder naming the reason
    Hidden { reason: String },
    /// Moved to the top of the feed with a banner naming the reason
    SeeFirst { reason: String },
    /// Unhidden by the user; never filtered again
    Revealed,
}

impl PostState {
    /// Whether a filter decision has already been applied
    pub fn is_filtered(&self) -> bool {
        matches!(self, PostState::Hidden { .. } | PostState::SeeFirst { .. })
    }
}

/// Applies filter decisions to the visible feed
pub trait Presenter {
    /// Current state of a post; unknown posts are visible
    fn state(&self, post_id: &str) -> PostState;

    /// Collapse a post behind a placeholder. No-op if already hidden.
    fn hide(&mut self, post_id: &str, reason: &str);

    /// Move a post to the top of the feed with a banner. No-op if the post
    /// already carries any filter decision.
    fn see_first(&mut self, post_id: &str, reason: &str);

    /// Remove the placeholder at the user's request
    fn reveal(&mut self, post_id: &str);

    /// Clear any hide or see-first decision
    fn show(&mut self, post_id: &str);

    /// Clear every decision, used when filtering is switched off
    fn show_all(&mut self);
}

/// One post in a [`FeedView`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub id: String,
    #[serde(flatten)]
    pub state: PostState,
}

/// In-memory feed: posts in display order with their states
///
/// Posts are appended the first time any operation names them, mirroring a
/// feed that grows as the user scrolls.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FeedView {
    entries: Vec<FeedEntry>,
}

impl FeedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts in display order
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in display order
    pub fn order(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn position(&self, post_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == post_id)
    }

    fn entry_mut(&mut self, post_id: &str) -> &mut FeedEntry {
        let index = match self.position(post_id) {
            Some(index) => index,
            None => {
                self.entries.push(FeedEntry {
                    id: post_id.to_string(),
                    state: PostState::Visible,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }
}

impl Presenter for FeedView {
    fn state(&self, post_id: &str) -> PostState {
        self.position(post_id)
            .map(|i| self.entries[i].state.clone())
            .unwrap_or(PostState::Visible)
    }

    fn hide(&mut self, post_id: &str, reason: &str) {
        let entry = self.entry_mut(post_id);
        if matches!(entry.state, PostState::Hidden { .. }) {
            return;
        }
        entry.state = PostState::Hidden {
            reason: reason.to_string(),
        };
    }

    fn see_first(&mut self, post_id: &str, reason: &str) {
        let index = match self.position(post_id) {
            Some(index) => index,
            None => {
                self.entry_mut(post_id);
                self.entries.len() - 1
            }
        };
        if self.entries[index].state.is_filtered() {
            tracing::trace!(post = post_id, "already filtered, not moving");
            return;
        }

        let mut entry = self.entries.remove(index);
        entry.state = PostState::SeeFirst {
            reason: reason.to_string(),
        };
        self.entries.insert(0, entry);
    }

    fn reveal(&mut self, post_id: &str) {
        self.entry_mut(post_id).state = PostState::Revealed;
    }

    fn show(&mut self, post_id: &str) {
        let entry = self.entry_mut(post_id);
        if entry.state.is_filtered() {
            entry.state = PostState::Visible;
        }
    }

    fn show_all(&mut self) {
        for entry in &mut self.entries {
            if entry.state.is_filtered() {
                entry.state = PostState::Visible;
            }
        }
    }
}
