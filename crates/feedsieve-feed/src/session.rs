//! The filter pass over a page of posts
//!
//! A [`FilterSession`] holds the rule and settings snapshot the pass runs
//! against. The snapshot only changes through [`FilterSession::reload`],
//! which the host calls when the store reports a change.

use feedsieve_core::{field, Action, PostRecord, Rule};
use feedsieve_rules::RuleEngine;
use feedsieve_store::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::adapters::PostSource;
use crate::raw::RawPost;
use crate::view::{PostState, Presenter};

/// Placeholder reason for posts hidden by the promoted-content toggle
pub const PROMOTED_REASON: &str = "Promoted Content";

/// Placeholder reason for posts hidden by the feed-update toggle
pub const FEED_UPDATE_REASON: &str = "Feed Update";

/// A post element as located on the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: String,
    #[serde(default)]
    pub fragments: RawPost,
}

/// The posts found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Page URL, used to pick the post source
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub posts: Vec<FeedPost>,
}

/// What the pass did with one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Hidden by a rule or a global toggle
    Hidden { reason: String, rule_id: Option<String> },
    /// Moved to the top by a highlight rule
    SeeFirst { reason: String, rule_id: String },
    /// No rule matched
    Shown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostOutcome {
    pub post_id: String,
    /// Author or content excerpt, for reports
    pub label: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Summary of one filter pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Posts that were evaluated (already filtered or revealed posts are skipped)
    pub evaluated: usize,
    pub hidden: usize,
    pub highlighted: usize,
    /// Hidden posts per site, to be added to the stored stats
    pub site_counts: BTreeMap<String, u64>,
    pub outcomes: Vec<PostOutcome>,
}

impl PassReport {
    /// Whether any post was hidden or highlighted
    pub fn has_matches(&self) -> bool {
        self.hidden > 0 || self.highlighted > 0
    }
}

/// Rule and settings snapshot driving filter passes
#[derive(Debug, Clone, Default)]
pub struct FilterSession {
    rules: Vec<Rule>,
    settings: Settings,
}

impl FilterSession {
    pub fn new(rules: Vec<Rule>, settings: Settings) -> Self {
        Self { rules, settings }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the snapshot. Posts already filtered keep their state.
    pub fn reload(&mut self, rules: Vec<Rule>, settings: Settings) {
        tracing::debug!(rules = rules.len(), enabled = settings.enabled, "session reloaded");
        self.rules = rules;
        self.settings = settings;
    }

    /// Evaluate every post not yet filtered or revealed and apply the result
    ///
    /// With filtering switched off this restores every post instead.
    pub fn run_pass<P: Presenter>(
        &self,
        presenter: &mut P,
        source: &dyn PostSource,
        posts: &[FeedPost],
    ) -> PassReport {
        let mut report = PassReport::default();

        if !self.settings.enabled {
            presenter.show_all();
            return report;
        }

        let pending: Vec<&FeedPost> = posts
            .iter()
            .filter(|post| {
                let state = presenter.state(&post.id);
                !state.is_filtered() && state != PostState::Revealed
            })
            .collect();
        let records: Vec<PostRecord> = pending
            .iter()
            .map(|post| source.extract(&post.fragments))
            .collect();

        let engine = RuleEngine::new(&self.rules);
        let matches = engine.evaluate_batch(&records);

        for ((post, record), matched) in pending.iter().zip(&records).zip(matches) {
            report.evaluated += 1;
            let outcome = self.decide(record, matched);

            match &outcome {
                Outcome::Hidden { reason, .. } => {
                    presenter.hide(&post.id, reason);
                    report.hidden += 1;
                    *report.site_counts.entry(site_key(record)).or_insert(0) += 1;
                }
                Outcome::SeeFirst { reason, .. } => {
                    presenter.see_first(&post.id, reason);
                    report.highlighted += 1;
                }
                Outcome::Shown => presenter.show(&post.id),
            }

            report.outcomes.push(PostOutcome {
                post_id: post.id.clone(),
                label: record.label(),
                outcome,
            });
        }

        if report.hidden > 0 {
            tracing::info!(
                site = source.site(),
                evaluated = report.evaluated,
                hidden = report.hidden,
                highlighted = report.highlighted,
                "filtered posts"
            );
        }
        report
    }

    /// Decide the outcome for one record given the engine's match
    fn decide(&self, record: &PostRecord, matched: Option<&Rule>) -> Outcome {
        if let Some(rule) = matched {
            return match rule.action {
                Action::Hide => Outcome::Hidden {
                    reason: rule.name.clone(),
                    rule_id: Some(rule.id.clone()),
                },
                Action::Highlight => Outcome::SeeFirst {
                    reason: rule.name.clone(),
                    rule_id: rule.id.clone(),
                },
            };
        }

        let promoted =
            record.flag(field::LINKEDIN_PROMOTED) || record.flag(field::FACEBOOK_SPONSORED);
        if self.settings.hide_promoted && promoted {
            return Outcome::Hidden {
                reason: PROMOTED_REASON.to_string(),
                rule_id: None,
            };
        }
        if self.settings.hide_feed_updates && record.flag(field::LINKEDIN_FEED_UPDATE) {
            return Outcome::Hidden {
                reason: FEED_UPDATE_REASON.to_string(),
                rule_id: None,
            };
        }
        Outcome::Shown
    }

    /// Restore every post, e.g. after filtering is switched off
    pub fn show_all<P: Presenter>(&self, presenter: &mut P) {
        presenter.show_all();
    }
}

fn site_key(record: &PostRecord) -> String {
    match record.site() {
        "" => "unknown".to_string(),
        site => site.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FacebookAdapter, LinkedInAdapter};
    use crate::raw::fragment;
    use crate::view::FeedView;
    use feedsieve_core::{Condition, Operator};

    fn post(id: &str, author: &str, content: &str) -> FeedPost {
        FeedPost {
            id: id.to_string(),
            fragments: RawPost::new()
                .with(fragment::AUTHOR, author)
                .with(fragment::CONTENT, content),
        }
    }

    fn crypto_rule() -> Rule {
        Rule::new(
            "crypto",
            "Crypto",
            vec![Condition::field(field::CONTENT, Operator::Contains, "crypto")],
        )
    }

    fn vip_rule() -> Rule {
        Rule::new(
            "vip",
            "VIP",
            vec![Condition::field(field::AUTHOR, Operator::Equals, "Ahmed")],
        )
        .with_action(Action::Highlight)
    }

    #[test]
    fn test_hide_and_highlight() {
        let session = FilterSession::new(vec![crypto_rule(), vip_rule()], Settings::default());
        let mut view = FeedView::new();
        let posts = vec![
            post("1", "Jane", "Hello"),
            post("2", "Bob", "Buy crypto now"),
            post("3", "Ahmed", "Team update"),
        ];

        let report = session.run_pass(&mut view, &LinkedInAdapter, &posts);

        assert_eq!(report.evaluated, 3);
        assert_eq!(report.hidden, 1);
        assert_eq!(report.highlighted, 1);
        assert_eq!(report.site_counts.get("linkedin"), Some(&1));
        assert_eq!(view.order(), vec!["3", "1", "2"]);
        assert_eq!(
            view.state("2"),
            PostState::Hidden {
                reason: "Crypto".into()
            }
        );
    }

    #[test]
    fn test_second_pass_skips_filtered_and_revealed() {
        let session = FilterSession::new(vec![crypto_rule()], Settings::default());
        let mut view = FeedView::new();
        let posts = vec![post("1", "Bob", "crypto"), post("2", "Eve", "more crypto")];

        session.run_pass(&mut view, &LinkedInAdapter, &posts);
        view.reveal("2");
        let report = session.run_pass(&mut view, &LinkedInAdapter, &posts);

        assert_eq!(report.evaluated, 0);
        assert!(report.site_counts.is_empty());
        assert_eq!(view.state("2"), PostState::Revealed);
    }

    #[test]
    fn test_promoted_toggle_applies_only_without_match() {
        let settings = Settings {
            hide_promoted: true,
            ..Settings::default()
        };
        let session = FilterSession::new(vec![vip_rule()], settings);
        let mut view = FeedView::new();

        let mut sponsored = post("ad", "Shop", "Deals");
        sponsored.fragments = sponsored.fragments.with(fragment::TEXT, "Shop Sponsored Deals");
        let mut vip_ad = post("vip", "Ahmed", "My startup");
        vip_ad.fragments = vip_ad.fragments.with(fragment::TEXT, "Ahmed Sponsored");

        let report = session.run_pass(&mut view, &FacebookAdapter, &[sponsored, vip_ad]);

        assert_eq!(
            view.state("ad"),
            PostState::Hidden {
                reason: PROMOTED_REASON.into()
            }
        );
        assert!(matches!(view.state("vip"), PostState::SeeFirst { .. }));
        assert_eq!(report.site_counts.get("facebook"), Some(&1));
    }

    #[test]
    fn test_feed_update_toggle() {
        let settings = Settings {
            hide_feed_updates: true,
            ..Settings::default()
        };
        let session = FilterSession::new(Vec::new(), settings);
        let mut view = FeedView::new();
        let mut update = post("u", "Jane", "Original post");
        update.fragments = update.fragments.with(fragment::UPDATE_HEADER, "Bob likes this");

        let report = session.run_pass(&mut view, &LinkedInAdapter, &[update]);
        assert_eq!(report.hidden, 1);
        assert_eq!(
            report.outcomes[0].outcome,
            Outcome::Hidden {
                reason: FEED_UPDATE_REASON.into(),
                rule_id: None
            }
        );
    }

    #[test]
    fn test_disabled_session_restores_posts() {
        let mut session = FilterSession::new(vec![crypto_rule()], Settings::default());
        let mut view = FeedView::new();
        let posts = vec![post("1", "Bob", "crypto")];
        session.run_pass(&mut view, &LinkedInAdapter, &posts);

        let rules = session.rules().to_vec();
        session.reload(
            rules,
            Settings {
                enabled: false,
                ..Settings::default()
            },
        );
        let report = session.run_pass(&mut view, &LinkedInAdapter, &posts);

        assert_eq!(report, PassReport::default());
        assert_eq!(view.state("1"), PostState::Visible);
    }

    #[test]
    fn test_snapshot_format() {
        let json = r#"{
            "url": "https://www.reddit.com/",
            "posts": [{"id": "t3_1", "fragments": {"author": "u/alice", "subreddit": "r/rust"}}]
        }"#;
        let snapshot: FeedSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.posts[0].fragments.get(fragment::SUBREDDIT), Some("r/rust"));
    }
}
