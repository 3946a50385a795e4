//! Filter passes driven from a store, the way the host runs them

use feedsieve_core::{Condition, Operator, Rule};
use feedsieve_feed::{adapter_for_url, FeedSnapshot, FeedView, FilterSession, PostState, Presenter};
use feedsieve_store::MemoryStore;

const SNAPSHOT: &str = r#"{
    "url": "https://www.reddit.com/r/all",
    "posts": [
        {"id": "t3_a", "fragments": {"author": "u/alice", "subreddit": "r/memes", "content": "lol"}},
        {"id": "t3_b", "fragments": {"author": "u/bob", "subreddit": "r/rust", "content": "Release notes"}},
        {"id": "t3_c", "fragments": {"author": "u/carol", "subreddit": "r/pics", "content": "Sunset"}}
    ]
}"#;

fn store_with_rules() -> MemoryStore {
    let mut store = MemoryStore::in_memory();
    store
        .add_rule(
            Rule::new(
                "",
                "Noise",
                vec![Condition::field("reddit_subreddit", Operator::InList, vec!["memes", "pics"])],
            )
            .with_site("reddit"),
        )
        .unwrap();
    store
}

#[test]
fn test_pass_updates_stats_once() {
    let mut store = store_with_rules();
    let snapshot: FeedSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
    let source = adapter_for_url(&snapshot.url).unwrap();

    let session = FilterSession::new(store.rules().unwrap(), store.settings().unwrap());
    let mut view = FeedView::new();

    let first = session.run_pass(&mut view, source, &snapshot.posts);
    store.update_stats(&first.site_counts).unwrap();
    let second = session.run_pass(&mut view, source, &snapshot.posts);
    store.update_stats(&second.site_counts).unwrap();

    assert_eq!(first.hidden, 2);
    assert_eq!(second.evaluated, 1);
    assert_eq!(second.hidden, 0);

    let stats = store.stats().unwrap();
    assert_eq!(stats.filtered_count, 2);
    assert_eq!(stats.site("reddit"), 2);
    assert_eq!(view.state("t3_b"), PostState::Visible);
}

#[test]
fn test_reload_picks_up_new_rules_for_unfiltered_posts() {
    let mut store = store_with_rules();
    let snapshot: FeedSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
    let source = adapter_for_url(&snapshot.url).unwrap();

    let mut session = FilterSession::new(store.rules().unwrap(), store.settings().unwrap());
    let mut view = FeedView::new();
    session.run_pass(&mut view, source, &snapshot.posts);

    store
        .add_rule(Rule::new(
            "",
            "Bob",
            vec![Condition::field("author", Operator::Equals, "BOB")],
        ))
        .unwrap();
    session.reload(store.rules().unwrap(), store.settings().unwrap());
    let report = session.run_pass(&mut view, source, &snapshot.posts);

    assert_eq!(report.hidden, 1);
    assert_eq!(
        view.state("t3_b"),
        PostState::Hidden {
            reason: "Bob".into()
        }
    );
}
