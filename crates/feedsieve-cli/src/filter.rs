//! One-shot filter pass over a posts file

use anyhow::{Context as _, Result};
use clap::Args;
use colored::*;
use feedsieve_feed::{
    adapter_for_site, adapter_for_url, FeedSnapshot, FeedView, FilterSession, PassReport,
    PostSource,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::output::{OutputFormat, Reporter};
use crate::Context;

#[derive(Args)]
pub struct FilterArgs {
    /// Posts file: {"url": "...", "posts": [{"id": "...", "fragments": {...}}]}
    pub posts: PathBuf,

    /// Site identifier (linkedin, facebook, reddit), overriding detection from the URL
    #[arg(long)]
    pub site: Option<String>,

    /// Exit with code 2 when any post was hidden or highlighted
    #[arg(long)]
    pub check: bool,

    /// Do not add hidden posts to the stored statistics
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

/// Read a posts file
pub fn load_snapshot(path: &Path) -> Result<FeedSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pick the post source from `--site`, else from the snapshot URL
pub fn resolve_source(
    snapshot: &FeedSnapshot,
    site: Option<&str>,
) -> Result<&'static dyn PostSource> {
    match site {
        Some(site) => adapter_for_site(site)
            .with_context(|| format!("Unsupported site '{}'. Valid options: linkedin, facebook, reddit", site)),
        None => adapter_for_url(&snapshot.url).with_context(|| {
            format!(
                "No post source for URL '{}'; pass --site to choose one",
                snapshot.url
            )
        }),
    }
}

/// Build a session from the store's current snapshot
pub fn load_session(ctx: &Context) -> Result<FilterSession> {
    let rules = ctx.store.rules().context("Failed to load rules")?;
    let settings = ctx.store.settings().context("Failed to load settings")?;
    Ok(FilterSession::new(rules, settings))
}

/// Add a pass's hidden counts to the stored statistics
pub fn record_stats(ctx: &mut Context, report: &PassReport) -> Result<()> {
    ctx.store
        .update_stats(&report.site_counts)
        .context("Failed to update statistics")?;
    Ok(())
}

pub fn run_filter(ctx: &mut Context, args: &FilterArgs) -> Result<ExitCode> {
    let snapshot = load_snapshot(&args.posts)?;
    let source = resolve_source(&snapshot, args.site.as_deref())?;
    let session = load_session(ctx)?;

    if !session.settings().enabled && ctx.format == OutputFormat::Text {
        println!("{}", "Filtering is disabled in settings".yellow());
    }

    let mut view = FeedView::new();
    let report = session.run_pass(&mut view, source, &snapshot.posts);

    if !args.dry_run {
        record_stats(ctx, &report)?;
    }

    Reporter::new(ctx.format, ctx.verbose).report_pass(source.site(), &report)?;

    if args.check && report.has_matches() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_snapshot_and_source() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("posts.json");
        fs::write(
            &path,
            r#"{"url": "https://www.linkedin.com/feed/", "posts": [{"id": "1", "fragments": {"author": "Jane"}}]}"#,
        )
        .unwrap();

        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.posts.len(), 1);
        assert_eq!(resolve_source(&snapshot, None).unwrap().site(), "linkedin");
        assert_eq!(
            resolve_source(&snapshot, Some("reddit")).unwrap().site(),
            "reddit"
        );
        assert!(resolve_source(&snapshot, Some("myspace")).is_err());
    }

    #[test]
    fn test_unknown_url_needs_site() {
        let snapshot = FeedSnapshot {
            url: "https://example.com/".to_string(),
            posts: Vec::new(),
        };
        assert!(resolve_source(&snapshot, None).is_err());
    }

    #[test]
    fn test_bad_posts_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("posts.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(load_snapshot(&path).is_err());
        assert!(load_snapshot(&temp.path().join("missing.json")).is_err());
    }
}
