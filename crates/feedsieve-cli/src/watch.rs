//! Watch mode for feedsieve - re-run the filter pass on changes
//!
//! Uses the `notify` crate for cross-platform file watching with debouncing.
//! The feed view persists across passes, so a post filtered once stays
//! filtered and only newly appeared posts are evaluated, as in the browser.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::*;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::filter::{load_session, load_snapshot, record_stats, resolve_source};
use crate::output::{OutputFormat, Reporter};
use crate::Context;
use feedsieve_feed::{FeedView, FilterSession, PostSource};

#[derive(Args)]
pub struct WatchArgs {
    /// Posts file to watch
    pub posts: PathBuf,

    /// Site identifier, overriding detection from the URL
    #[arg(long)]
    pub site: Option<String>,

    /// Debounce in milliseconds (default: from config, else 1000)
    #[arg(long, value_name = "MS")]
    pub debounce: Option<u64>,

    /// Do not add hidden posts to the stored statistics
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

/// Which watched inputs changed in one debounced batch
#[derive(Debug, Default, PartialEq, Eq)]
struct Changes {
    posts: bool,
    store: bool,
}

impl Changes {
    fn any(&self) -> bool {
        self.posts || self.store
    }
}

/// Absolute form of a path whose file may not exist yet
fn watch_target(path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;
    let parent = parent
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", parent.display()))?;
    let name = path
        .file_name()
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    Ok(parent.join(name))
}

fn classify<'a>(paths: impl IntoIterator<Item = &'a Path>, posts: &Path, store: &Path) -> Changes {
    let mut changes = Changes::default();
    for path in paths {
        if path == posts {
            changes.posts = true;
        } else if path == store {
            changes.store = true;
        }
    }
    changes
}

struct Watcher<'a> {
    ctx: &'a mut Context,
    source: &'static dyn PostSource,
    session: FilterSession,
    view: FeedView,
    posts_path: PathBuf,
    dry_run: bool,
}

impl Watcher<'_> {
    fn run_pass(&mut self) -> Result<()> {
        let snapshot = load_snapshot(&self.posts_path)?;
        let report = self.session.run_pass(&mut self.view, self.source, &snapshot.posts);

        if !self.dry_run {
            record_stats(self.ctx, &report)?;
        }
        if report.evaluated > 0 || self.ctx.format == OutputFormat::Json {
            Reporter::new(self.ctx.format, self.ctx.verbose).report_pass(self.source.site(), &report)?;
        }
        Ok(())
    }

    /// Refresh the snapshot from the store; returns whether it changed
    fn reload(&mut self) -> Result<bool> {
        let fresh = load_session(self.ctx)?;
        let changed = fresh.rules() != self.session.rules() || fresh.settings() != self.session.settings();
        if changed {
            self.session.reload(fresh.rules().to_vec(), fresh.settings().clone());
            if !self.session.settings().enabled {
                self.session.show_all(&mut self.view);
            }
        }
        Ok(changed)
    }
}

/// Run watch mode - monitors the posts file and the store
pub fn run_watch(ctx: &mut Context, args: &WatchArgs) -> Result<()> {
    let debounce = args
        .debounce
        .map(Duration::from_millis)
        .unwrap_or_else(|| ctx.config.debounce());

    let posts_path = watch_target(&args.posts)?;
    let store_path = watch_target(&ctx.store_path)?;

    let snapshot = load_snapshot(&posts_path)?;
    let source = resolve_source(&snapshot, args.site.as_deref())?;

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(debounce, tx)?;

    let mut watched: Vec<&Path> = Vec::new();
    for path in [&posts_path, &store_path] {
        if let Some(parent) = path.parent() {
            if !watched.contains(&parent) {
                debouncer.watcher().watch(parent, RecursiveMode::NonRecursive)?;
                watched.push(parent);
            }
        }
        if ctx.format == OutputFormat::Text {
            println!("{} Watching: {}", "→".cyan(), path.display());
        }
    }

    let session = load_session(ctx)?;
    let mut watcher = Watcher {
        ctx,
        source,
        session,
        view: FeedView::new(),
        posts_path: posts_path.clone(),
        dry_run: args.dry_run,
    };

    if watcher.ctx.format == OutputFormat::Text {
        println!();
        println!("{}", "Watching for changes (Ctrl+C to stop)...".dimmed());
        println!();
    }

    // Initial run
    watcher.run_pass()?;

    // Watch loop
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changes = classify(
                    events
                        .iter()
                        .filter(|event| event.kind == DebouncedEventKind::Any)
                        .map(|event| event.path.as_path()),
                    &posts_path,
                    &store_path,
                );
                if !changes.any() {
                    continue;
                }

                let reloaded = if changes.store {
                    match watcher.reload() {
                        Ok(reloaded) => reloaded,
                        Err(e) => {
                            eprintln!("{}: {:#}", "Error".red(), e);
                            continue;
                        }
                    }
                } else {
                    false
                };
                if !changes.posts && !reloaded {
                    // Our own statistics write
                    continue;
                }

                tracing::info!(posts = changes.posts, rules = reloaded, "change detected");
                if watcher.ctx.format == OutputFormat::Text {
                    println!("{}", "Changes detected, filtering...".cyan());
                }
                if let Err(e) = watcher.run_pass() {
                    eprintln!("{}: {:#}", "Error".red(), e);
                }
            }
            Ok(Err(error)) => {
                eprintln!("{}: Watch error: {:?}", "Error".red(), error);
            }
            Err(_) => {
                // Channel closed, exit cleanly
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify_changes() {
        let posts = Path::new("/feeds/posts.json");
        let store = Path::new("/data/store.json");

        let changes = classify([Path::new("/feeds/posts.json")], posts, store);
        assert_eq!(changes, Changes { posts: true, store: false });

        let changes = classify(
            [Path::new("/data/store.json.tmp"), Path::new("/data/store.json")],
            posts,
            store,
        );
        assert_eq!(changes, Changes { posts: false, store: true });

        assert!(!classify([Path::new("/feeds/other.json")], posts, store).any());
    }

    #[test]
    fn test_watch_target_creates_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("new").join("store.json");

        let target = watch_target(&path).unwrap();
        assert!(temp.path().join("new").is_dir());
        assert_eq!(target.file_name().unwrap(), "store.json");
        assert!(target.is_absolute());
    }
}
