//! feedsieve-feed: Feed-side collaborators of the rule engine
//!
//! - `raw`: Text fragments the host scrapes from each post element
//! - `adapters`: Per-site post sources turning fragments into post records
//! - `view`: The presentation layer and its in-memory feed implementation
//! - `session`: The filter pass tying sources, engine and presentation together

pub mod adapters;
pub mod raw;
pub mod session;
pub mod view;

pub use adapters::{adapter_for_site, adapter_for_url, all_adapters, PostSource};
pub use raw::RawPost;
pub use session::{FeedPost, FeedSnapshot, FilterSession, Outcome, PassReport, PostOutcome};
pub use view::{FeedEntry, FeedView, PostState, Presenter};
