//! feedsieve-store: Persistence for rules, settings and statistics
//!
//! Everything is kept as JSON blobs under fixed keys in a [`BlobStore`]:
//! a single JSON file on disk for the CLI, or an in-memory map for tests.
//! [`RuleStore`] layers the typed rule/settings/stats operations on top and
//! [`backup`] implements the bulk and single-rule exchange formats.

pub mod backup;
mod blob;
mod error;
mod id;
mod settings;
mod store;

pub use blob::{BlobStore, JsonFileBlobStore, MemoryBlobStore};
pub use error::StoreError;
pub use id::generate_id;
pub use settings::{Settings, Stats};
pub use store::{keys, FileStore, MemoryStore, RuleStore};
