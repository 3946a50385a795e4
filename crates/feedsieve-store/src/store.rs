//! Typed access to rules, settings and statistics

use feedsieve_core::Rule;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::blob::{BlobStore, JsonFileBlobStore, MemoryBlobStore};
use crate::error::StoreError;
use crate::id::generate_id;
use crate::settings::{Settings, Stats};

/// Storage keys, shared with the browser extension's storage layout
pub mod keys {
    pub const RULES: &str = "cf_rules";
    pub const SETTINGS: &str = "cf_settings";
    pub const STATS: &str = "cf_stats";
}

/// Rule store backed by a single JSON file
pub type FileStore = RuleStore<JsonFileBlobStore>;

/// Rule store held in memory
pub type MemoryStore = RuleStore<MemoryBlobStore>;

/// Rules, settings and stats persisted in a [`BlobStore`]
///
/// Every read goes to the backing store, so callers always see the latest
/// written snapshot. The rule list is kept in the order rules were added,
/// which is also their evaluation order.
#[derive(Debug, Clone)]
pub struct RuleStore<B> {
    blobs: B,
}

impl<B: BlobStore> RuleStore<B> {
    pub fn new(blobs: B) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.blobs.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.blobs.set(key, value)
    }

    /// All stored rules in evaluation order
    ///
    /// A stored entry that no longer decodes as a rule is skipped with a
    /// warning rather than hiding every other rule.
    pub fn rules(&self) -> Result<Vec<Rule>, StoreError> {
        let entries: Vec<Value> = self.load(keys::RULES)?.unwrap_or_default();
        let mut rules = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Rule>(entry) {
                Ok(rule) => rules.push(rule),
                Err(e) => tracing::warn!(index, error = %e, "skipping malformed stored rule"),
            }
        }
        Ok(rules)
    }

    /// Replace the whole rule list
    pub fn save_rules(&mut self, rules: &[Rule]) -> Result<(), StoreError> {
        self.save(keys::RULES, &rules)
    }

    /// Append a rule, assigning a fresh id if it has none or its id is taken
    ///
    /// Returns the stored rule's id.
    pub fn add_rule(&mut self, mut rule: Rule) -> Result<String, StoreError> {
        let mut rules = self.rules()?;
        if rule.id.is_empty() {
            rule.id = generate_id();
        } else if rules.iter().any(|r| r.id == rule.id) {
            let fresh = generate_id();
            tracing::warn!(id = %rule.id, fresh = %fresh, "rule id already in use, assigning a new one");
            rule.id = fresh;
        }
        let id = rule.id.clone();
        rules.push(rule);
        self.save_rules(&rules)?;
        tracing::info!(id = %id, "rule added");
        Ok(id)
    }

    /// Replace the rule with the same id in place, keeping its position
    ///
    /// Returns `false` if no rule has that id.
    pub fn update_rule(&mut self, rule: Rule) -> Result<bool, StoreError> {
        let mut rules = self.rules()?;
        let Some(slot) = rules.iter_mut().find(|r| r.id == rule.id) else {
            return Ok(false);
        };
        *slot = rule;
        self.save_rules(&rules)?;
        Ok(true)
    }

    /// Remove the rule with the given id
    ///
    /// Returns `false` if no rule has that id.
    pub fn delete_rule(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut rules = self.rules()?;
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Ok(false);
        }
        self.save_rules(&rules)?;
        tracing::info!(id, "rule deleted");
        Ok(true)
    }

    /// Find a rule by id, falling back to name
    pub fn find_rule(&self, key: &str) -> Result<Option<Rule>, StoreError> {
        let rules = self.rules()?;
        let by_id = rules.iter().position(|r| r.id == key);
        let index = by_id.or_else(|| rules.iter().position(|r| r.name == key));
        Ok(index.map(|i| rules[i].clone()))
    }

    pub fn settings(&self) -> Result<Settings, StoreError> {
        Ok(self.load(keys::SETTINGS)?.unwrap_or_default())
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.save(keys::SETTINGS, settings)
    }

    pub fn stats(&self) -> Result<Stats, StoreError> {
        Ok(self.load(keys::STATS)?.unwrap_or_default())
    }

    pub fn save_stats(&mut self, stats: &Stats) -> Result<(), StoreError> {
        self.save(keys::STATS, stats)
    }

    /// Add per-site hidden counts from one filtering pass
    ///
    /// An empty map leaves the store untouched.
    pub fn update_stats(&mut self, counts: &BTreeMap<String, u64>) -> Result<Stats, StoreError> {
        let mut stats = self.stats()?;
        if counts.values().all(|&count| count == 0) {
            return Ok(stats);
        }
        stats.add(counts);
        self.save_stats(&stats)?;
        Ok(stats)
    }

    pub fn reset_stats(&mut self) -> Result<(), StoreError> {
        self.save_stats(&Stats::default())
    }
}

impl FileStore {
    /// Open (without creating) the store file at `path`
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        RuleStore::new(JsonFileBlobStore::new(path))
    }
}

impl MemoryStore {
    pub fn in_memory() -> Self {
        RuleStore::new(MemoryBlobStore::new())
    }
}
