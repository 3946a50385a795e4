//! Global settings and filtering statistics

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Global toggles, stored under `cf_settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Master switch: when off, no filtering happens and hidden posts are restored
    pub enabled: bool,
    pub theme: String,
    /// Hide promoted/sponsored posts that no rule matched
    pub hide_promoted: bool,
    /// Hide LinkedIn "X liked this" style activity posts that no rule matched
    pub hide_feed_updates: bool,
    /// Toggles written by other front-ends, preserved as-is
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: "dark".to_string(),
            hide_promoted: false,
            hide_feed_updates: false,
            other: BTreeMap::new(),
        }
    }
}

/// Counts of hidden posts, stored under `cf_stats`
///
/// Entries that are not counters are kept in `other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BTreeMap<String, Value>")]
pub struct Stats {
    pub filtered_count: u64,
    /// Per-site counts keyed by site identifier
    #[serde(flatten)]
    pub sites: BTreeMap<String, u64>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

const FILTERED_COUNT: &str = "filteredCount";

/// A stored counter: a non-negative integer, or a float holding one
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    })
}

impl From<BTreeMap<String, Value>> for Stats {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        let mut stats = Stats {
            filtered_count: 0,
            sites: BTreeMap::new(),
            other: BTreeMap::new(),
        };
        for (key, value) in entries {
            match (key.as_str(), as_count(&value)) {
                (FILTERED_COUNT, count) => stats.filtered_count = count.unwrap_or(0),
                (_, Some(count)) => {
                    stats.sites.insert(key, count);
                }
                (_, None) => {
                    stats.other.insert(key, value);
                }
            }
        }
        stats
    }
}

impl Default for Stats {
    fn default() -> Self {
        let sites = ["linkedin", "facebook", "reddit"]
            .into_iter()
            .map(|site| (site.to_string(), 0))
            .collect();
        Self {
            filtered_count: 0,
            sites,
            other: BTreeMap::new(),
        }
    }
}

impl Stats {
    /// Add per-site counts, keeping the total in step
    pub fn add(&mut self, counts: &BTreeMap<String, u64>) {
        for (site, count) in counts {
            self.other.remove(site);
            *self.sites.entry(site.clone()).or_insert(0) += count;
            self.filtered_count += count;
        }
    }

    pub fn site(&self, site: &str) -> u64 {
        self.sites.get(site).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.theme, "dark");
        assert!(!settings.hide_promoted);
    }

    #[test]
    fn test_settings_keep_unknown_toggles() {
        let json = r#"{"enabled": true, "hidePromoted": true, "compactMode": true}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.hide_promoted);
        assert_eq!(settings.other.get("compactMode"), Some(&Value::Bool(true)));

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["compactMode"], true);
        assert_eq!(back["hideFeedUpdates"], false);
    }

    #[test]
    fn test_stats_shape() {
        let stats: Stats =
            serde_json::from_str(r#"{"filteredCount": 5, "linkedin": 3, "facebook": 2}"#).unwrap();
        assert_eq!(stats.filtered_count, 5);
        assert_eq!(stats.site("linkedin"), 3);
        assert_eq!(stats.site("reddit"), 0);

        let back = serde_json::to_value(Stats::default()).unwrap();
        assert_eq!(back["filteredCount"], 0);
        assert_eq!(back["reddit"], 0);
    }

    #[test]
    fn test_stats_add() {
        let mut stats = Stats::default();
        let counts = BTreeMap::from([("linkedin".to_string(), 2), ("mastodon".to_string(), 1)]);
        stats.add(&counts);
        stats.add(&counts);

        assert_eq!(stats.filtered_count, 6);
        assert_eq!(stats.site("linkedin"), 4);
        assert_eq!(stats.site("mastodon"), 2);
    }

    #[test]
    fn test_stats_keep_entries_that_are_not_counters() {
        let json = r#"{"filteredCount": 4.0, "linkedin": 3, "reddit": 1.0, "lastReset": "2024-01-01", "facebook": -1, "extra": {"a": 1}}"#;
        let stats: Stats = serde_json::from_str(json).unwrap();

        assert_eq!(stats.filtered_count, 4);
        assert_eq!(stats.site("linkedin"), 3);
        assert_eq!(stats.site("reddit"), 1);
        assert_eq!(stats.site("facebook"), 0);
        assert_eq!(stats.other.len(), 3);

        let back = serde_json::to_value(&stats).unwrap();
        assert_eq!(back["lastReset"], "2024-01-01");
        assert_eq!(back["extra"]["a"], 1);
        assert_eq!(back["linkedin"], 3);

        let mut stats = stats;
        stats.add(&BTreeMap::from([("facebook".to_string(), 2)]));
        assert_eq!(stats.site("facebook"), 2);
        assert!(!stats.other.contains_key("facebook"));
    }

    #[test]
    fn test_stats_bad_total_reads_as_zero() {
        let stats: Stats = serde_json::from_str(r#"{"filteredCount": "lots", "linkedin": 2}"#).unwrap();
        assert_eq!(stats.filtered_count, 0);
        assert_eq!(stats.site("linkedin"), 2);
        assert!(stats.other.is_empty());
    }
}
