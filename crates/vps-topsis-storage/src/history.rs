use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{StorageError, load_or_init, now_ms, write_json};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Rankings kept per saved run.
const KEPT_RANKINGS: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HistoryWeights {
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRanking {
    pub rank: usize,
    pub vendor: String,
    pub plan: String,
    pub score: f64,
}

/// A saved analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: u64,
    pub timestamp_ms: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub weights: HistoryWeights,
    pub total_alternatives: usize,
    pub top_vendor: String,
    pub top_score: f64,
    pub rankings: Vec<HistoryRanking>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub weights: HistoryWeights,
    pub total_alternatives: usize,
    /// Full ranking, best first; only the head is kept.
    pub rankings: Vec<HistoryRanking>,
}

pub trait HistoryBackend: Send {
    fn list(&self) -> Vec<HistoryEntry>;
    fn record(&mut self, new_entry: NewHistoryEntry) -> Result<HistoryEntry, StorageError>;
    fn remove(&mut self, id: u64) -> Result<bool, StorageError>;
    fn clear(&mut self) -> Result<usize, StorageError>;
    fn stats(&self) -> serde_json::Value;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedHistory {
    /// Files written before the counter existed fall back to max id + 1.
    #[serde(default)]
    next_id: u64,
    entries: Vec<HistoryEntry>,
}

/// Saved runs, newest first, capped at `limit` entries.
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
    limit: usize,
    /// Only ever grows, so ids of deleted or evicted runs are never handed out again.
    next_id: u64,
}

impl HistoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_limit(path, DEFAULT_HISTORY_LIMIT)
    }

    pub fn open_with_limit(path: impl AsRef<Path>, limit: usize) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let persisted: PersistedHistory = load_or_init(&path)?;
        let mut entries = persisted.entries;
        let next_id = entries
            .iter()
            .map(|e| e.id.saturating_add(1))
            .fold(persisted.next_id.max(1), u64::max);
        entries.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms).then(b.id.cmp(&a.id)));
        entries.truncate(limit.max(1));
        Ok(Self {
            path,
            entries,
            limit: limit.max(1),
            next_id,
        })
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.clone()
    }

    pub fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "count": self.entries.len(),
            "limit": self.limit,
            "next_id": self.next_id,
            "path": self.path,
        })
    }

    pub fn record(&mut self, new_entry: NewHistoryEntry) -> Result<HistoryEntry, StorageError> {
        let title = new_entry.title.trim().to_string();
        if title.is_empty() {
            return Err(StorageError::InvalidInput(
                "title cannot be empty".to_string(),
            ));
        }

        let top = new_entry.rankings.first();
        let entry = HistoryEntry {
            id: self.next_id,
            timestamp_ms: now_ms(),
            title,
            description: new_entry.description.trim().to_string(),
            tags: new_entry
                .tags
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            weights: new_entry.weights,
            total_alternatives: new_entry.total_alternatives,
            top_vendor: top.map(|r| r.vendor.clone()).unwrap_or_default(),
            top_score: top.map(|r| round4(r.score)).unwrap_or_default(),
            rankings: new_entry
                .rankings
                .iter()
                .take(KEPT_RANKINGS)
                .cloned()
                .collect(),
        };

        self.next_id = self.next_id.saturating_add(1);
        self.entries.insert(0, entry.clone());
        self.entries.truncate(self.limit);
        self.persist()?;
        tracing::debug!(id = entry.id, title = %entry.title, "analysis run saved");
        Ok(entry)
    }

    pub fn remove(&mut self, id: u64) -> Result<bool, StorageError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let changed = self.entries.len() != before;
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    pub fn clear(&mut self) -> Result<usize, StorageError> {
        let removed = self.entries.len();
        self.entries.clear();
        self.persist()?;
        Ok(removed)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let persisted = PersistedHistory {
            next_id: self.next_id,
            entries: self.entries.clone(),
        };
        write_json(&self.path, &persisted)
    }
}

impl HistoryBackend for HistoryStore {
    fn list(&self) -> Vec<HistoryEntry> {
        Self::list(self)
    }

    fn record(&mut self, new_entry: NewHistoryEntry) -> Result<HistoryEntry, StorageError> {
        Self::record(self, new_entry)
    }

    fn remove(&mut self, id: u64) -> Result<bool, StorageError> {
        Self::remove(self, id)
    }

    fn clear(&mut self) -> Result<usize, StorageError> {
        Self::clear(self)
    }

    fn stats(&self) -> serde_json::Value {
        Self::stats(self)
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "vps-topsis-history-{tag}-{}-{}.json",
            std::process::id(),
            now_ms()
        ))
    }

    fn run(title: &str, rankings: usize) -> NewHistoryEntry {
        NewHistoryEntry {
            title: title.to_string(),
            description: String::new(),
            tags: vec!["budget".to_string(), " ".to_string()],
            weights: HistoryWeights {
                cpu: 0.25,
                ram: 0.25,
                disk: 0.25,
                price: 0.25,
            },
            total_alternatives: rankings,
            rankings: (0..rankings)
                .map(|i| HistoryRanking {
                    rank: i + 1,
                    vendor: format!("vendor-{i}"),
                    plan: "Basic".to_string(),
                    score: 0.912_345_6 - i as f64 * 0.1,
                })
                .collect(),
        }
    }

    #[test]
    fn records_newest_first_and_keeps_top_five() {
        let path = temp_path("record");
        let mut store = HistoryStore::open(&path).expect("open");

        let first = store.record(run("first", 8)).expect("first");
        let second = store.record(run("second", 2)).expect("second");
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(first.rankings.len(), 5);
        assert_eq!(first.top_vendor, "vendor-0");
        assert_eq!(first.top_score, 0.9123);
        assert_eq!(first.tags, vec!["budget".to_string()]);

        let listed = HistoryStore::open(&path).expect("reopen").list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "second");
        assert_eq!(listed[1].title, "first");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn retention_limit_drops_oldest_runs() {
        let path = temp_path("limit");
        let mut store = HistoryStore::open_with_limit(&path, 3).expect("open");
        for i in 0..5 {
            store.record(run(&format!("run-{i}"), 1)).expect("record");
        }
        let titles: Vec<String> = store.list().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["run-4", "run-3", "run-2"]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn remove_and_clear() {
        let path = temp_path("remove");
        let mut store = HistoryStore::open(&path).expect("open");
        let a = store.record(run("a", 1)).expect("a");
        store.record(run("b", 1)).expect("b");

        assert!(store.remove(a.id).expect("remove"));
        assert!(!store.remove(a.id).expect("remove again"));
        let next = store.record(run("c", 1)).expect("c");
        assert_eq!(next.id, 3);

        assert_eq!(store.clear().expect("clear"), 2);
        assert!(HistoryStore::open(&path).expect("reopen").list().is_empty());
        assert!(store.record(run("   ", 1)).is_err());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn ids_are_not_reused_after_delete_or_clear() {
        let path = temp_path("ids");
        let mut store = HistoryStore::open(&path).expect("open");
        store.record(run("a", 1)).expect("a");
        let b = store.record(run("b", 1)).expect("b");

        assert!(store.remove(b.id).expect("remove newest"));
        assert_eq!(store.record(run("c", 1)).expect("c").id, 3);

        assert_eq!(store.clear().expect("clear"), 2);
        assert_eq!(store.record(run("d", 1)).expect("d").id, 4);

        let mut reopened = HistoryStore::open(&path).expect("reopen");
        assert!(reopened.clear().is_ok());
        let mut reopened = HistoryStore::open(&path).expect("reopen empty");
        assert_eq!(reopened.record(run("e", 1)).expect("e").id, 5);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn files_without_a_counter_continue_after_the_highest_id() {
        let path = temp_path("legacy");
        let mut store = HistoryStore::open(&path).expect("open");
        for title in ["a", "b", "c"] {
            store.record(run(title, 1)).expect("record");
        }
        let entries = store.list();
        fs::write(&path, serde_json::json!({ "entries": entries }).to_string()).expect("write");

        let mut legacy = HistoryStore::open(&path).expect("open legacy");
        assert_eq!(legacy.record(run("d", 1)).expect("d").id, 4);

        let _ = fs::remove_file(path);
    }
}
