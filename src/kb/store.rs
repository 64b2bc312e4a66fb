//! The knowledge-base store.
//!
//! Wraps the append-only [`RecordLog`] with in-memory indexes rebuilt by
//! replay on open. Reads may happen concurrently with writes (interior
//! `RwLock`), but there is exactly one logical writer: the process holding
//! the directory lock.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use crate::error::StoreError;

use super::file_lock::FileLock;
use super::log::{KbRecord, RecordLog};
use super::{Item, ItemSummary, KbConfig, NewItem, SourceSnapshot};

/// In-memory view of the committed rows.
#[derive(Default)]
struct KbState {
    /// Snapshot rows in commit order.
    snapshots: Vec<SourceSnapshot>,
    /// Item rows in commit order.
    items: Vec<Item>,
    /// Index: `items.source_url` → positions in `items`.
    items_by_source: HashMap<String, Vec<usize>>,
}

impl KbState {
    fn apply(&mut self, record: KbRecord) {
        match record {
            KbRecord::Snapshot(snapshot) => self.snapshots.push(snapshot),
            KbRecord::Item(item) => {
                self.items_by_source
                    .entry(item.source_url.clone())
                    .or_default()
                    .push(self.items.len());
                self.items.push(item);
            }
        }
    }
}

/// Durable, single-writer store of source snapshots and feed items.
///
/// Opened once per process invocation and exclusively owned by it for its
/// lifetime; a second open of the same directory fails with
/// [`StoreError::Locked`].
pub struct KnowledgeBase {
    dir: PathBuf,
    _lock: FileLock,
    log: RecordLog,
    state: RwLock<KbState>,
}

impl KnowledgeBase {
    /// Opens or creates a knowledge base in `dir`.
    ///
    /// Replays the record log to rebuild the in-memory indexes. All rows
    /// committed by previous invocations are visible after open.
    ///
    /// # Errors
    /// - [`StoreError::Locked`] if another process holds the directory lock
    /// - [`StoreError::Io`] for any filesystem failure
    pub fn open(dir: &Path, config: KbConfig) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;

        let lock = FileLock::acquire(dir).map_err(|e| {
            if e.kind() == ErrorKind::WouldBlock {
                StoreError::Locked
            } else {
                StoreError::Io(e)
            }
        })?;

        let log = RecordLog::open(&dir.join("kb.log"), config.sync_on_write)?;

        let mut state = KbState::default();
        for record in log.iter()? {
            state.apply(record?);
        }
        debug!(
            dir = %dir.display(),
            snapshots = state.snapshots.len(),
            items = state.items.len(),
            "knowledge base opened"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            _lock: lock,
            log,
            state: RwLock::new(state),
        })
    }

    /// Directory this store lives in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Appends one snapshot row for a fetched source, stamped with the
    /// current wall-clock time.
    ///
    /// Despite the historical name this is an append, not a true upsert:
    /// every call creates a new row, even for a repeated `(name, url)`.
    ///
    /// # Errors
    /// Propagates any commit failure; the row is either durably appended or
    /// not appended at all.
    pub fn upsert_source(
        &self,
        name: &str,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
        content: Option<&str>,
    ) -> Result<(), StoreError> {
        let snapshot = SourceSnapshot {
            name: name.to_string(),
            url: url.to_string(),
            fetched_at: Utc::now().timestamp(),
            etag: etag.map(ToOwned::to_owned),
            last_modified: last_modified.map(ToOwned::to_owned),
            content: content.map(ToOwned::to_owned),
        };

        self.log.append(&KbRecord::Snapshot(snapshot.clone()))?;
        self.write_state().apply(KbRecord::Snapshot(snapshot));
        Ok(())
    }

    /// Appends one item row per entry, associated to `source_url`.
    ///
    /// An empty entry list is a no-op. Entries are committed individually;
    /// if a commit fails partway, the rows written before the failure remain
    /// committed (the commit point is per record).
    ///
    /// # Errors
    /// Propagates the first commit failure.
    pub fn add_items(&self, source_url: &str, entries: &[NewItem]) -> Result<(), StoreError> {
        for entry in entries {
            let item = Item {
                source_url: source_url.to_string(),
                title: entry.title.clone(),
                url: entry.url.clone(),
                published: entry.published,
                content: entry.content.clone(),
            };
            self.log.append(&KbRecord::Item(item.clone()))?;
            self.write_state().apply(KbRecord::Item(item));
        }
        Ok(())
    }

    /// Up to `limit` items across all sources, ordered by `published`
    /// descending. Items with an unknown publication time (`published == 0`)
    /// sort last; ties keep commit order.
    #[must_use]
    pub fn latest_items(&self, limit: usize) -> Vec<ItemSummary> {
        let state = self.read_state();
        let mut summaries: Vec<ItemSummary> = state
            .items
            .iter()
            .map(|item| ItemSummary {
                title: item.title.clone(),
                url: item.url.clone(),
                published: item.published,
            })
            .collect();
        // Stable sort keeps commit order within equal timestamps.
        summaries.sort_by_key(|s| Reverse(s.published));
        summaries.truncate(limit);
        summaries
    }

    /// All snapshot rows for a source URL, in commit order.
    #[must_use]
    pub fn snapshots_for(&self, url: &str) -> Vec<SourceSnapshot> {
        let state = self.read_state();
        state
            .snapshots
            .iter()
            .filter(|s| s.url == url)
            .cloned()
            .collect()
    }

    /// All item rows for a source URL, in commit order.
    #[must_use]
    pub fn items_for(&self, source_url: &str) -> Vec<Item> {
        let state = self.read_state();
        state
            .items_by_source
            .get(source_url)
            .map(|positions| positions.iter().map(|&i| state.items[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Total number of snapshot rows.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.read_state().snapshots.len()
    }

    /// Total number of item rows.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.read_state().items.len()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, KbState> {
        // A poisoned lock means a panic mid-read elsewhere; the state itself
        // is only mutated after a successful log commit, so it is still
        // coherent.
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, KbState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config() -> KbConfig {
        KbConfig {
            sync_on_write: false,
        }
    }

    fn entry(title: &str, url: &str, published: i64) -> NewItem {
        NewItem {
            title: title.to_string(),
            url: url.to_string(),
            published,
            content: String::new(),
        }
    }

    #[test]
    fn repeated_upsert_creates_distinct_snapshot_rows() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();

        kb.upsert_source("Feed", "https://example.org/feed", Some("\"v1\""), None, Some("a"))
            .unwrap();
        kb.upsert_source("Feed", "https://example.org/feed", Some("\"v2\""), None, Some("b"))
            .unwrap();

        let rows = kb.snapshots_for("https://example.org/feed");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].etag.as_deref(), Some("\"v1\""));
        assert_eq!(rows[1].etag.as_deref(), Some("\"v2\""));
    }

    #[test]
    fn add_items_with_empty_list_is_a_noop() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();

        kb.add_items("https://example.org/feed", &[]).unwrap();
        assert_eq!(kb.item_count(), 0);
    }

    #[test]
    fn latest_items_orders_by_published_desc_with_unknown_last() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();

        kb.add_items(
            "https://example.org/feed",
            &[
                entry("old", "https://example.org/1", 100),
                entry("unknown", "https://example.org/2", 0),
                entry("new", "https://example.org/3", 300),
                entry("mid", "https://example.org/4", 200),
            ],
        )
        .unwrap();

        let latest = kb.latest_items(10);
        let titles: Vec<&str> = latest.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["new", "mid", "old", "unknown"]);
    }

    #[test]
    fn latest_items_ties_keep_commit_order() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();

        kb.add_items(
            "https://example.org/feed",
            &[
                entry("first", "https://example.org/a", 50),
                entry("second", "https://example.org/b", 50),
            ],
        )
        .unwrap();

        let latest = kb.latest_items(10);
        assert_eq!(latest[0].title, "first");
        assert_eq!(latest[1].title, "second");
    }

    #[test]
    fn latest_items_respects_limit() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();

        let entries: Vec<NewItem> = (0..5)
            .map(|i| entry(&format!("e{i}"), &format!("https://example.org/{i}"), i))
            .collect();
        kb.add_items("https://example.org/feed", &entries).unwrap();

        assert_eq!(kb.latest_items(3).len(), 3);
    }

    #[test]
    fn reingestion_accumulates_duplicate_items() {
        // Append-only history: no dedup by (source_url, url).
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();

        let batch = [entry("v1.0", "https://example.org/v1", 10)];
        kb.add_items("https://example.org/feed", &batch).unwrap();
        kb.add_items("https://example.org/feed", &batch).unwrap();

        assert_eq!(kb.item_count(), 2);
        assert_eq!(kb.items_for("https://example.org/feed").len(), 2);
    }

    #[test]
    fn committed_rows_survive_reopen() {
        let dir = tempdir().unwrap();

        {
            let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();
            kb.upsert_source("Feed", "https://example.org/feed", None, Some("yesterday"), None)
                .unwrap();
            kb.add_items(
                "https://example.org/feed",
                &[entry("kept", "https://example.org/kept", 42)],
            )
            .unwrap();
        }

        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();
        assert_eq!(kb.snapshot_count(), 1);
        assert_eq!(kb.item_count(), 1);
        let snapshot = &kb.snapshots_for("https://example.org/feed")[0];
        assert_eq!(snapshot.last_modified.as_deref(), Some("yesterday"));
        assert!(snapshot.fetched_at > 0);
    }

    #[test]
    fn second_open_of_same_directory_is_locked() {
        let dir = tempdir().unwrap();
        let _kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();

        let second = KnowledgeBase::open(dir.path(), test_config());
        assert!(matches!(second, Err(StoreError::Locked)));
    }

    #[test]
    fn items_for_unknown_source_is_empty() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::open(dir.path(), test_config()).unwrap();
        assert!(kb.items_for("https://example.org/nowhere").is_empty());
    }
}
