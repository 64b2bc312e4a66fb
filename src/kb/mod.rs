//! Knowledge base: durable store of ingested sources and their items.
//!
//! The store is file-backed and crash-safe:
//! - an append-only record log with CRC32-framed JSON records
//! - an exclusive directory lock for single-process access
//! - in-memory indexes rebuilt by replaying the log on open
//!
//! Both row kinds are append-only: snapshots record every fetch attempt's
//! raw content and cache validators, items accumulate without deduplication.

mod codec;
mod file_lock;
mod log;
mod store;

pub use file_lock::FileLock;
pub use log::{KbRecord, LogIterator, RecordLog};
pub use store::KnowledgeBase;

use serde::{Deserialize, Serialize};

/// One immutable record of a fetched source.
///
/// A new row is appended per ingestion attempt; rows are never updated or
/// deleted. `fetched_at` is the wall-clock time of ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    /// Configured source name.
    pub name: String,
    /// Source URL; the correlation key with item rows.
    pub url: String,
    /// Ingestion time, seconds since epoch.
    pub fetched_at: i64,
    /// `ETag` validator from the fetch response, if present.
    pub etag: Option<String>,
    /// `Last-Modified` validator from the fetch response, if present.
    pub last_modified: Option<String>,
    /// Raw fetched body, if any.
    pub content: Option<String>,
}

/// One parsed feed entry, as persisted.
///
/// `source_url` is a foreign key by value, not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// URL of the source this item came from.
    pub source_url: String,
    /// Entry title.
    pub title: String,
    /// Entry link.
    pub url: String,
    /// Publication time, seconds since epoch; 0 if unknown.
    pub published: i64,
    /// Entry body, possibly empty.
    pub content: String,
}

/// A not-yet-persisted item, as handed to [`KnowledgeBase::add_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Entry title.
    pub title: String,
    /// Entry link.
    pub url: String,
    /// Publication time, seconds since epoch; 0 if unknown.
    pub published: i64,
    /// Entry body, possibly empty.
    pub content: String,
}

/// The shape returned by [`KnowledgeBase::latest_items`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Entry title.
    pub title: String,
    /// Entry link.
    pub url: String,
    /// Publication time, seconds since epoch; 0 if unknown.
    pub published: i64,
}

/// Store configuration.
#[derive(Debug, Clone, Copy)]
pub struct KbConfig {
    /// Whether to fsync after every committed record (slower but safer).
    pub sync_on_write: bool,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
        }
    }
}
