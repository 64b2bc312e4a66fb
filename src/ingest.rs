//! Ingestion orchestrator.
//!
//! Processes configured sources strictly sequentially. The key design
//! property is isolation: a failing fetch is logged and skipped so one bad
//! source never aborts the batch. Store failures are different — a broken
//! store invalidates the whole run and propagates immediately.

use tracing::{info, warn};

use crate::config::{ParserKind, Source};
use crate::error::{FetchError, StoreError};
use crate::fetch::{FeedClient, FeedEntry};
use crate::kb::{KnowledgeBase, NewItem};

/// What happened to a single source during a refresh.
#[derive(Debug)]
pub enum IngestStatus {
    /// Snapshot committed; `items` entries were appended.
    Ingested {
        /// Number of item rows appended.
        items: usize,
    },
    /// The source's parser kind has no fetch capability yet; nothing was
    /// fetched or written, by design without a diagnostic.
    Skipped,
    /// The fetch failed; the source was skipped and the batch continued.
    Failed(FetchError),
}

/// Per-source outcome of a refresh batch.
#[derive(Debug)]
pub struct SourceOutcome {
    /// Configured source name.
    pub name: String,
    /// Source URL.
    pub url: String,
    /// What happened.
    pub status: IngestStatus,
}

impl SourceOutcome {
    /// Returns true if the source failed to ingest.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.status, IngestStatus::Failed(_))
    }
}

fn to_new_items(entries: &[FeedEntry]) -> Vec<NewItem> {
    entries
        .iter()
        .map(|e| NewItem {
            title: e.title.clone(),
            url: e.url.clone(),
            published: e.published_ts,
            content: e.content.clone(),
        })
        .collect()
}

/// Refreshes the knowledge base from the configured sources, in list order.
///
/// For each source: dispatch on its parser kind, commit a snapshot of the
/// fetched body, and append any parsed entries. Unimplemented parser kinds
/// (`json`, `auto`) are silent no-ops. No retry, no backoff — a failed
/// source waits for the next manual refresh.
///
/// # Errors
/// Only [`StoreError`] aborts the batch; fetch failures become
/// [`IngestStatus::Failed`] outcomes with a warning log.
pub fn refresh(
    kb: &KnowledgeBase,
    sources: &[Source],
    client: &dyn FeedClient,
) -> Result<Vec<SourceOutcome>, StoreError> {
    let mut outcomes = Vec::with_capacity(sources.len());

    for source in sources {
        let status = ingest_source(kb, source, client)?;
        match &status {
            IngestStatus::Ingested { items } => {
                info!(source = %source.name, url = %source.url, items, "source ingested");
            }
            IngestStatus::Skipped => {}
            IngestStatus::Failed(e) => {
                warn!(source = %source.name, url = %source.url, error = %e, "failed to fetch source");
            }
        }
        outcomes.push(SourceOutcome {
            name: source.name.clone(),
            url: source.url.clone(),
            status,
        });
    }

    Ok(outcomes)
}

fn ingest_source(
    kb: &KnowledgeBase,
    source: &Source,
    client: &dyn FeedClient,
) -> Result<IngestStatus, StoreError> {
    match source.parser {
        ParserKind::Rss => match client.fetch_feed(&source.url) {
            Ok(fetch) => {
                kb.upsert_source(
                    &source.name,
                    &source.url,
                    fetch.meta.etag.as_deref(),
                    fetch.meta.last_modified.as_deref(),
                    Some(&fetch.body),
                )?;
                let mut appended = 0;
                if !fetch.entries.is_empty() {
                    let items = to_new_items(&fetch.entries);
                    kb.add_items(&source.url, &items)?;
                    appended = items.len();
                }
                Ok(IngestStatus::Ingested { items: appended })
            }
            Err(e) => Ok(IngestStatus::Failed(e)),
        },
        ParserKind::Html => match client.fetch_page(&source.url) {
            Ok(fetch) => {
                kb.upsert_source(
                    &source.name,
                    &source.url,
                    fetch.meta.etag.as_deref(),
                    fetch.meta.last_modified.as_deref(),
                    Some(&fetch.body),
                )?;
                Ok(IngestStatus::Ingested { items: 0 })
            }
            Err(e) => Ok(IngestStatus::Failed(e)),
        },
        // No fetch capability yet; skip without a diagnostic.
        ParserKind::Json | ParserKind::Auto => Ok(IngestStatus::Skipped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FeedFetch, PageFetch, ResponseMeta};
    use crate::kb::KbConfig;
    use tempfile::tempdir;

    /// Scripted client: each URL is mapped to a canned result.
    struct StubClient {
        feeds: Vec<(String, Result<FeedFetch, FetchError>)>,
        pages: Vec<(String, Result<PageFetch, FetchError>)>,
    }

    impl StubClient {
        fn new() -> Self {
            Self {
                feeds: Vec::new(),
                pages: Vec::new(),
            }
        }

        fn feed_ok(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
            self.feeds.push((
                url.to_string(),
                Ok(FeedFetch {
                    entries,
                    body: "<feed/>".to_string(),
                    meta: ResponseMeta {
                        etag: Some("\"abc\"".to_string()),
                        last_modified: None,
                    },
                }),
            ));
            self
        }

        fn feed_err(mut self, url: &str, err: FetchError) -> Self {
            self.feeds.push((url.to_string(), Err(err)));
            self
        }

        fn page_ok(mut self, url: &str, body: &str) -> Self {
            self.pages.push((
                url.to_string(),
                Ok(PageFetch {
                    body: body.to_string(),
                    meta: ResponseMeta::default(),
                }),
            ));
            self
        }
    }

    impl FeedClient for StubClient {
        fn fetch_feed(&self, url: &str) -> Result<FeedFetch, FetchError> {
            match self.feeds.iter().find(|(u, _)| u == url) {
                Some((_, Ok(fetch))) => Ok(fetch.clone()),
                Some((_, Err(e))) => Err(FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }),
                None => panic!("unexpected feed fetch: {url}"),
            }
        }

        fn fetch_page(&self, url: &str) -> Result<PageFetch, FetchError> {
            match self.pages.iter().find(|(u, _)| u == url) {
                Some((_, Ok(fetch))) => Ok(fetch.clone()),
                Some((_, Err(e))) => Err(FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }),
                None => panic!("unexpected page fetch: {url}"),
            }
        }
    }

    fn open_kb(dir: &std::path::Path) -> KnowledgeBase {
        KnowledgeBase::open(
            dir,
            KbConfig {
                sync_on_write: false,
            },
        )
        .unwrap()
    }

    fn entry(title: &str) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            url: format!("https://example.org/{title}"),
            published_ts: 100,
            content: String::new(),
        }
    }

    fn rss_source(name: &str, url: &str) -> Source {
        Source::rss(name, url)
    }

    #[test]
    fn one_failing_source_does_not_abort_the_batch() {
        let dir = tempdir().unwrap();
        let kb = open_kb(dir.path());

        let client = StubClient::new()
            .feed_err(
                "https://bad.example/feed",
                FetchError::Network {
                    url: "https://bad.example/feed".to_string(),
                    message: "connection refused".to_string(),
                },
            )
            .feed_ok("https://good.example/feed", vec![entry("v1")]);

        let sources = [
            rss_source("Bad", "https://bad.example/feed"),
            rss_source("Good", "https://good.example/feed"),
        ];

        let outcomes = refresh(&kb, &sources, &client).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_failure());
        assert!(!outcomes[1].is_failure());

        // Exactly one new snapshot: the succeeding source's.
        assert_eq!(kb.snapshot_count(), 1);
        assert_eq!(kb.snapshots_for("https://good.example/feed").len(), 1);
        assert_eq!(kb.item_count(), 1);
    }

    #[test]
    fn all_sources_failing_leaves_an_empty_but_valid_kb() {
        let dir = tempdir().unwrap();
        let kb = open_kb(dir.path());

        let client = StubClient::new()
            .feed_err(
                "https://a.example/feed",
                FetchError::MalformedFeed {
                    message: "bad xml".to_string(),
                },
            )
            .feed_err(
                "https://b.example/feed",
                FetchError::Status {
                    url: "https://b.example/feed".to_string(),
                    status: 500,
                },
            );

        let sources = [
            rss_source("A", "https://a.example/feed"),
            rss_source("B", "https://b.example/feed"),
        ];

        let outcomes = refresh(&kb, &sources, &client).unwrap();
        assert!(outcomes.iter().all(SourceOutcome::is_failure));
        assert_eq!(kb.snapshot_count(), 0);
        assert_eq!(kb.item_count(), 0);
        assert!(kb.latest_items(10).is_empty());
    }

    #[test]
    fn feed_with_no_entries_still_snapshots() {
        let dir = tempdir().unwrap();
        let kb = open_kb(dir.path());

        let client = StubClient::new().feed_ok("https://empty.example/feed", vec![]);
        let sources = [rss_source("Empty", "https://empty.example/feed")];

        let outcomes = refresh(&kb, &sources, &client).unwrap();
        assert!(matches!(
            outcomes[0].status,
            IngestStatus::Ingested { items: 0 }
        ));
        assert_eq!(kb.snapshot_count(), 1);
        assert_eq!(kb.item_count(), 0);
    }

    #[test]
    fn html_sources_snapshot_without_items() {
        let dir = tempdir().unwrap();
        let kb = open_kb(dir.path());

        let client = StubClient::new().page_ok("https://docs.example/style", "<html/>");
        let sources = [Source {
            name: "Style guide".to_string(),
            url: "https://docs.example/style".to_string(),
            parser: ParserKind::Html,
        }];

        refresh(&kb, &sources, &client).unwrap();
        let snapshot = &kb.snapshots_for("https://docs.example/style")[0];
        assert_eq!(snapshot.content.as_deref(), Some("<html/>"));
        assert_eq!(kb.item_count(), 0);
    }

    #[test]
    fn unimplemented_parser_kinds_are_silent_noops() {
        let dir = tempdir().unwrap();
        let kb = open_kb(dir.path());

        let client = StubClient::new();
        let sources = [
            Source {
                name: "Json later".to_string(),
                url: "https://json.example/api".to_string(),
                parser: ParserKind::Json,
            },
            Source {
                name: "Auto later".to_string(),
                url: "https://auto.example/feed".to_string(),
                parser: ParserKind::Auto,
            },
        ];

        let outcomes = refresh(&kb, &sources, &client).unwrap();
        assert!(outcomes
            .iter()
            .all(|o| matches!(o.status, IngestStatus::Skipped)));
        assert_eq!(kb.snapshot_count(), 0);
    }

    #[test]
    fn snapshot_carries_cache_validators() {
        let dir = tempdir().unwrap();
        let kb = open_kb(dir.path());

        let client = StubClient::new().feed_ok("https://good.example/feed", vec![entry("v2")]);
        let sources = [rss_source("Good", "https://good.example/feed")];

        refresh(&kb, &sources, &client).unwrap();
        let snapshot = &kb.snapshots_for("https://good.example/feed")[0];
        assert_eq!(snapshot.etag.as_deref(), Some("\"abc\""));
        assert!(snapshot.last_modified.is_none());
        assert_eq!(snapshot.content.as_deref(), Some("<feed/>"));
    }
}
