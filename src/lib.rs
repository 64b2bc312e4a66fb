//! # Practica — repository best-practice advisor
//!
//! Practica inspects a source repository, derives a small set of structural
//! facts (languages present, linter presence), and matches those facts
//! against a declarative rule set to produce prioritized, human-tunable
//! recommendations. A local knowledge base of fetched release feeds enriches
//! the report with "latest intel".
//!
//! ## Core pieces
//!
//! - [`FactSet`]: observations produced by the scanner
//! - [`match_rules`]: pure predicate evaluation, stable rule order
//! - [`KnowledgeBase`]: durable append-only store of snapshots and items
//! - [`refresh`]: per-source ingestion with failure isolation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use practica::{match_rules, scan_repo, KbConfig, KnowledgeBase, Settings};
//!
//! let settings = Settings::builtin();
//! let kb = KnowledgeBase::open("practica.kb".as_ref(), KbConfig::default())?;
//!
//! let facts = scan_repo(".".as_ref());
//! let suggestions = match_rules(&settings.rules, &facts);
//! let intel = kb.latest_items(10);
//! # Ok::<(), practica::AdvisorError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod facts;
pub mod fetch;
pub mod ingest;
pub mod kb;
pub mod render;
pub mod rules;
pub mod scan;

// Re-export primary types at crate root for convenience
pub use config::{ParserKind, Settings, Source};
pub use error::{AdvisorError, AdvisorResult, FetchError, StoreError};
pub use facts::{FactSet, FactValue};
pub use fetch::{parse_feed, FeedClient, FeedEntry, FeedFetch, HttpClient, PageFetch, ResponseMeta};
pub use ingest::{refresh, IngestStatus, SourceOutcome};
pub use kb::{Item, ItemSummary, KbConfig, KnowledgeBase, NewItem, SourceSnapshot};
pub use render::{render, Tone};
pub use rules::{match_rules, MatchResult, Rule, Severity};
pub use scan::scan_repo;
