//! Append-only record log backing the knowledge base.
//!
//! The log is the store: the knowledge base is append-only by contract, so
//! there is no separate compacted representation. Durability comes from the
//! commit discipline — each append is flushed (and optionally fsynced)
//! before it is acknowledged — and from the framing in [`super::codec`],
//! which lets replay detect a torn tail record and trim it.
//!
//! # File format
//! ```text
//! [MAGIC "PRKB"][version: 1 byte]
//! [record 1: framed KbRecord]
//! [record 2: framed KbRecord]
//! ...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Result as IoResult, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::codec;
use super::{Item, SourceSnapshot};

/// One committed row in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum KbRecord {
    /// A fetched-source snapshot row.
    Snapshot(SourceSnapshot),
    /// A parsed feed-entry row.
    Item(Item),
}

/// Append-only log of [`KbRecord`]s.
///
/// Thread-safe via an internal mutex; writes are serialized, which matches
/// the single-writer contract of the store.
pub struct RecordLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    sync_on_write: bool,
}

impl RecordLog {
    /// Opens or creates the log at `path`.
    ///
    /// An existing log is scanned once; if a torn or corrupt tail is found
    /// (for example after a crash mid-append), the file is truncated back to
    /// the last fully committed record so later appends land on a clean
    /// boundary.
    pub fn open(path: &Path, sync_on_write: bool) -> IoResult<Self> {
        let fresh = !path.exists() || std::fs::metadata(path)?.len() < codec::HEADER_LEN;

        if fresh {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            codec::write_header(&mut file)?;
            if sync_on_write {
                file.sync_all()?;
            }
        } else {
            Self::trim_torn_tail(path, sync_on_write)?;
        }

        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
            sync_on_write,
        })
    }

    /// Appends one record and commits it.
    ///
    /// The record is fully on its way to disk (flushed, and fsynced when the
    /// log was opened with `sync_on_write`) before this returns. A crash
    /// mid-append leaves a torn frame that the next open trims, so a record
    /// is either durably present or absent — never partial.
    pub fn append(&self, record: &KbRecord) -> IoResult<()> {
        let framed = codec::encode(record)?;

        // A poisoned lock means a panic mid-write elsewhere; the next open
        // trims any torn frame, so writing past it is safe.
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        writer.write_all(&framed)?;
        writer.flush()?;
        if self.sync_on_write {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Iterates every committed record, in append order.
    pub fn iter(&self) -> IoResult<LogIterator> {
        LogIterator::new(&self.path)
    }

    /// Current log size in bytes.
    pub fn size_bytes(&self) -> IoResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Scans the log and truncates anything after the last valid record.
    fn trim_torn_tail(path: &Path, sync: bool) -> IoResult<()> {
        let file_len = std::fs::metadata(path)?.len();

        let mut iter = LogIterator::new(path)?;
        let mut records = 0u64;
        let mut valid_up_to = codec::HEADER_LEN;
        loop {
            match iter.next() {
                Some(Ok(_)) => {
                    records += 1;
                    valid_up_to = iter.byte_offset()?;
                }
                Some(Err(e)) => {
                    warn!(
                        path = %path.display(),
                        records,
                        offset = valid_up_to,
                        error = %e,
                        "knowledge-base log has a torn tail; trimming"
                    );
                    break;
                }
                None => break,
            }
        }

        if valid_up_to < file_len {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_up_to)?;
            if sync {
                file.sync_all()?;
            }
        }
        Ok(())
    }
}

/// Iterator over committed log records.
pub struct LogIterator {
    reader: BufReader<File>,
    file_size: u64,
}

impl LogIterator {
    fn new(path: &Path) -> IoResult<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        codec::read_header(&mut reader)?;
        Ok(Self { reader, file_size })
    }

    fn byte_offset(&mut self) -> IoResult<u64> {
        self.reader.stream_position()
    }

    fn at_eof(&mut self) -> IoResult<bool> {
        Ok(self.byte_offset()? >= self.file_size)
    }
}

impl Iterator for LogIterator {
    type Item = IoResult<KbRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.at_eof() {
            Ok(true) => return None,
            Ok(false) => {}
            Err(e) => return Some(Err(e)),
        }

        match codec::decode(&mut self.reader) {
            Ok(record) => Some(Ok(record)),
            Err(e) => Some(Err(e)),
        }
    }
}
