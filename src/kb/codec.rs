//! Record framing for the knowledge-base log.
//!
//! Every record is serialized as JSON and framed with a version byte, a
//! little-endian length prefix and a CRC32 trailer, so a torn write at the
//! tail of the log is detected instead of replayed:
//!
//! ```text
//! [version: 1 byte][length: 4 bytes LE][payload: N bytes JSON][crc32: 4 bytes LE]
//! ```
//!
//! The log file itself opens with magic bytes and the same version byte.

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

/// Current framing version.
const FRAME_VERSION: u8 = 1;

/// Magic bytes identifying a practica knowledge-base log.
pub const MAGIC: [u8; 4] = *b"PRKB";

/// Records larger than this are rejected as corrupt. Feed bodies are at most
/// a few hundred kilobytes; 16 MiB leaves ample headroom.
const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// Frames a record for appending to the log.
pub fn encode<T: Serialize>(record: &T) -> IoResult<Vec<u8>> {
    let payload = serde_json::to_vec(record)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("encode failed: {e}")))?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let crc = hasher.finalize();

    #[allow(clippy::cast_possible_truncation)]
    let len = payload.len() as u32;

    let mut framed = Vec::with_capacity(1 + 4 + payload.len() + 4);
    framed.push(FRAME_VERSION);
    framed.extend_from_slice(&len.to_le_bytes());
    framed.extend_from_slice(&payload);
    framed.extend_from_slice(&crc.to_le_bytes());
    Ok(framed)
}

/// Reads one framed record, verifying length bound and checksum.
///
/// # Errors
/// - `UnexpectedEof` if the reader ends mid-record (torn write)
/// - `InvalidData` on version mismatch, oversized length, checksum mismatch,
///   or undecodable payload
pub fn decode<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<T> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != FRAME_VERSION {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("unknown frame version {}", version[0]),
        ));
    }

    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_RECORD_SIZE {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("record length {len} exceeds maximum {MAX_RECORD_SIZE}"),
        ));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    let mut crc_bytes = [0u8; 4];
    reader.read_exact(&mut crc_bytes)?;
    let stored = u32::from_le_bytes(crc_bytes);

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let computed = hasher.finalize();
    if stored != computed {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("checksum mismatch: stored={stored:08x} computed={computed:08x}"),
        ));
    }

    serde_json::from_slice(&payload)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("decode failed: {e}")))
}

/// Writes the log file header.
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[FRAME_VERSION])?;
    Ok(())
}

/// Size of the log file header in bytes.
pub const HEADER_LEN: u64 = MAGIC.len() as u64 + 1;

/// Reads and validates the log file header, returning the version byte.
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            "not a practica knowledge-base log (bad magic)",
        ));
    }

    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    Ok(version[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn roundtrip() {
        let record = vec!["one".to_string(), "two".to_string()];
        let framed = encode(&record).unwrap();
        let decoded: Vec<String> = decode(&mut Cursor::new(framed)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let mut framed = encode(&"snapshot body".to_string()).unwrap();
        framed[8] ^= 0x01;
        let result: IoResult<String> = decode(&mut Cursor::new(framed));
        assert!(result.is_err());
    }

    #[test]
    fn oversized_length_is_rejected_without_allocation() {
        let mut bad = vec![FRAME_VERSION];
        bad.extend_from_slice(&u32::MAX.to_le_bytes());
        let result: IoResult<String> = decode(&mut Cursor::new(bad));
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn truncated_record_is_unexpected_eof() {
        let framed = encode(&"partial".to_string()).unwrap();
        let truncated = &framed[..framed.len() - 3];
        let result: IoResult<String> = decode(&mut Cursor::new(truncated));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn header_roundtrip() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_LEN);
        let version = read_header(&mut Cursor::new(buf)).unwrap();
        assert_eq!(version, FRAME_VERSION);
    }

    #[test]
    fn foreign_file_is_rejected_by_magic() {
        let result = read_header(&mut Cursor::new(b"SQLi3\x00".to_vec()));
        assert!(result.is_err());
    }
}
