//! # Migration Checksum
//!
//! CRC32 fingerprint of a migration file, stored in the ledger when the
//! migration is applied so later edits to an applied file can be spotted.

use crc32fast::Hasher;
use std::fs;
use std::io;
use std::path::Path;

/// Compute CRC32 checksum for migration content, formatted `crc32:XXXXXXXX`
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    format!("crc32:{:08X}", hasher.finalize())
}

/// Checksum of a file's bytes
pub fn checksum_file(path: &Path) -> io::Result<String> {
    let content = fs::read(path)?;
    Ok(compute_checksum(&content))
}

/// Whether `path` still has the checksum recorded at apply time.
///
/// Entries without a recorded checksum always match.
pub fn matches_recorded(path: &Path, recorded: &str) -> io::Result<bool> {
    if recorded.is_empty() {
        return Ok(true);
    }
    Ok(checksum_file(path)? == recorded)
}
