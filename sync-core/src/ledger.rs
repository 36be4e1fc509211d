//! Last-known content hash per file name.
//!
//! Both directions write here: the outbound path records what it sent, the
//! inbound path records what it wrote. A later filesystem event whose file
//! still hashes to the recorded value is therefore either a duplicate event
//! or the echo of a remote write, and needs no send.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use waveland_sync_types::ContentHash;

/// Concurrent map from base file name to its last synced [`ContentHash`].
#[derive(Debug, Default)]
pub struct HashLedger {
    hashes: DashMap<String, ContentHash>,
}

impl HashLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally record `hash` as the synced state of `name`.
    pub fn record(&self, name: &str, hash: ContentHash) {
        self.hashes.insert(name.to_string(), hash);
    }

    /// Record `hash` for `name` unless it is already the recorded value.
    ///
    /// Returns `true` if the hash changed (the caller should send), `false`
    /// if it matched. The compare and the store happen under one shard lock,
    /// so two racing callers with the same content cannot both see `true`.
    pub fn record_if_changed(&self, name: &str, hash: ContentHash) -> bool {
        match self.hashes.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == hash {
                    false
                } else {
                    entry.insert(hash);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(hash);
                true
            }
        }
    }

    /// Get the recorded hash for `name`.
    pub fn get(&self, name: &str) -> Option<ContentHash> {
        self.hashes.get(name).map(|h| *h)
    }

    /// Check whether `hash` is the recorded state of `name`.
    pub fn is_current(&self, name: &str, hash: &ContentHash) -> bool {
        self.hashes.get(name).is_some_and(|h| *h == *hash)
    }

    /// Drop the recorded hash for `name`, so its next send goes out even if
    /// the content is unchanged.
    pub fn forget(&self, name: &str) -> Option<ContentHash> {
        self.hashes.remove(name).map(|(_, hash)| hash)
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Check if no file has been synced yet.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
