// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Key-Value Store
//!
//! Default backend for tests and ephemeral sessions. Quota accounting charges
//! the byte length of every stored key and value, so quota-exceeded recovery
//! paths can be exercised deterministically.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;

use crate::domain::storage::{KeyValueStore, KvChange, StorageError, WriterId};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// HashMap-backed store with optional byte quota
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<u64>,
    changes: broadcast::Sender<KvChange>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Store rejecting writes once total stored bytes would exceed `quota_bytes`
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self::build(Some(quota_bytes))
    }

    fn build(quota_bytes: Option<u64>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes,
            changes,
        }
    }

    fn usage(entries: &HashMap<String, String>) -> u64 {
        entries
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum()
    }

    fn notify(&self, key: &str, new_value: Option<String>, writer: WriterId) {
        // Nobody listening is fine
        let _ = self.changes.send(KvChange {
            key: key.to_string(),
            new_value,
            writer,
        });
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    async fn put(&self, key: &str, value: &str, writer: WriterId) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.write();
            if let Some(limit) = self.quota_bytes {
                let existing = entries.get(key).map(|v| (key.len() + v.len()) as u64);
                let attempted = Self::usage(&entries) - existing.unwrap_or(0)
                    + (key.len() + value.len()) as u64;
                if attempted > limit {
                    return Err(StorageError::QuotaExceeded {
                        key: key.to_string(),
                        limit_bytes: limit,
                        attempted_bytes: attempted,
                    });
                }
            }
            entries.insert(key.to_string(), value.to_string());
        }
        self.notify(key, Some(value.to_string()), writer);
        Ok(())
    }

    async fn remove(&self, key: &str, writer: WriterId) -> Result<(), StorageError> {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.notify(key, None, writer);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<KvChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_remove() {
        let kv = MemoryKv::new();
        let writer = WriterId::new();

        assert_eq!(kv.get("k").await, None);
        kv.put("k", "v", writer).await.unwrap();
        assert_eq!(kv.get("k").await.as_deref(), Some("v"));
        kv.remove("k", writer).await.unwrap();
        assert_eq!(kv.get("k").await, None);
    }

    #[tokio::test]
    async fn test_quota_rejects_oversized_write() {
        let kv = MemoryKv::with_quota(16);
        let writer = WriterId::new();

        kv.put("a", "12345", writer).await.unwrap();
        let err = kv.put("b", &"x".repeat(32), writer).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        // The rejected write must not clobber existing state
        assert_eq!(kv.get("a").await.as_deref(), Some("12345"));
        assert_eq!(kv.get("b").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_releases_old_bytes() {
        let kv = MemoryKv::with_quota(12);
        let writer = WriterId::new();

        kv.put("key", "12345678", writer).await.unwrap();
        // Replacing the value frees its bytes before accounting the new ones
        kv.put("key", "87654321", writer).await.unwrap();
        assert_eq!(kv.get("key").await.as_deref(), Some("87654321"));
    }

    #[tokio::test]
    async fn test_changes_carry_writer_id() {
        let kv = MemoryKv::new();
        let writer = WriterId::new();
        let mut rx = kv.subscribe();

        kv.put("k", "v", writer).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, "k");
        assert_eq!(change.new_value.as_deref(), Some("v"));
        assert_eq!(change.writer, writer);

        kv.remove("k", writer).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert!(change.new_value.is_none());
    }

    #[tokio::test]
    async fn test_removing_absent_key_is_silent() {
        let kv = MemoryKv::new();
        let mut rx = kv.subscribe();
        kv.remove("missing", WriterId::new()).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
