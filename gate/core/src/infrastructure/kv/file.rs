// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON-File Key-Value Store
//!
//! Simple single-node durable backend: the whole namespace is one JSON
//! document on disk, rewritten atomically (temp file + rename) on every
//! mutation. Suitable for a local gate session; not for multi-node
//! deployments.
//!
//! A corrupt or unreadable document yields an empty namespace rather than a
//! propagated fault; the broken file is overwritten by the next write.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::storage::{KeyValueStore, KvChange, StorageError, WriterId};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// File-backed store with optional quota on the serialized document size
pub struct FileKv {
    path: PathBuf,
    quota_bytes: Option<u64>,
    entries: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<KvChange>,
}

impl FileKv {
    /// Open (or create) the document at `path`.
    pub fn open(path: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!(
                    "Failed to create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;

            // Verify the directory is writable before accepting writes later
            let probe = parent.join(".gate-storage-test");
            std::fs::write(&probe, b"test").map_err(|e| {
                StorageError::Io(format!(
                    "Data directory {} is not writable: {}",
                    parent.display(),
                    e
                ))
            })?;
            let _ = std::fs::remove_file(&probe);
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding corrupt store document");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            quota_bytes,
            entries: RwLock::new(entries),
            changes,
        })
    }

    fn persist(&self, entries: &HashMap<String, String>, key: &str) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(entries)?;

        if let Some(limit) = self.quota_bytes {
            let attempted = serialized.len() as u64;
            if attempted > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    limit_bytes: limit,
                    attempted_bytes: attempted,
                });
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serialized.as_bytes())
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            StorageError::Io(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }

    fn notify(&self, key: &str, new_value: Option<String>, writer: WriterId) {
        let _ = self.changes.send(KvChange {
            key: key.to_string(),
            new_value,
            writer,
        });
    }
}

#[async_trait]
impl KeyValueStore for FileKv {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    async fn put(&self, key: &str, value: &str, writer: WriterId) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.write();
            let mut candidate = entries.clone();
            candidate.insert(key.to_string(), value.to_string());
            self.persist(&candidate, key)?;
            *entries = candidate;
        }
        self.notify(key, Some(value.to_string()), writer);
        Ok(())
    }

    async fn remove(&self, key: &str, writer: WriterId) -> Result<(), StorageError> {
        let removed = {
            let mut entries = self.entries.write();
            if !entries.contains_key(key) {
                false
            } else {
                let mut candidate = entries.clone();
                candidate.remove(key);
                self.persist(&candidate, key)?;
                *entries = candidate;
                true
            }
        };
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
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let writer = WriterId::new();

        {
            let kv = FileKv::open(&path, None).unwrap();
            kv.put("k", "persisted", writer).await.unwrap();
        }

        let kv = FileKv::open(&path, None).unwrap();
        assert_eq!(kv.get("k").await.as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_corrupt_document_yields_empty_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let kv = FileKv::open(&path, None).unwrap();
        assert_eq!(kv.get("anything").await, None);

        // The next write replaces the broken document
        kv.put("k", "v", WriterId::new()).await.unwrap();
        let kv = FileKv::open(&path, None).unwrap();
        assert_eq!(kv.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_quota_applies_to_document_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let kv = FileKv::open(&path, Some(64)).unwrap();
        let writer = WriterId::new();

        kv.put("small", "ok", writer).await.unwrap();
        let err = kv
            .put("large", &"x".repeat(128), writer)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(kv.get("small").await.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let writer = WriterId::new();

        {
            let kv = FileKv::open(&path, None).unwrap();
            kv.put("k", "v", writer).await.unwrap();
            kv.remove("k", writer).await.unwrap();
        }

        let kv = FileKv::open(&path, None).unwrap();
        assert_eq!(kv.get("k").await, None);
    }
}
