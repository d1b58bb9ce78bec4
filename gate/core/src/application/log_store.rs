// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Activity Log Store
//!
//! Versioned persistence of [`ExecutionLog`] records over the key-value
//! abstraction, most-recent-first.
//!
//! # Failure policy
//!
//! - Schema version mismatch: the whole collection is discarded and the
//!   marker rewritten. Destructive migration, no partial upgrade path.
//! - Corrupt data: deserialization errors yield an empty collection, never a
//!   propagated fault.
//! - Quota exceeded on append: the collection is halved (oldest half
//!   dropped) and the write retried exactly once; a second failure is
//!   reported to the caller and not retried further.
//!
//! # Cross-instance consistency
//!
//! A change notification for the logs key from another writer triggers a
//! full reload of in-memory state. Last writer wins; no merge, no conflict
//! detection.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::events::LogStoreEvent;
use crate::domain::log::ExecutionLog;
use crate::domain::storage::{KeyValueStore, KvChange, StorageError, WriterId};
use crate::infrastructure::event_bus::EventBus;

/// Key holding the serialized log collection
pub const STORAGE_KEY: &str = "contract_gate.execution_logs";
/// Key holding the schema version marker
pub const STORAGE_VERSION_KEY: &str = "contract_gate.storage_version";
/// Current schema version
pub const STORAGE_VERSION: &str = "v1";

pub struct LogStore {
    kv: Arc<dyn KeyValueStore>,
    event_bus: Arc<EventBus>,
    writer: WriterId,
    logs: RwLock<Vec<ExecutionLog>>,
}

impl LogStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, event_bus: Arc<EventBus>) -> Self {
        Self {
            kv,
            event_bus,
            writer: WriterId::new(),
            logs: RwLock::new(Vec::new()),
        }
    }

    /// The writer id this store mutates under
    pub fn writer(&self) -> WriterId {
        self.writer
    }

    /// In-memory snapshot, most recent first
    pub fn logs(&self) -> Vec<ExecutionLog> {
        self.logs.read().clone()
    }

    /// Load the persisted collection into memory and return it.
    ///
    /// A version-marker mismatch discards the stored collection and rewrites
    /// the marker to the current version before reading.
    pub async fn load(&self) -> Vec<ExecutionLog> {
        let version = self.kv.get(STORAGE_VERSION_KEY).await;
        if version.as_deref() != Some(STORAGE_VERSION) {
            info!(
                found = version.as_deref().unwrap_or("<none>"),
                current = STORAGE_VERSION,
                "storage version mismatch, clearing old data"
            );
            if let Err(e) = self.kv.remove(STORAGE_KEY, self.writer).await {
                warn!(error = %e, "failed to clear outdated log collection");
            }
            if let Err(e) = self
                .kv
                .put(STORAGE_VERSION_KEY, STORAGE_VERSION, self.writer)
                .await
            {
                warn!(error = %e, "failed to rewrite storage version marker");
            }
        }

        let logs = match self.kv.get(STORAGE_KEY).await {
            Some(raw) => Self::parse(&raw),
            None => Vec::new(),
        };

        debug!(count = logs.len(), "loaded logs from storage");
        *self.logs.write() = logs.clone();
        logs
    }

    /// Prepend `log` and persist.
    ///
    /// On quota failure the collection is halved (newest entries kept) and
    /// the write retried once; a second failure is returned to the caller.
    pub async fn append(&self, log: ExecutionLog) -> Result<(), StorageError> {
        let mut new_logs = Vec::with_capacity(self.logs.read().len() + 1);
        new_logs.push(log);
        new_logs.extend(self.logs.read().iter().cloned());

        let serialized = serde_json::to_string(&new_logs)?;
        match self.kv.put(STORAGE_KEY, &serialized, self.writer).await {
            Ok(()) => {
                let count = new_logs.len();
                *self.logs.write() = new_logs;
                self.event_bus
                    .publish_store_event(LogStoreEvent::LogAppended { count });
                Ok(())
            }
            Err(StorageError::QuotaExceeded { .. }) => {
                warn!("storage quota exceeded, removing oldest logs");
                let before = new_logs.len();
                let reduced: Vec<ExecutionLog> =
                    new_logs.into_iter().take(before / 2).collect();
                let serialized = serde_json::to_string(&reduced)?;
                match self.kv.put(STORAGE_KEY, &serialized, self.writer).await {
                    Ok(()) => {
                        let after = reduced.len();
                        *self.logs.write() = reduced;
                        self.event_bus
                            .publish_store_event(LogStoreEvent::LogsTrimmed { before, after });
                        Ok(())
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to save logs even after reduction");
                        Err(e)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to save logs");
                Err(e)
            }
        }
    }

    /// Remove every entry and the persisted key. Idempotent.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(STORAGE_KEY, self.writer).await?;
        self.logs.write().clear();
        self.event_bus
            .publish_store_event(LogStoreEvent::LogsCleared);
        Ok(())
    }

    /// React to one observed store mutation.
    ///
    /// Returns `true` when the change was a foreign write to the logs key and
    /// in-memory state was reloaded from it.
    pub fn apply_change(&self, change: &KvChange) -> bool {
        if change.writer == self.writer || change.key != STORAGE_KEY {
            return false;
        }

        let logs = match &change.new_value {
            Some(raw) => Self::parse(raw),
            None => Vec::new(),
        };
        info!(count = logs.len(), "cross-instance sync: logs updated by another writer");
        let count = logs.len();
        *self.logs.write() = logs;
        self.event_bus
            .publish_store_event(LogStoreEvent::LogsReloaded { count });
        true
    }

    /// Follow the store's change channel until it closes.
    ///
    /// A lagged receiver falls back to a full reload from storage.
    pub fn spawn_sync(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        let mut rx = store.kv.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        store.apply_change(&change);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "change channel lagged, reloading logs");
                        store.load().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn parse(raw: &str) -> Vec<ExecutionLog> {
        match serde_json::from_str(raw) {
            Ok(logs) => logs,
            Err(e) => {
                warn!(error = %e, "failed to parse stored logs, discarding");
                Vec::new()
            }
        }
    }
}
