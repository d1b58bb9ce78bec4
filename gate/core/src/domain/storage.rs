// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Key-Value Store Trait - Anti-Corruption Layer for Local Persistence
//!
//! Abstraction over the namespaced key-value backend so the application layer
//! never touches a concrete store. Implementations must provide:
//! - string keys and values with optional byte quota enforcement
//! - a change-notification channel fired on every mutation
//!
//! Change notifications carry the [`WriterId`] of the mutating handle.
//! Consumers that write through the same store drop notifications bearing
//! their own writer id, which reproduces browser storage-event semantics
//! (events fire only in *other* execution contexts) explicitly rather than
//! implicitly. Last writer wins; there is no merge or conflict detection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Identifies one writing handle on a shared store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WriterId(pub Uuid);

impl WriterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WriterId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single observed mutation of the shared store
#[derive(Debug, Clone)]
pub struct KvChange {
    pub key: String,
    /// `None` when the key was removed
    pub new_value: Option<String>,
    pub writer: WriterId,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Quota exceeded: key={key}, limit={limit_bytes}, attempted={attempted_bytes}")]
    QuotaExceeded {
        key: String,
        limit_bytes: u64,
        attempted_bytes: u64,
    },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Namespaced key-value persistence with change notification.
///
/// `get` never fails with a caller-visible fault: backends return `None` for
/// anything they cannot read, so corrupt data is indistinguishable from
/// absent data at this layer.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, enforcing any configured quota.
    /// Fires a change notification carrying `writer` on success.
    async fn put(&self, key: &str, value: &str, writer: WriterId) -> Result<(), StorageError>;

    /// Remove `key` if present. Fires a change notification on success.
    async fn remove(&self, key: &str, writer: WriterId) -> Result<(), StorageError>;

    /// Subscribe to mutations of this store
    fn subscribe(&self) -> broadcast::Receiver<KvChange>;
}
