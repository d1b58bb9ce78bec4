// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application State Manager
//!
//! Persists the session snapshot (draft, step, page, wallet flag, last
//! activity) under its own namespaced key and notifies subscribers on every
//! mutation. Constructed explicitly and injected by the application root;
//! listeners attach through `subscribe`, never through import-time side
//! effects. Load failures fall back to the initial state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::request::ContractDraft;
use crate::domain::storage::{KeyValueStore, KvChange, WriterId};
use crate::domain::workflow::{Page, Step};

/// Key holding the serialized session snapshot
pub const STATE_KEY: &str = "contract_gate.app_state";

const LISTENER_CHANNEL_CAPACITY: usize = 64;

/// Persisted view of one gate session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_draft: Option<ContractDraft>,
    pub current_step: Step,
    pub current_page: Page,
    pub wallet_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl Default for AppStateSnapshot {
    fn default() -> Self {
        Self {
            current_draft: None,
            current_step: Step::Form,
            current_page: Page::Home,
            wallet_connected: false,
            last_activity: None,
        }
    }
}

pub struct StateManager {
    kv: Arc<dyn KeyValueStore>,
    writer: WriterId,
    state: RwLock<AppStateSnapshot>,
    listeners: broadcast::Sender<AppStateSnapshot>,
}

impl StateManager {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (listeners, _) = broadcast::channel(LISTENER_CHANNEL_CAPACITY);
        Self {
            kv,
            writer: WriterId::new(),
            state: RwLock::new(AppStateSnapshot::default()),
            listeners,
        }
    }

    pub fn writer(&self) -> WriterId {
        self.writer
    }

    /// Current snapshot
    pub fn state(&self) -> AppStateSnapshot {
        self.state.read().clone()
    }

    /// Attach a listener; every mutation delivers the new snapshot
    pub fn subscribe(&self) -> broadcast::Receiver<AppStateSnapshot> {
        self.listeners.subscribe()
    }

    /// Restore the persisted snapshot, falling back to the initial state
    pub async fn load(&self) {
        let snapshot = match self.kv.get(STATE_KEY).await {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "failed to load persisted state, starting fresh");
                    AppStateSnapshot::default()
                }
            },
            None => AppStateSnapshot::default(),
        };
        *self.state.write() = snapshot;
    }

    /// Apply `mutate` to the snapshot, stamp the activity time, persist and
    /// notify. Persistence is best-effort: a storage failure keeps the
    /// in-memory state authoritative.
    pub async fn update(&self, mutate: impl FnOnce(&mut AppStateSnapshot)) -> AppStateSnapshot {
        let snapshot = {
            let mut state = self.state.write();
            mutate(&mut state);
            state.last_activity = Some(Utc::now());
            state.clone()
        };
        self.persist(&snapshot).await;
        let _ = self.listeners.send(snapshot.clone());
        snapshot
    }

    /// Back to the initial state, persisted
    pub async fn reset(&self) {
        let snapshot = AppStateSnapshot::default();
        *self.state.write() = snapshot.clone();
        self.persist(&snapshot).await;
        let _ = self.listeners.send(snapshot);
    }

    /// React to one observed store mutation; returns `true` when a foreign
    /// write to the state key replaced the in-memory snapshot.
    pub fn apply_change(&self, change: &KvChange) -> bool {
        if change.writer == self.writer || change.key != STATE_KEY {
            return false;
        }
        let Some(raw) = &change.new_value else {
            return false;
        };
        match serde_json::from_str::<AppStateSnapshot>(raw) {
            Ok(snapshot) => {
                *self.state.write() = snapshot.clone();
                let _ = self.listeners.send(snapshot);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to parse state change from another writer");
                false
            }
        }
    }

    /// Follow the store's change channel until it closes, applying foreign
    /// writes to the state key.
    pub fn spawn_sync(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut rx = manager.kv.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        manager.apply_change(&change);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "change channel lagged, reloading state");
                        manager.load().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn persist(&self, snapshot: &AppStateSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(serialized) => {
                if let Err(e) = self.kv.put(STATE_KEY, &serialized, self.writer).await {
                    warn!(error = %e, "failed to save state");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize state"),
        }
    }
}
