// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded service wiring for CLI commands.
//!
//! Commands that operate on gate state construct the full service stack
//! in-process from the discovered configuration: store backend, event bus,
//! log store, wallet manager, state manager and gate service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use gate_core::application::config::GateConfig;
use gate_core::application::gate::GateService;
use gate_core::application::log_store::LogStore;
use gate_core::application::state::StateManager;
use gate_core::application::wallet::WalletManager;
use gate_core::domain::storage::KeyValueStore;
use gate_core::domain::wallet::WalletProvider;
use gate_core::infrastructure::event_bus::EventBus;
use gate_core::infrastructure::kv::{FileKv, MemoryKv};
use gate_core::infrastructure::wallet::{HttpWalletBridge, StubWallet};

pub struct EmbeddedGate {
    pub event_bus: Arc<EventBus>,
    pub log_store: Arc<LogStore>,
    pub service: GateService,
    /// True when the session runs on the in-memory store only
    pub ephemeral: bool,
}

impl EmbeddedGate {
    pub async fn build(config: GateConfig) -> Result<Self> {
        let (kv, ephemeral): (Arc<dyn KeyValueStore>, bool) = match &config.data_dir {
            Some(dir) => {
                let store = FileKv::open(dir.join("gate-store.json"), config.quota_bytes)
                    .context("Failed to open the gate store")?;
                (Arc::new(store), false)
            }
            None => {
                debug!("no data_dir configured, using the in-memory store");
                (Arc::new(MemoryKv::new()), true)
            }
        };

        let provider: Arc<dyn WalletProvider> = match &config.wallet_bridge_url {
            Some(url) => Arc::new(
                HttpWalletBridge::new(url.clone())
                    .context("Failed to create the wallet bridge client")?,
            ),
            None => Arc::new(StubWallet::succeeding(
                format!("stub-{}", uuid::Uuid::new_v4().simple()),
                "stub-signature",
            )),
        };

        let event_bus = Arc::new(EventBus::with_default_capacity());
        let log_store = Arc::new(LogStore::new(kv.clone(), event_bus.clone()));
        log_store.load().await;
        let _sync = log_store.spawn_sync();

        let wallet = Arc::new(WalletManager::new(provider, kv.clone(), event_bus.clone()));
        wallet.restore().await;

        let state = Arc::new(StateManager::new(kv));
        state.load().await;
        let _state_sync = state.spawn_sync();

        let service = GateService::new(
            log_store.clone(),
            wallet,
            state,
            event_bus.clone(),
            Duration::from_millis(config.policy_tick_ms),
        );

        Ok(Self {
            event_bus,
            log_store,
            service,
            ephemeral,
        })
    }
}
