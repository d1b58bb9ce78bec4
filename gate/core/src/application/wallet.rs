// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wallet Connection Manager
//!
//! Wraps the external wallet capability with connection persistence: the
//! authenticated session is stored under a namespaced key, restored on
//! startup and removed on disconnect. Corrupt connection data is discarded.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::domain::events::GateEvent;
use crate::domain::storage::{KeyValueStore, WriterId};
use crate::domain::wallet::{SignedTransaction, WalletError, WalletProvider, WalletSession};
use crate::infrastructure::event_bus::EventBus;

/// Key holding the serialized wallet connection
pub const WALLET_KEY: &str = "contract_gate.wallet_connection";

pub struct WalletManager {
    provider: Arc<dyn WalletProvider>,
    kv: Arc<dyn KeyValueStore>,
    event_bus: Arc<EventBus>,
    writer: WriterId,
    session: RwLock<Option<WalletSession>>,
}

impl WalletManager {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        kv: Arc<dyn KeyValueStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            kv,
            event_bus,
            writer: WriterId::new(),
            session: RwLock::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.read().is_some()
    }

    pub fn session(&self) -> Option<WalletSession> {
        self.session.read().clone()
    }

    /// Restore a persisted connection, discarding anything unreadable.
    pub async fn restore(&self) {
        let Some(raw) = self.kv.get(WALLET_KEY).await else {
            return;
        };
        match serde_json::from_str::<WalletSession>(&raw) {
            Ok(session) => {
                *self.session.write() = Some(session);
            }
            Err(e) => {
                warn!(error = %e, "discarding corrupt wallet connection data");
                if let Err(e) = self.kv.remove(WALLET_KEY, self.writer).await {
                    warn!(error = %e, "failed to remove corrupt wallet connection");
                }
            }
        }
    }

    /// Authenticate through the provider and persist the session.
    pub async fn connect(&self) -> Result<WalletSession, WalletError> {
        let session = self.provider.connect().await?;

        match serde_json::to_string(&session) {
            Ok(serialized) => {
                if let Err(e) = self.kv.put(WALLET_KEY, &serialized, self.writer).await {
                    warn!(error = %e, "failed to persist wallet connection");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize wallet connection"),
        }

        *self.session.write() = Some(session.clone());
        self.event_bus.publish_gate_event(GateEvent::WalletConnected {
            username: session.username.clone(),
        });
        Ok(session)
    }

    /// Tear down the session and forget the persisted connection.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        self.provider.disconnect().await?;
        if let Err(e) = self.kv.remove(WALLET_KEY, self.writer).await {
            warn!(error = %e, "failed to remove wallet connection");
        }
        *self.session.write() = None;
        self.event_bus
            .publish_gate_event(GateEvent::WalletDisconnected);
        Ok(())
    }

    /// Request a signature. Errors with `NotConnected` before touching the
    /// provider when no session is active.
    pub async fn sign_transaction(
        &self,
        contract_address: &str,
        method: &str,
        parameters: &str,
    ) -> Result<SignedTransaction, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }
        self.provider
            .sign_transaction(contract_address, method, parameters)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kv::MemoryKv;
    use crate::infrastructure::wallet::StubWallet;

    fn make_manager(kv: Arc<dyn KeyValueStore>, wallet: StubWallet) -> WalletManager {
        WalletManager::new(
            Arc::new(wallet),
            kv,
            Arc::new(EventBus::with_default_capacity()),
        )
    }

    #[tokio::test]
    async fn test_connect_persists_session() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
        let manager = make_manager(kv.clone(), StubWallet::succeeding("tx", "sig"));

        assert!(!manager.is_connected());
        let session = manager.connect().await.unwrap();
        assert_eq!(session.username, "pioneer");
        assert!(manager.is_connected());

        let raw = kv.get(WALLET_KEY).await.unwrap();
        let persisted: WalletSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, session);
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_session() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
        {
            let manager = make_manager(kv.clone(), StubWallet::succeeding("tx", "sig"));
            manager.connect().await.unwrap();
        }

        let manager = make_manager(kv, StubWallet::succeeding("tx", "sig"));
        manager.restore().await;
        assert!(manager.is_connected());
        assert_eq!(manager.session().unwrap().username, "pioneer");
    }

    #[tokio::test]
    async fn test_restore_discards_corrupt_data() {
        let kv = Arc::new(MemoryKv::new());
        kv.put(WALLET_KEY, "%%%", WriterId::new()).await.unwrap();

        let manager = make_manager(kv.clone(), StubWallet::succeeding("tx", "sig"));
        manager.restore().await;
        assert!(!manager.is_connected());
        assert_eq!(kv.get(WALLET_KEY).await, None);
    }

    #[tokio::test]
    async fn test_disconnect_forgets_connection() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
        let manager = make_manager(kv.clone(), StubWallet::succeeding("tx", "sig"));

        manager.connect().await.unwrap();
        manager.disconnect().await.unwrap();
        assert!(!manager.is_connected());
        assert_eq!(kv.get(WALLET_KEY).await, None);
    }

    #[tokio::test]
    async fn test_signing_requires_connection() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
        let manager = make_manager(kv, StubWallet::succeeding("tx", "sig"));

        let err = manager
            .sign_transaction("0x0", "transfer", "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NotConnected));
    }
}
