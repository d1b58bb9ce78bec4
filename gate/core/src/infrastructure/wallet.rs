// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wallet Provider Implementations
//!
//! `StubWallet` scripts outcomes for tests and the CLI demo flow.
//! `HttpWalletBridge` delegates to a local signer bridge over HTTP, the same
//! client shape the CLI uses to talk to its daemon.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::wallet::{SignedTransaction, WalletError, WalletProvider, WalletSession};

/// Scripted outcome for the next signing call
#[derive(Debug, Clone)]
pub enum StubOutcome {
    Sign { txid: String, signature: String },
    Cancel,
    Error(String),
    /// Simulates an SDK that never resolves; the caller suspends forever
    NeverResolve,
}

/// Test double for the wallet capability
pub struct StubWallet {
    session: WalletSession,
    outcome: StubOutcome,
}

impl StubWallet {
    pub fn new(session: WalletSession, outcome: StubOutcome) -> Self {
        Self { session, outcome }
    }

    /// Wallet that signs every request with the given transaction id
    pub fn succeeding(txid: impl Into<String>, signature: impl Into<String>) -> Self {
        Self::new(
            default_session(),
            StubOutcome::Sign {
                txid: txid.into(),
                signature: signature.into(),
            },
        )
    }

    /// Wallet whose user cancels every signature request
    pub fn cancelling() -> Self {
        Self::new(default_session(), StubOutcome::Cancel)
    }

    /// Wallet whose SDK fails every signature request
    pub fn erroring(message: impl Into<String>) -> Self {
        Self::new(default_session(), StubOutcome::Error(message.into()))
    }

    /// Wallet that never answers a signature request
    pub fn never_resolving() -> Self {
        Self::new(default_session(), StubOutcome::NeverResolve)
    }
}

fn default_session() -> WalletSession {
    WalletSession {
        username: "pioneer".to_string(),
        address: "stub-wallet-uid".to_string(),
    }
}

#[async_trait]
impl WalletProvider for StubWallet {
    async fn connect(&self) -> Result<WalletSession, WalletError> {
        Ok(self.session.clone())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }

    async fn sign_transaction(
        &self,
        _contract_address: &str,
        _method: &str,
        _parameters: &str,
    ) -> Result<SignedTransaction, WalletError> {
        match &self.outcome {
            StubOutcome::Sign { txid, signature } => Ok(SignedTransaction {
                txid: txid.clone(),
                signature: signature.clone(),
            }),
            StubOutcome::Cancel => Err(WalletError::Cancelled),
            StubOutcome::Error(message) => Err(WalletError::Sdk(message.clone())),
            StubOutcome::NeverResolve => futures::future::pending().await,
        }
    }
}

/// HTTP client for a local wallet signer bridge
#[derive(Debug, Clone)]
pub struct HttpWalletBridge {
    client: Client,
    base_url: String,
}

impl HttpWalletBridge {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WalletError> {
        // No global timeout: signature requests legitimately wait on the user
        let client = Client::builder()
            .build()
            .map_err(|e| WalletError::Sdk(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn bridge_error(response: reqwest::Response) -> WalletError {
        #[derive(Deserialize)]
        struct BridgeError {
            error: String,
        }

        let status = response.status();
        match response.json::<BridgeError>().await {
            Ok(body) if body.error.eq_ignore_ascii_case("cancelled") => WalletError::Cancelled,
            Ok(body) => WalletError::Sdk(body.error),
            Err(_) => WalletError::Sdk(format!("Bridge returned status {}", status)),
        }
    }
}

#[async_trait]
impl WalletProvider for HttpWalletBridge {
    async fn connect(&self) -> Result<WalletSession, WalletError> {
        let response = self
            .client
            .post(format!("{}/authenticate", self.base_url))
            .send()
            .await
            .map_err(|e| WalletError::Sdk(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::bridge_error(response).await);
        }

        response
            .json::<WalletSession>()
            .await
            .map_err(|e| WalletError::Sdk(format!("Failed to parse session: {}", e)))
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let response = self
            .client
            .post(format!("{}/disconnect", self.base_url))
            .send()
            .await
            .map_err(|e| WalletError::Sdk(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::bridge_error(response).await);
        }
        Ok(())
    }

    async fn sign_transaction(
        &self,
        contract_address: &str,
        method: &str,
        parameters: &str,
    ) -> Result<SignedTransaction, WalletError> {
        let payload = serde_json::json!({
            "contractAddress": contract_address,
            "method": method,
            "parameters": parameters,
        });

        let response = self
            .client
            .post(format!("{}/sign", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| WalletError::Sdk(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::bridge_error(response).await);
        }

        response
            .json::<SignedTransaction>()
            .await
            .map_err(|e| WalletError::Sdk(format!("Failed to parse signature: {}", e)))
    }
}
