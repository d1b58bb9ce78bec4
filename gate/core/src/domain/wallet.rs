// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wallet Capability Trait - Anti-Corruption Layer for the Wallet SDK
//!
//! The wallet is an opaque third-party capability: the gate consumes it, it
//! never implements it. Signing is delegated wholesale; the gate only sees
//! the resulting transaction id and signature.
//!
//! Note: `sign_transaction` carries no caller-side timeout. If the SDK never
//! resolves, the workflow stays suspended in its awaiting-signature phase.
//! This mirrors the upstream SDK contract; whether production behavior should
//! eventually time out is an open question deliberately left visible here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authenticated wallet identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub username: String,
    pub address: String,
}

/// Result of a signing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txid: String,
    pub signature: String,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Cancelled")]
    Cancelled,

    #[error("Wallet SDK error: {0}")]
    Sdk(String),
}

/// External wallet capability consumed by the gate
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Authenticate and open a session
    async fn connect(&self) -> Result<WalletSession, WalletError>;

    /// Tear down the session
    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Request a signature for a contract call. May suspend indefinitely.
    async fn sign_transaction(
        &self,
        contract_address: &str,
        method: &str,
        parameters: &str,
    ) -> Result<SignedTransaction, WalletError>;
}
