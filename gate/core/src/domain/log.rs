// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Execution log records appended to the activity log on completion.
//! Once appended a record is immutable; the store only prepends new entries
//! or performs wholesale trims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::policy::PolicyCheckResult;
use crate::domain::request::{ContractRequest, ReferenceId};

/// Unique identifier for an execution log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub Uuid);

impl LogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal outcome recorded for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
}

/// Durable record of one executed contract request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLog {
    pub id: LogId,
    pub reference_id: ReferenceId,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub status: LogStatus,
    /// Wallet-supplied transaction id
    pub execution_hash: String,
    pub contract_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_check_result: Option<PolicyCheckResult>,
}

impl ExecutionLog {
    /// Build the success record for a signed and submitted request
    pub fn success(request: &ContractRequest, txid: impl Into<String>) -> Self {
        Self {
            id: LogId::new(),
            reference_id: request.reference_id.clone(),
            timestamp: Utc::now(),
            method: request.method.clone(),
            status: LogStatus::Success,
            execution_hash: txid.into(),
            contract_address: request.contract_address.clone(),
            gas_used: Some("Testnet".to_string()),
            error: None,
            policy_check_result: request.policy_check_result.clone(),
        }
    }
}
