// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::log::ExecutionLog;
use crate::domain::request::ReferenceId;

/// Events published while a request moves through the gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GateEvent {
    PolicyCheckEvaluated {
        index: usize,
        name: String,
        passed: bool,
        evaluated_at: DateTime<Utc>,
    },
    PolicyCompleted {
        passed: bool,
        completed_at: DateTime<Utc>,
    },
    SignatureRequested {
        reference_id: ReferenceId,
        requested_at: DateTime<Utc>,
    },
    TransactionSubmitting {
        reference_id: ReferenceId,
        txid: String,
    },
    ExecutionCompleted {
        log: ExecutionLog,
    },
    ExecutionFailed {
        reference_id: ReferenceId,
        error: String,
        failed_at: DateTime<Utc>,
    },
    WalletConnected {
        username: String,
    },
    WalletDisconnected,
}

/// Events published by the activity log store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogStoreEvent {
    LogAppended {
        count: usize,
    },
    /// The collection was halved to recover from quota pressure
    LogsTrimmed {
        before: usize,
        after: usize,
    },
    LogsCleared,
    /// Another writer mutated the backing key; state was reloaded
    LogsReloaded {
        count: usize,
    },
}
