// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Contract Request Domain Model
//!
//! Defines the draft and frozen forms of a contract call request. A
//! [`ContractDraft`] is mutable form input owned by the workflow; freezing it
//! produces an immutable [`ContractRequest`] with an assigned identifier,
//! reference id, approval status and timestamp. Freezing happens exactly once,
//! when the workflow enters the execution step.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::policy::PolicyCheckResult;

/// Unique internal identifier for a contract request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable correlation identifier, distinct from the internal id.
///
/// Format: `REF-<epoch millis>-<uppercase base36 suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceId(String);

const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

impl ReferenceId {
    /// Generate a new reference id stamped with the current time
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!("REF-{}-{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReferenceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Executed,
    Failed,
}

/// Mutable form payload for a contract call, prior to freezing.
///
/// All fields are raw strings as entered; `parameters` in particular is
/// unparsed JSON text. The empty string means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDraft {
    pub contract_address: String,
    pub method: String,
    pub parameters: String,
    pub reason: String,
}

impl ContractDraft {
    pub fn new(
        contract_address: impl Into<String>,
        method: impl Into<String>,
        parameters: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            contract_address: contract_address.into(),
            method: method.into(),
            parameters: parameters.into(),
            reason: reason.into(),
        }
    }

    /// True when no field carries any input
    pub fn is_empty(&self) -> bool {
        self.contract_address.trim().is_empty()
            && self.method.trim().is_empty()
            && self.parameters.trim().is_empty()
            && self.reason.trim().is_empty()
    }
}

/// A frozen contract call request.
///
/// # Invariants
/// - Immutable once execution starts; the workflow hands out clones only
/// - `policy_check_result` is embedded by value, never referenced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRequest {
    pub id: RequestId,
    pub reference_id: ReferenceId,
    pub contract_address: String,
    pub method: String,
    pub parameters: String,
    pub reason: String,
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_check_result: Option<PolicyCheckResult>,
}

impl ContractRequest {
    /// Freeze a draft into an approved request ready for signing.
    ///
    /// Synthesizes the internal id and reference id, stamps the current time
    /// and embeds the policy report that approved it.
    pub fn freeze(draft: &ContractDraft, policy: PolicyCheckResult) -> Self {
        Self {
            id: RequestId::new(),
            reference_id: ReferenceId::generate(),
            contract_address: draft.contract_address.clone(),
            method: draft.method.clone(),
            parameters: draft.parameters.clone(),
            reason: draft.reason.clone(),
            status: RequestStatus::Approved,
            timestamp: Utc::now(),
            execution_hash: None,
            policy_check_result: Some(policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::PolicyEvaluator;

    fn valid_draft() -> ContractDraft {
        ContractDraft::new(
            format!("0x{}", "0".repeat(40)),
            "transfer",
            "{}",
            "test request long enough",
        )
    }

    #[test]
    fn test_reference_id_format() {
        let id = ReferenceId::generate();
        let parts: Vec<&str> = id.as_str().splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "REF");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_reference_ids_are_unique() {
        let a = ReferenceId::generate();
        let b = ReferenceId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_draft_emptiness() {
        assert!(ContractDraft::default().is_empty());
        assert!(ContractDraft::new("", "  ", "", "").is_empty());
        assert!(!valid_draft().is_empty());
    }

    #[test]
    fn test_freeze_assigns_identity_and_approval() {
        let draft = valid_draft();
        let policy = PolicyEvaluator::new().evaluate(&draft);
        let request = ContractRequest::freeze(&draft, policy);

        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.method, "transfer");
        assert!(request.execution_hash.is_none());
        assert!(request.policy_check_result.is_some());
        assert!(request.reference_id.as_str().starts_with("REF-"));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&RequestStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        let back: RequestStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, RequestStatus::Failed);
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let draft = valid_draft();
        let policy = PolicyEvaluator::new().evaluate(&draft);
        let request = ContractRequest::freeze(&draft, policy);

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("referenceId").is_some());
        assert!(value.get("contractAddress").is_some());
        assert!(value.get("policyCheckResult").is_some());
        // Unset optionals are omitted from the wire format
        assert!(value.get("executionHash").is_none());
    }
}
