// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the control gate pipeline
//!
//! These tests verify the end-to-end flow:
//! 1. Draft submission with validation
//! 2. Preview and policy review
//! 3. Freezing and wallet signing
//! 4. Activity log persistence

use std::sync::Arc;
use std::time::Duration;

use gate_core::application::gate::{GateError, GateService};
use gate_core::application::log_store::LogStore;
use gate_core::application::state::StateManager;
use gate_core::application::wallet::WalletManager;
use gate_core::domain::log::LogStatus;
use gate_core::domain::request::{ContractDraft, RequestStatus};
use gate_core::domain::storage::KeyValueStore;
use gate_core::domain::workflow::{ExecutionPhase, Page, Step};
use gate_core::infrastructure::event_bus::EventBus;
use gate_core::infrastructure::kv::MemoryKv;
use gate_core::infrastructure::wallet::StubWallet;

fn valid_draft() -> ContractDraft {
    ContractDraft::new(
        format!("0x{}", "0".repeat(40)),
        "transfer",
        "{}",
        "test request long enough",
    )
}

fn build_service(kv: Arc<dyn KeyValueStore>, wallet: StubWallet) -> GateService {
    let event_bus = Arc::new(EventBus::with_default_capacity());
    let log_store = Arc::new(LogStore::new(kv.clone(), event_bus.clone()));
    let wallet_manager = Arc::new(WalletManager::new(
        Arc::new(wallet),
        kv.clone(),
        event_bus.clone(),
    ));
    let state = Arc::new(StateManager::new(kv));
    GateService::new(log_store, wallet_manager, state, event_bus, Duration::ZERO)
}

#[tokio::test]
async fn test_end_to_end_success_records_execution_log() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let service = build_service(kv, StubWallet::succeeding("abc123", "sig1"));
    service.wallet().connect().await.unwrap();
    service.log_store().load().await;

    service.submit_draft(valid_draft()).await.unwrap();
    assert_eq!(service.workflow().step(), Step::Preview);

    service.proceed_to_policy().await.unwrap();
    let result = service.run_policy_checks().await.unwrap();
    assert!(result.passed);
    assert_eq!(result.checks.len(), 4);

    let request = service.forward_for_execution().await.unwrap();
    assert_eq!(request.status, RequestStatus::Approved);
    assert!(request.reference_id.as_str().starts_with("REF-"));
    assert_eq!(service.workflow().phase(), Some(ExecutionPhase::AwaitingSignature));

    let log = service.execute().await.unwrap();
    assert_eq!(log.status, LogStatus::Success);
    assert_eq!(log.execution_hash, "abc123");
    assert_eq!(log.method, "transfer");
    assert_eq!(log.reference_id, request.reference_id);
    assert_eq!(service.workflow().phase(), Some(ExecutionPhase::Complete));

    // The record survives a fresh load from storage
    let persisted = service.log_store().load().await;
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].execution_hash, "abc123");

    // Terminal reset returns to an empty form
    service.reset().await.unwrap();
    assert_eq!(service.workflow().step(), Step::Form);
    assert!(service.workflow().draft().is_empty());
}

#[tokio::test]
async fn test_preview_back_edge_allows_editing() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let service = build_service(kv, StubWallet::succeeding("tx", "sig"));

    service.submit_draft(valid_draft()).await.unwrap();
    service.back_to_form().await.unwrap();
    assert_eq!(service.workflow().step(), Step::Form);

    // Resubmit with a different method
    let mut draft = valid_draft();
    draft.method = "mint".to_string();
    service.submit_draft(draft).await.unwrap();
    assert_eq!(service.workflow().draft().method, "mint");
}

#[tokio::test]
async fn test_failing_policy_blocks_execution() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let service = build_service(kv, StubWallet::succeeding("tx", "sig"));
    service.wallet().connect().await.unwrap();

    // Validation accepts a bare-hex address that policy will then reject
    let mut draft = valid_draft();
    draft.contract_address = "f".repeat(40);
    service.submit_draft(draft).await.unwrap();
    service.proceed_to_policy().await.unwrap();

    let result = service.run_policy_checks().await.unwrap();
    assert!(!result.passed);
    assert_eq!(result.checks.iter().filter(|c| !c.passed).count(), 1);
    assert!(!result.checks[0].passed);

    let err = service.forward_for_execution().await.unwrap_err();
    assert!(matches!(err, GateError::Workflow(_)));
    assert_eq!(service.workflow().step(), Step::Policy);
}

#[tokio::test]
async fn test_sdk_error_leaves_no_activity_record() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let service = build_service(kv, StubWallet::erroring("Pi SDK not loaded"));
    service.wallet().connect().await.unwrap();

    service.submit_draft(valid_draft()).await.unwrap();
    service.proceed_to_policy().await.unwrap();
    service.run_policy_checks().await.unwrap();
    service.forward_for_execution().await.unwrap();

    assert!(service.execute().await.is_err());
    assert_eq!(service.workflow().phase(), Some(ExecutionPhase::Failed));
    assert_eq!(
        service.workflow().failure(),
        Some("Wallet SDK error: Pi SDK not loaded")
    );
    assert!(service.log_store().load().await.is_empty());

    service.reset().await.unwrap();
    assert_eq!(service.workflow().step(), Step::Form);
}

#[tokio::test]
async fn test_activity_page_navigation_is_orthogonal() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let service = build_service(kv, StubWallet::succeeding("tx", "sig"));

    service.submit_draft(valid_draft()).await.unwrap();
    service.set_page(Page::Activity).await;
    assert_eq!(service.workflow().page(), Page::Activity);
    assert_eq!(service.workflow().step(), Step::Preview);

    service.set_page(Page::Home).await;
    service.proceed_to_policy().await.unwrap();
    assert_eq!(service.workflow().step(), Step::Policy);
}

#[tokio::test]
async fn test_two_sessions_share_one_activity_log() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let service_a = build_service(kv.clone(), StubWallet::succeeding("tx-a", "sig"));
    let service_b = build_service(kv, StubWallet::succeeding("tx-b", "sig"));

    service_a.wallet().connect().await.unwrap();
    service_a.log_store().load().await;
    service_b.log_store().load().await;

    service_a.submit_draft(valid_draft()).await.unwrap();
    service_a.proceed_to_policy().await.unwrap();
    service_a.run_policy_checks().await.unwrap();
    service_a.forward_for_execution().await.unwrap();
    service_a.execute().await.unwrap();

    // Session B sees the record after its next load; last writer wins
    let seen = service_b.log_store().load().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].execution_hash, "tx-a");
}
