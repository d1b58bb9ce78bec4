// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gate Service
//!
//! Application service driving the control gate pipeline over its
//! collaborators: validation engine, policy evaluator, wallet manager,
//! activity log store and event bus. The service owns the workflow state;
//! every forward transition enforces its preconditions and the session
//! snapshot is persisted after each accepted transition.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::application::log_store::LogStore;
use crate::application::state::StateManager;
use crate::application::wallet::WalletManager;
use crate::domain::events::GateEvent;
use crate::domain::log::ExecutionLog;
use crate::domain::policy::{PolicyCheckResult, PolicyEvaluator};
use crate::domain::request::{ContractDraft, ContractRequest};
use crate::domain::storage::StorageError;
use crate::domain::validation::{ValidationEngine, ValidationReport};
use crate::domain::wallet::WalletError;
use crate::domain::workflow::{ExecutionPhase, GateWorkflow, Page, Step, WorkflowError};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Draft failed validation ({n} issue(s))", n = .0.errors.len())]
    Validation(ValidationReport),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct GateService {
    workflow: RwLock<GateWorkflow>,
    evaluator: PolicyEvaluator,
    validation: ValidationEngine,
    log_store: Arc<LogStore>,
    wallet: Arc<WalletManager>,
    state: Arc<StateManager>,
    event_bus: Arc<EventBus>,
    /// Decorative inter-check delay for progress display; zero disables it
    policy_tick: Duration,
}

impl GateService {
    pub fn new(
        log_store: Arc<LogStore>,
        wallet: Arc<WalletManager>,
        state: Arc<StateManager>,
        event_bus: Arc<EventBus>,
        policy_tick: Duration,
    ) -> Self {
        Self {
            workflow: RwLock::new(GateWorkflow::new()),
            evaluator: PolicyEvaluator::new(),
            validation: ValidationEngine::new(),
            log_store,
            wallet,
            state,
            event_bus,
            policy_tick,
        }
    }

    /// Snapshot of the current workflow state
    pub fn workflow(&self) -> GateWorkflow {
        self.workflow.read().clone()
    }

    pub fn log_store(&self) -> &Arc<LogStore> {
        &self.log_store
    }

    pub fn wallet(&self) -> &Arc<WalletManager> {
        &self.wallet
    }

    /// Validate the draft with the fixed rule set and advance to preview.
    pub async fn submit_draft(&self, draft: ContractDraft) -> Result<(), GateError> {
        let report = self.validation.validate_for_execution(&draft);
        if !report.is_valid {
            return Err(GateError::Validation(report));
        }
        self.workflow.write().submit_draft(draft)?;
        self.sync_state().await;
        Ok(())
    }

    pub async fn back_to_form(&self) -> Result<(), GateError> {
        self.workflow.write().back_to_form()?;
        self.sync_state().await;
        Ok(())
    }

    pub async fn proceed_to_policy(&self) -> Result<(), GateError> {
        self.workflow.write().proceed_to_policy()?;
        self.sync_state().await;
        Ok(())
    }

    /// Evaluate the fixed policy check sequence against the current draft.
    ///
    /// Evaluation itself is instantaneous; per-check progress events are
    /// published with the configured tick delay for display parity.
    pub async fn run_policy_checks(&self) -> Result<PolicyCheckResult, GateError> {
        let draft = {
            let wf = self.workflow.read();
            if wf.step() != Step::Policy {
                return Err(WorkflowError::InvalidTransition {
                    from: wf.step(),
                    action: "run_policy_checks",
                }
                .into());
            }
            wf.draft().clone()
        };

        let result = self.evaluator.evaluate(&draft);
        for (index, check) in result.checks.iter().enumerate() {
            self.event_bus
                .publish_gate_event(GateEvent::PolicyCheckEvaluated {
                    index,
                    name: check.name.clone(),
                    passed: check.passed,
                    evaluated_at: Utc::now(),
                });
            if !self.policy_tick.is_zero() && index + 1 < result.checks.len() {
                tokio::time::sleep(self.policy_tick).await;
            }
        }
        self.event_bus.publish_gate_event(GateEvent::PolicyCompleted {
            passed: result.passed,
            completed_at: result.timestamp,
        });

        self.workflow.write().record_policy_result(result.clone())?;
        self.sync_state().await;
        Ok(result)
    }

    /// Freeze the request and enter the execution step.
    ///
    /// Blocked with `WalletDisconnected` while no wallet session is active;
    /// the workflow stays in the policy step so the warning can be surfaced
    /// inline and the action retried after connecting.
    pub async fn forward_for_execution(&self) -> Result<ContractRequest, GateError> {
        let connected = self.wallet.is_connected();
        let request = self.workflow.write().forward_for_execution(connected)?;
        info!(reference_id = %request.reference_id, "request frozen for execution");
        self.sync_state().await;
        Ok(request)
    }

    /// Drive the execution sub-machine: request a signature, submit, record.
    ///
    /// Single-shot. A wallet error is terminal for this request; no log is
    /// appended for a failed signature and only `reset` exits.
    pub async fn execute(&self) -> Result<ExecutionLog, GateError> {
        let request = {
            let wf = self.workflow.read();
            if wf.phase() != Some(ExecutionPhase::AwaitingSignature) {
                return Err(WorkflowError::InvalidTransition {
                    from: wf.step(),
                    action: "execute",
                }
                .into());
            }
            wf.request()
                .cloned()
                .expect("Invariant: request must exist in execution step")
        };

        self.event_bus
            .publish_gate_event(GateEvent::SignatureRequested {
                reference_id: request.reference_id.clone(),
                requested_at: Utc::now(),
            });

        // No caller-side timeout: a wallet that never answers suspends here
        let signed = match self
            .wallet
            .sign_transaction(&request.contract_address, &request.method, &request.parameters)
            .await
        {
            Ok(signed) => signed,
            Err(e) => {
                let message = match &e {
                    WalletError::NotConnected => {
                        "Wallet not connected. Please connect before executing.".to_string()
                    }
                    other => other.to_string(),
                };
                self.workflow.write().fail_execution(message.clone())?;
                self.event_bus.publish_gate_event(GateEvent::ExecutionFailed {
                    reference_id: request.reference_id.clone(),
                    error: message,
                    failed_at: Utc::now(),
                });
                self.sync_state().await;
                return Err(e.into());
            }
        };

        self.workflow.write().begin_submission()?;
        self.event_bus
            .publish_gate_event(GateEvent::TransactionSubmitting {
                reference_id: request.reference_id.clone(),
                txid: signed.txid.clone(),
            });

        let log = ExecutionLog::success(&request, signed.txid);
        if let Err(e) = self.log_store.append(log.clone()).await {
            // The transaction went through; a full store must not undo that
            warn!(error = %e, "execution recorded in memory but could not be persisted");
        }

        self.workflow.write().complete_execution()?;
        info!(
            reference_id = %log.reference_id,
            txid = %log.execution_hash,
            "transaction executed"
        );
        self.event_bus
            .publish_gate_event(GateEvent::ExecutionCompleted { log: log.clone() });
        self.sync_state().await;
        Ok(log)
    }

    /// Terminal reset back to an empty form
    pub async fn reset(&self) -> Result<(), GateError> {
        self.workflow.write().reset()?;
        self.sync_state().await;
        Ok(())
    }

    pub async fn set_page(&self, page: Page) {
        self.workflow.write().set_page(page);
        self.sync_state().await;
    }

    async fn sync_state(&self) {
        let (draft, step, page) = {
            let wf = self.workflow.read();
            (wf.draft().clone(), wf.step(), wf.page())
        };
        let connected = self.wallet.is_connected();
        self.state
            .update(|s| {
                s.current_draft = if draft.is_empty() { None } else { Some(draft) };
                s.current_step = step;
                s.current_page = page;
                s.wallet_connected = connected;
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::Step;
    use crate::infrastructure::kv::MemoryKv;
    use crate::infrastructure::wallet::StubWallet;

    fn valid_draft() -> ContractDraft {
        ContractDraft::new(
            format!("0x{}", "0".repeat(40)),
            "transfer",
            "{}",
            "test request long enough",
        )
    }

    fn make_service(wallet: StubWallet) -> GateService {
        let kv: Arc<dyn crate::domain::storage::KeyValueStore> = Arc::new(MemoryKv::new());
        let event_bus = Arc::new(EventBus::with_default_capacity());
        let log_store = Arc::new(LogStore::new(kv.clone(), event_bus.clone()));
        let wallet = Arc::new(WalletManager::new(
            Arc::new(wallet),
            kv.clone(),
            event_bus.clone(),
        ));
        let state = Arc::new(StateManager::new(kv));
        GateService::new(log_store, wallet, state, event_bus, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_draft() {
        let service = make_service(StubWallet::succeeding("tx", "sig"));
        let mut draft = valid_draft();
        draft.reason = "short".to_string();

        let err = service.submit_draft(draft).await.unwrap_err();
        match err {
            GateError::Validation(report) => {
                assert!(!report.is_valid);
                assert_eq!(report.errors.len(), 1);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(service.workflow().step(), Step::Form);
    }

    #[tokio::test]
    async fn test_policy_progress_events_are_published() {
        let service = make_service(StubWallet::succeeding("tx", "sig"));
        let mut rx = service.event_bus.subscribe();

        service.submit_draft(valid_draft()).await.unwrap();
        service.proceed_to_policy().await.unwrap();
        let result = service.run_policy_checks().await.unwrap();
        assert!(result.passed);

        let mut evaluated = 0;
        let mut completed = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                crate::infrastructure::event_bus::DomainEvent::Gate(
                    GateEvent::PolicyCheckEvaluated { .. },
                ) => evaluated += 1,
                crate::infrastructure::event_bus::DomainEvent::Gate(
                    GateEvent::PolicyCompleted { passed, .. },
                ) => completed = passed,
                _ => {}
            }
        }
        assert_eq!(evaluated, 4);
        assert!(completed);
    }

    #[tokio::test]
    async fn test_forward_blocked_without_wallet() {
        let service = make_service(StubWallet::succeeding("tx", "sig"));
        service.submit_draft(valid_draft()).await.unwrap();
        service.proceed_to_policy().await.unwrap();
        service.run_policy_checks().await.unwrap();

        let err = service.forward_for_execution().await.unwrap_err();
        assert!(matches!(
            err,
            GateError::Workflow(WorkflowError::WalletDisconnected)
        ));
        assert_eq!(service.workflow().step(), Step::Policy);

        // Connecting unblocks the same forward action
        service.wallet().connect().await.unwrap();
        assert!(service.forward_for_execution().await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_signature_is_terminal_and_unlogged() {
        let service = make_service(StubWallet::cancelling());
        service.wallet().connect().await.unwrap();
        service.submit_draft(valid_draft()).await.unwrap();
        service.proceed_to_policy().await.unwrap();
        service.run_policy_checks().await.unwrap();
        service.forward_for_execution().await.unwrap();

        let err = service.execute().await.unwrap_err();
        assert!(matches!(err, GateError::Wallet(WalletError::Cancelled)));
        assert_eq!(
            service.workflow().phase(),
            Some(ExecutionPhase::Failed)
        );
        assert!(service.log_store().logs().is_empty());

        // Only reset exits the failed phase
        assert!(service.execute().await.is_err());
        service.reset().await.unwrap();
        assert_eq!(service.workflow().step(), Step::Form);
    }

    #[tokio::test]
    async fn test_state_snapshot_follows_workflow() {
        let service = make_service(StubWallet::succeeding("tx", "sig"));
        service.submit_draft(valid_draft()).await.unwrap();

        let state = service.state.state();
        assert_eq!(state.current_step, Step::Preview);
        assert_eq!(
            state.current_draft.as_ref().map(|d| d.method.as_str()),
            Some("transfer")
        );
    }
}
