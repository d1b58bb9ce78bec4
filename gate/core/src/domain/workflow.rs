//! Gate Workflow Domain Model
//!
//! This module defines the finite state machine that carries a contract
//! request from form input to a recorded execution.
//!
//! # Design Principles
//!
//! 1. **Strictly forward:** the only backward edges are the explicit
//!    preview-to-form "back" and the terminal reset
//! 2. **Self-Validating:** every transition enforces its preconditions and
//!    returns a [`WorkflowError`] instead of panicking
//! 3. **Freeze on entry:** entering the execution step freezes the draft
//!    into an immutable [`ContractRequest`]
//!
//! The execution step is itself a sub-machine
//! (`AwaitingSignature -> Submitting -> Complete | Failed`), single-shot:
//! there is no retry edge out of `Failed`, only reset.

use serde::{Deserialize, Serialize};

use crate::domain::policy::PolicyCheckResult;
use crate::domain::request::{ContractDraft, ContractRequest};

// ============================================================================
// Value Objects: States
// ============================================================================

/// Pipeline step within the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Form,
    Preview,
    Policy,
    Execution,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Form => "form",
            Step::Preview => "preview",
            Step::Policy => "policy",
            Step::Execution => "execution",
        };
        write!(f, "{}", name)
    }
}

/// Page dimension, orthogonal to the pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Home,
    Activity,
}

/// Sub-machine states for the execution step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionPhase {
    AwaitingSignature,
    Submitting,
    Complete,
    Failed,
}

// ============================================================================
// Domain Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Transition '{action}' is not valid from step '{from}'")]
    InvalidTransition { from: Step, action: &'static str },

    #[error("Cannot run policy checks on an empty draft")]
    EmptyDraft,

    #[error("Policy checks have not completed")]
    PolicyPending,

    #[error("Cannot proceed with policy violations")]
    PolicyNotPassed,

    #[error("Wallet must be connected before forwarding for execution")]
    WalletDisconnected,

    #[error("Execution is in progress; the request cannot be reset")]
    ExecutionInProgress,

    #[error("Execution already reached a terminal phase")]
    ExecutionFinished,
}

// ============================================================================
// Aggregate: GateWorkflow
// ============================================================================

/// The four-step control gate pipeline.
///
/// # Invariants
/// - `request` and `phase` are `Some` exactly when `step == Execution`
/// - `policy_result` is `Some` from policy completion until reset
/// - the frozen request is never mutated after `forward_for_execution`
#[derive(Debug, Clone)]
pub struct GateWorkflow {
    step: Step,
    page: Page,
    draft: ContractDraft,
    policy_result: Option<PolicyCheckResult>,
    request: Option<ContractRequest>,
    phase: Option<ExecutionPhase>,
    failure: Option<String>,
}

impl GateWorkflow {
    pub fn new() -> Self {
        Self {
            step: Step::Form,
            page: Page::Home,
            draft: ContractDraft::default(),
            policy_result: None,
            request: None,
            phase: None,
            failure: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn draft(&self) -> &ContractDraft {
        &self.draft
    }

    pub fn policy_result(&self) -> Option<&PolicyCheckResult> {
        self.policy_result.as_ref()
    }

    pub fn request(&self) -> Option<&ContractRequest> {
        self.request.as_ref()
    }

    pub fn phase(&self) -> Option<ExecutionPhase> {
        self.phase
    }

    /// Error message recorded by a failed execution, if any
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Page navigation is orthogonal to the pipeline and always permitted
    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    /// Accept form input and advance to the preview step
    pub fn submit_draft(&mut self, draft: ContractDraft) -> Result<(), WorkflowError> {
        self.require_step(Step::Form, "submit_draft")?;
        self.draft = draft;
        self.step = Step::Preview;
        Ok(())
    }

    /// Return from preview to the form, keeping the draft for editing
    pub fn back_to_form(&mut self) -> Result<(), WorkflowError> {
        self.require_step(Step::Preview, "back_to_form")?;
        self.step = Step::Form;
        Ok(())
    }

    /// Advance from preview to policy review. Requires a non-empty draft.
    pub fn proceed_to_policy(&mut self) -> Result<(), WorkflowError> {
        self.require_step(Step::Preview, "proceed_to_policy")?;
        if self.draft.is_empty() {
            return Err(WorkflowError::EmptyDraft);
        }
        self.policy_result = None;
        self.step = Step::Policy;
        Ok(())
    }

    /// Attach the evaluated policy report
    pub fn record_policy_result(&mut self, result: PolicyCheckResult) -> Result<(), WorkflowError> {
        self.require_step(Step::Policy, "record_policy_result")?;
        self.policy_result = Some(result);
        Ok(())
    }

    /// Freeze the draft and enter the execution step.
    ///
    /// Requires a passed policy report and a connected wallet. A disconnected
    /// wallet blocks the forward action; the workflow stays in the policy
    /// step so the caller can surface the warning inline.
    pub fn forward_for_execution(
        &mut self,
        wallet_connected: bool,
    ) -> Result<ContractRequest, WorkflowError> {
        self.require_step(Step::Policy, "forward_for_execution")?;
        let result = self
            .policy_result
            .clone()
            .ok_or(WorkflowError::PolicyPending)?;
        if !result.passed {
            return Err(WorkflowError::PolicyNotPassed);
        }
        if !wallet_connected {
            return Err(WorkflowError::WalletDisconnected);
        }

        let request = ContractRequest::freeze(&self.draft, result);
        self.request = Some(request.clone());
        self.phase = Some(ExecutionPhase::AwaitingSignature);
        self.failure = None;
        self.step = Step::Execution;
        Ok(request)
    }

    /// Signature obtained; the transaction is being submitted
    pub fn begin_submission(&mut self) -> Result<(), WorkflowError> {
        self.require_phase(ExecutionPhase::AwaitingSignature, "begin_submission")?;
        self.phase = Some(ExecutionPhase::Submitting);
        Ok(())
    }

    /// Submission confirmed
    pub fn complete_execution(&mut self) -> Result<(), WorkflowError> {
        self.require_phase(ExecutionPhase::Submitting, "complete_execution")?;
        self.phase = Some(ExecutionPhase::Complete);
        Ok(())
    }

    /// A signing or submission error is terminal; only reset exits
    pub fn fail_execution(&mut self, error: impl Into<String>) -> Result<(), WorkflowError> {
        self.require_step(Step::Execution, "fail_execution")?;
        match self.phase {
            Some(ExecutionPhase::AwaitingSignature) | Some(ExecutionPhase::Submitting) => {
                self.phase = Some(ExecutionPhase::Failed);
                self.failure = Some(error.into());
                Ok(())
            }
            _ => Err(WorkflowError::ExecutionFinished),
        }
    }

    /// Terminal reset: back to an empty form.
    ///
    /// Only valid once the execution sub-machine has reached `Complete` or
    /// `Failed`; an in-flight signature cannot be cancelled.
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        self.require_step(Step::Execution, "reset")?;
        match self.phase {
            Some(ExecutionPhase::Complete) | Some(ExecutionPhase::Failed) => {
                *self = Self {
                    page: self.page,
                    ..Self::new()
                };
                Ok(())
            }
            _ => Err(WorkflowError::ExecutionInProgress),
        }
    }

    fn require_step(&self, expected: Step, action: &'static str) -> Result<(), WorkflowError> {
        if self.step != expected {
            return Err(WorkflowError::InvalidTransition {
                from: self.step,
                action,
            });
        }
        Ok(())
    }

    fn require_phase(
        &self,
        expected: ExecutionPhase,
        action: &'static str,
    ) -> Result<(), WorkflowError> {
        self.require_step(Step::Execution, action)?;
        if self.phase != Some(expected) {
            return Err(WorkflowError::InvalidTransition {
                from: self.step,
                action,
            });
        }
        Ok(())
    }
}

impl Default for GateWorkflow {
    fn default() -> Self {
        Self::new()
    }
}
