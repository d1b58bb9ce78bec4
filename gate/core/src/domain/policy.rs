// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Policy Check Evaluator
//!
//! Pure evaluation of a draft against the fixed policy check sequence. The
//! four checks run in a fixed, display-significant order and never
//! short-circuit: every check appears in every report, pass or fail.
//!
//! The evaluator fails closed: unparseable input is a failed check, never a
//! skipped one. Contrast with the validation engine, which fails open on
//! unknown rule names (see `domain::validation`).

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::request::ContractDraft;

/// Outcome of a single named policy check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

/// Full policy report for one draft.
///
/// # Invariants
/// - `checks` always holds exactly [`CHECK_COUNT`] entries, in fixed order
/// - Never mutated after evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCheckResult {
    pub passed: bool,
    pub checks: Vec<PolicyCheck>,
    pub timestamp: DateTime<Utc>,
}

/// Number of checks in every report
pub const CHECK_COUNT: usize = 4;

/// Display names, in evaluation order
pub const CHECK_NAMES: [&str; CHECK_COUNT] = [
    "Contract Address Format",
    "Method Name Validation",
    "Parameters Format",
    "Reason Validation",
];

/// Minimum reason length accepted by the reason check
pub const MIN_REASON_LEN: usize = 10;

/// Evaluates drafts against the fixed policy check sequence
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    address_re: Regex,
    method_re: Regex,
}

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self {
            // Patterns are literals; construction cannot fail
            address_re: Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address pattern"),
            method_re: Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").expect("valid method pattern"),
        }
    }

    /// Run all four checks against a draft.
    ///
    /// All checks always evaluate, in order; `passed` is the conjunction.
    pub fn evaluate(&self, draft: &ContractDraft) -> PolicyCheckResult {
        let address_ok = self.address_re.is_match(&draft.contract_address);
        let method_ok = self.method_re.is_match(&draft.method);
        let params_ok = serde_json::from_str::<serde_json::Value>(&draft.parameters).is_ok();
        let reason_ok = draft.reason.chars().count() >= MIN_REASON_LEN;

        let checks = vec![
            check(
                CHECK_NAMES[0],
                address_ok,
                "Valid contract address format",
                "Invalid address format",
            ),
            check(
                CHECK_NAMES[1],
                method_ok,
                "Method name is valid",
                "Invalid method name format",
            ),
            check(
                CHECK_NAMES[2],
                params_ok,
                "Parameters are valid JSON",
                "Invalid JSON format",
            ),
            check(
                CHECK_NAMES[3],
                reason_ok,
                "Sufficient reason provided",
                "Reason too short",
            ),
        ];

        PolicyCheckResult {
            passed: checks.iter().all(|c| c.passed),
            checks,
            timestamp: Utc::now(),
        }
    }
}

impl Default for PolicyEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn check(name: &str, passed: bool, pass_msg: &str, fail_msg: &str) -> PolicyCheck {
    PolicyCheck {
        name: name.to_string(),
        passed,
        message: if passed { pass_msg } else { fail_msg }.to_string(),
    }
}
