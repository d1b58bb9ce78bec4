// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Declarative Field Validation (Action Configuration)
//!
//! A small rule interpreter: rule sets are declarative `{field, rule,
//! message, value?}` tuples, evaluated against a draft by a closed mapping
//! from rule kind to predicate, fixed at compile time. There is no runtime
//! validator registration.
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | `ValidationRule` | One declarative rule bound to a draft field |
//! | `RuleKind` | Closed predicate set: required, address, minLength, maxLength |
//! | `ValidationReport` | Accumulated field errors; valid when empty |
//!
//! Rule sets may arrive from serialized configuration, so `RuleKind` keeps a
//! catch-all variant for names this build does not know. Unknown rules are
//! logged as a diagnostic and treated as passing (fail-open), unlike the
//! policy evaluator which fails closed on unparseable input.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::request::ContractDraft;

/// Draft fields addressable by validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    ContractAddress,
    Method,
    Parameters,
    Reason,
}

impl Field {
    fn value_in<'a>(&self, draft: &'a ContractDraft) -> &'a str {
        match self {
            Field::ContractAddress => &draft.contract_address,
            Field::Method => &draft.method,
            Field::Parameters => &draft.parameters,
            Field::Reason => &draft.reason,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::ContractAddress => "contractAddress",
            Field::Method => "method",
            Field::Parameters => "parameters",
            Field::Reason => "reason",
        };
        write!(f, "{}", name)
    }
}

/// Closed set of rule predicates.
///
/// `Unknown` absorbs rule names from newer (or corrupt) rule sets; see the
/// module docs for its fail-open semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    Address,
    MinLength,
    MaxLength,
    #[serde(other)]
    Unknown,
}

/// One declarative validation rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    pub field: Field,
    pub rule: RuleKind,
    /// Threshold for the length rules; unused otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<usize>,
    pub message: String,
}

impl ValidationRule {
    pub fn new(field: Field, rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            field,
            rule,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_value(field: Field, rule: RuleKind, value: usize, message: impl Into<String>) -> Self {
        Self {
            field,
            rule,
            value: Some(value),
            message: message.into(),
        }
    }
}

/// A single accumulated failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Result of evaluating a rule set against a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

/// Evaluates declarative rule sets against drafts
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    address_re: Regex,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self {
            // Address rule accepts the bare 40-hex form; the 0x prefix is optional here
            address_re: Regex::new(r"^(0x)?[0-9a-fA-F]{40}$").expect("valid address pattern"),
        }
    }

    /// Evaluate `rules` against `draft`, accumulating every failure.
    pub fn validate(&self, draft: &ContractDraft, rules: &[ValidationRule]) -> ValidationReport {
        let mut errors = Vec::new();

        for rule in rules {
            let value = rule.field.value_in(draft);
            let passed = match rule.rule {
                RuleKind::Required => !value.is_empty(),
                RuleKind::Address => self.address_re.is_match(value),
                RuleKind::MinLength => match rule.value {
                    Some(min) => value.chars().count() >= min,
                    None => {
                        warn!(field = %rule.field, "minLength rule without threshold");
                        false
                    }
                },
                RuleKind::MaxLength => match rule.value {
                    Some(max) => value.chars().count() <= max,
                    None => {
                        warn!(field = %rule.field, "maxLength rule without threshold");
                        false
                    }
                },
                RuleKind::Unknown => {
                    warn!(field = %rule.field, "unknown validation rule, treating as passing");
                    true
                }
            };

            if !passed {
                errors.push(FieldError {
                    field: rule.field,
                    message: rule.message.clone(),
                });
            }
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// The fixed rule set applied before a request may proceed to execution.
    pub fn execution_rules() -> Vec<ValidationRule> {
        vec![
            ValidationRule::new(
                Field::ContractAddress,
                RuleKind::Required,
                "Contract address is required",
            ),
            ValidationRule::new(
                Field::ContractAddress,
                RuleKind::Address,
                "Invalid contract address format",
            ),
            ValidationRule::new(Field::Method, RuleKind::Required, "Method name is required"),
            ValidationRule::new(
                Field::Parameters,
                RuleKind::Required,
                "Parameters are required",
            ),
            ValidationRule::new(Field::Reason, RuleKind::Required, "Reason is required"),
            ValidationRule::with_value(
                Field::Reason,
                RuleKind::MinLength,
                10,
                "Reason must be at least 10 characters",
            ),
        ]
    }

    /// Pre-execution validation with the fixed rule set.
    pub fn validate_for_execution(&self, draft: &ContractDraft) -> ValidationReport {
        self.validate(draft, &Self::execution_rules())
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}
