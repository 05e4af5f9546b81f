//! The validation rule model: named, scoped bundles of validators.
//!
//! A [`ValidationRuleSpec`] is built once from configuration at startup and
//! is read-only afterwards, so it can be shared freely across parallel
//! validation workers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rulefile::RuleType;
use crate::validator::Validator;

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

/// Which kind of entity a validation rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "alert")]
    Alert,
    #[serde(rename = "recordingRule")]
    RecordingRule,
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "all")]
    All,
}

impl Scope {
    /// Whether a validation rule with this scope applies to a rule of the
    /// given type. Group scope never matches individual rules.
    pub fn applies_to(self, rule_type: RuleType) -> bool {
        match self {
            Scope::All => true,
            Scope::Alert => rule_type == RuleType::Alert,
            Scope::RecordingRule => rule_type == RuleType::Recording,
            Scope::Group => false,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Alert => write!(f, "alert"),
            Scope::RecordingRule => write!(f, "recording rule"),
            Scope::Group => write!(f, "group"),
            Scope::All => write!(f, "all rules"),
        }
    }
}

/// A validator together with the operator's free-form note about it.
#[derive(Debug, Clone)]
pub struct AttachedValidator {
    pub validator: Arc<dyn Validator>,
    pub additional_details: Option<String>,
}

impl AttachedValidator {
    fn describe(&self) -> String {
        match &self.additional_details {
            Some(details) => format!("{} ({details})", self.validator.describe()),
            None => self.validator.describe(),
        }
    }
}

/// A named, scoped bundle of validators plus optional preconditions.
///
/// Mutable only through the attach methods during construction; once built
/// the orchestrator treats it as read-only.
#[derive(Debug, Clone)]
pub struct ValidationRuleSpec {
    name: String,
    scope: Scope,
    validators: Vec<AttachedValidator>,
    only_if: Vec<AttachedValidator>,
}

impl ValidationRuleSpec {
    pub fn new(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
            validators: Vec::new(),
            only_if: Vec::new(),
        }
    }

    /// The operator-facing name, used by exclusion annotations.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Attaches a main validator.
    pub fn attach_validator(
        &mut self,
        validator: Arc<dyn Validator>,
        additional_details: Option<String>,
    ) {
        self.validators.push(AttachedValidator {
            validator,
            additional_details,
        });
    }

    /// Attaches a precondition. If any precondition reports an error, the
    /// main validators are skipped for that rule (a no-op, not a failure).
    pub fn attach_only_if(
        &mut self,
        validator: Arc<dyn Validator>,
        additional_details: Option<String>,
    ) {
        self.only_if.push(AttachedValidator {
            validator,
            additional_details,
        });
    }

    pub fn validators(&self) -> &[AttachedValidator] {
        &self.validators
    }

    pub fn only_if(&self) -> &[AttachedValidator] {
        &self.only_if
    }

    /// Human-readable descriptions of everything this rule enforces, in
    /// attachment order. Used by the documentation command.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.validators.len() + self.only_if.len());
        for attached in &self.only_if {
            lines.push(format!("only if: {}", attached.describe()));
        }
        for attached in &self.validators {
            lines.push(attached.describe());
        }
        lines
    }
}
