//! # RuleGuard Core
//!
//! This crate provides the validation orchestration engine for RuleGuard, a
//! CI gate that checks Prometheus alerting and recording rules against a
//! configurable catalog of checks.
//!
//! ## Overview
//!
//! A validation run walks an ordered list of rule files:
//! 1. Each file is parsed into rule groups ([`rulefile`])
//! 2. The orchestrator resolves which configured validation rules apply to
//!    each group and rule, honoring exclusion annotations and suppression
//!    comments ([`orchestrator`], [`suppression`])
//! 3. Validators evaluate their checks, optionally against a live
//!    Prometheus ([`validator`], [`validators`])
//! 4. Outcomes roll up into a hierarchical pass/fail report ([`report`])
//!
//! Files are validated in parallel; the report always preserves input
//! order. A failing check never stops sibling checks, rules, groups, or
//! files. Only a parse failure is fatal, and only to its own file.
//!
//! ## Main entry points
//!
//! - [`orchestrator::validate_files`] - run a full validation
//! - [`validator::build_validator`] - build one check from configuration
//! - [`model::ValidationRuleSpec`] - a named, scoped bundle of checks

pub mod duration;
pub mod errors;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod rulefile;
pub mod suppression;
pub mod validator;
pub mod validators;

pub use errors::{ConfigError, ParseError};
pub use model::{Scope, ValidationRuleSpec};
pub use orchestrator::{validate_files, ValidationOptions};
pub use report::{FileReport, GroupReport, RuleReport, ValidationReport};
pub use rulefile::{ParserOptions, Rule, RuleGroup, RuleType};
pub use validator::{build_validator, Validator, ValidatorConfig};
