//! The validation orchestrator.
//!
//! Walks parsed files, groups, and rules, resolves which configured
//! validation rules apply (scope, exclusion annotation, suppression
//! comments, preconditions), invokes the validators, and assembles the
//! hierarchical report.
//!
//! Files are independent and validated in parallel; the final report always
//! lists them in input order no matter which worker finishes first. Errors
//! are additive and local: a failing check never stops sibling checks,
//! rules, groups, or files. Only a parse failure is fatal to its file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use prometheus_client::PrometheusClient;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::model::{Scope, ValidationRuleSpec};
use crate::report::{FileReport, GroupReport, RuleReport, ValidationReport};
use crate::rulefile::{self, ParserOptions, Rule, RuleGroup};
use crate::suppression;

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

/// Run-wide orchestration settings.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Rule annotation listing validation-rule names to skip for that rule.
    pub exclusion_annotation: String,
    /// Comment prefix disabling individual validators for one rule.
    pub suppression_prefix: String,
    /// Groups to mark excluded without descending into their rules.
    pub skip_groups: BTreeSet<String>,
    pub parser: ParserOptions,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            exclusion_annotation: suppression::DEFAULT_EXCLUSION_ANNOTATION.to_string(),
            suppression_prefix: suppression::DEFAULT_SUPPRESSION_PREFIX.to_string(),
            skip_groups: BTreeSet::new(),
            parser: ParserOptions::default(),
        }
    }
}

/// Validates the given rule files against the configured validation rules
/// and returns the assembled report.
///
/// `client` is `None` when no Prometheus backend is configured; checks that
/// need one report that as their own error.
#[instrument(skip_all, fields(files = paths.len(), specs = specs.len()))]
pub async fn validate_files(
    paths: &[PathBuf],
    specs: Arc<Vec<ValidationRuleSpec>>,
    options: Arc<ValidationOptions>,
    client: Option<Arc<PrometheusClient>>,
) -> ValidationReport {
    let started = Instant::now();
    info!(files = paths.len(), "Starting validation run");

    let mut workers = JoinSet::new();
    for (index, path) in paths.iter().enumerate() {
        let path = path.clone();
        let specs = Arc::clone(&specs);
        let options = Arc::clone(&options);
        let client = client.clone();
        workers.spawn(async move {
            let file = validate_file(&path, &specs, &options, client.as_deref()).await;
            (index, file)
        });
    }

    // Workers finish in arbitrary order; slot results back by input index
    // so the report preserves input file order.
    let mut slots: Vec<Option<FileReport>> = Vec::new();
    slots.resize_with(paths.len(), || None);
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((index, file)) => slots[index] = Some(file),
            Err(err) => warn!(error = %err, "Validation worker failed"),
        }
    }

    let mut report = ValidationReport::new();
    for (index, slot) in slots.into_iter().enumerate() {
        report.add_file(slot.unwrap_or_else(|| {
            let mut file = FileReport::new(paths[index].display().to_string());
            file.add_error("validation worker failed unexpectedly".to_string());
            file
        }));
    }
    report.finish(started.elapsed());
    info!(
        failed = report.failed,
        errors = report.errors_count,
        duration_ms = report.duration_ms,
        "Validation run finished"
    );
    report
}

async fn validate_file(
    path: &Path,
    specs: &[ValidationRuleSpec],
    options: &ValidationOptions,
    client: Option<&PrometheusClient>,
) -> FileReport {
    let mut file_report = FileReport::new(path.display().to_string());
    let groups = match rulefile::parse_file(path, &options.parser) {
        Ok(groups) => groups,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Rule file failed to parse");
            file_report.add_error(err.to_string());
            return file_report;
        }
    };
    for group in &groups {
        file_report.add_group(validate_group(group, specs, options, client).await);
    }
    file_report
}

async fn validate_group(
    group: &RuleGroup,
    specs: &[ValidationRuleSpec],
    options: &ValidationOptions,
    client: Option<&PrometheusClient>,
) -> GroupReport {
    let mut group_report = GroupReport::new(&group.name);
    if options.skip_groups.contains(&group.name) {
        debug!(group = %group.name, "Skipping excluded group");
        group_report.excluded = true;
        return group_report;
    }

    // Group-scoped validation rules run exactly once per group, member
    // rules or not.
    for spec in specs.iter().filter(|s| s.scope() == Scope::Group) {
        if !preconditions_hold(spec, group, None, client).await {
            continue;
        }
        for attached in spec.validators() {
            for error in attached.validator.validate(group, None, client).await {
                group_report.add_error(format_error(spec.name(), attached.validator.name(), &error));
            }
        }
    }

    for rule in &group.rules {
        group_report.add_rule(validate_rule(group, rule, specs, options, client).await);
    }
    group_report
}

async fn validate_rule(
    group: &RuleGroup,
    rule: &Rule,
    specs: &[ValidationRuleSpec],
    options: &ValidationOptions,
    client: Option<&PrometheusClient>,
) -> RuleReport {
    let mut rule_report = RuleReport::new(rule.name(), rule.rule_type());

    let excluded_specs = rule
        .annotations
        .get(&options.exclusion_annotation)
        .map(|value| suppression::excluded_rule_names(value))
        .unwrap_or_default();
    let mut suppressed =
        suppression::disabled_validators(&rule.comment, &options.suppression_prefix);
    suppressed.extend(suppression::disabled_validators(
        &rule.expr,
        &options.suppression_prefix,
    ));

    let applicable: Vec<&ValidationRuleSpec> = specs
        .iter()
        .filter(|spec| spec.scope().applies_to(rule.rule_type()))
        .collect();

    let mut skipped_by_annotation = 0usize;
    for spec in &applicable {
        if excluded_specs.contains(spec.name()) {
            debug!(
                rule = rule.name(),
                spec = spec.name(),
                "Validation rule disabled by exclusion annotation"
            );
            skipped_by_annotation += 1;
            continue;
        }
        if !preconditions_hold(spec, group, Some(rule), client).await {
            continue;
        }
        for attached in spec.validators() {
            if suppressed.contains(attached.validator.name()) {
                debug!(
                    rule = rule.name(),
                    validator = attached.validator.name(),
                    "Validator disabled by suppression comment"
                );
                continue;
            }
            for error in attached
                .validator
                .validate(group, Some(rule), client)
                .await
            {
                rule_report.add_error(format_error(spec.name(), attached.validator.name(), &error));
            }
        }
    }

    // The rule counts as excluded when the annotation disabled every
    // validation rule that would have applied to it.
    rule_report.excluded = !applicable.is_empty() && skipped_by_annotation == applicable.len();
    rule_report
}

/// Evaluates a spec's preconditions. Any precondition error means the
/// spec's main validators are skipped, which is a no-op rather than a
/// failure.
async fn preconditions_hold(
    spec: &ValidationRuleSpec,
    group: &RuleGroup,
    rule: Option<&Rule>,
    client: Option<&PrometheusClient>,
) -> bool {
    for attached in spec.only_if() {
        if !attached
            .validator
            .validate(group, rule, client)
            .await
            .is_empty()
        {
            debug!(spec = spec.name(), "Precondition not met, skipping validation rule");
            return false;
        }
    }
    true
}

fn format_error(spec_name: &str, validator_name: &str, error: &str) -> String {
    format!("{spec_name}: {validator_name}: {error}")
}
