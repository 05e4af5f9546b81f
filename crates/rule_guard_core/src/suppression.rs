//! Suppression directives and exclusion annotations.
//!
//! Two per-rule escape hatches exist:
//!
//! - A comment line of the form `# <prefix>:name1,name2` disables the named
//!   validators for that one rule. The line may sit in the comment block
//!   above the rule or inside the expression itself (PromQL treats `#` lines
//!   as comments), but only lines whose sole content is the comment count.
//! - A configured annotation on the rule lists validation *rule* names to
//!   skip entirely for that rule.

use std::collections::BTreeSet;

#[cfg(test)]
#[path = "suppression_tests.rs"]
mod tests;

/// Annotation listing validation-rule names to skip for a rule.
pub const DEFAULT_EXCLUSION_ANNOTATION: &str = "disabled_validation_rules";

/// Comment prefix disabling individual validators for a rule.
pub const DEFAULT_SUPPRESSION_PREFIX: &str = "ignore_validations";

/// Extracts validator names disabled by `# <prefix>:<csv>` directives in
/// `text`.
///
/// `text` may be a retained head-comment block or a full rule expression;
/// only lines whose non-whitespace content is a single comment are
/// considered, so a directive cannot hide behind trailing code.
pub fn disabled_validators(text: &str, prefix: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for line in text.lines() {
        let Some(comment) = line.trim().strip_prefix('#') else {
            continue;
        };
        let Some(csv) = comment.trim().strip_prefix(prefix) else {
            continue;
        };
        let Some(csv) = csv.trim_start().strip_prefix(':') else {
            continue;
        };
        names.extend(
            csv.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
    }
    names
}

/// Splits an exclusion-annotation value into the set of validation-rule
/// names it disables: comma-separated, whitespace-trimmed, de-duplicated.
pub fn excluded_rule_names(annotation_value: &str) -> BTreeSet<String> {
    annotation_value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
