//! Prometheus rule-file data model and parsing.
//!
//! A rule file is a YAML document with a single `groups` list; each group
//! carries alerting and recording rules. The structural decode is strict
//! (unknown fields are an error), and on top of it a raw-text scan attaches
//! the contiguous comment block preceding each rule entry to that rule, so
//! suppression directives written as head comments survive parsing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

#[cfg(test)]
#[path = "rulefile_tests.rs"]
mod tests;

/// Parser configuration, threaded into every decode call.
///
/// Backend-specific fields are gated here instead of behind a global toggle
/// so decoding stays safe under concurrent use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Accept the multi-tenant `source_tenants` group field (Cortex/Mimir).
    pub allow_source_tenants: bool,
}

/// The kind of a rule, used to resolve validation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleType {
    #[serde(rename = "alert")]
    Alert,
    #[serde(rename = "recording")]
    Recording,
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleType::Alert => write!(f, "alert"),
            RuleType::Recording => write!(f, "recording rule"),
        }
    }
}

/// Alert-or-recording discriminant with the fields only one kind carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    Alert {
        name: String,
        /// The `for` clause, as written (a Prometheus duration string).
        wait_for: Option<String>,
        keep_firing_for: Option<String>,
    },
    Recording {
        name: String,
    },
}

/// One alerting or recording rule. Immutable after parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    pub expr: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// The comment block immediately preceding this rule in the source
    /// file, used for suppression directives. Empty when there is none.
    pub comment: String,
}

impl Rule {
    /// The alert name or the recorded metric name.
    pub fn name(&self) -> &str {
        match &self.kind {
            RuleKind::Alert { name, .. } => name,
            RuleKind::Recording { name } => name,
        }
    }

    pub fn rule_type(&self) -> RuleType {
        match self.kind {
            RuleKind::Alert { .. } => RuleType::Alert,
            RuleKind::Recording { .. } => RuleType::Recording,
        }
    }
}

/// A named group of rules sharing an evaluation interval and tenant set.
/// Read-only after parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    pub name: String,
    pub interval: Option<String>,
    pub query_offset: Option<String>,
    pub limit: Option<i64>,
    pub partial_response_strategy: Option<String>,
    /// Tenants whose data the group's queries read. Empty means the
    /// default tenant.
    pub source_tenants: Vec<String>,
    pub rules: Vec<Rule>,
}

// YAML-level shapes. Kept separate from the public model so the decode can
// stay strict while the model stays convenient.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFileDoc {
    groups: Vec<RuleGroupDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleGroupDoc {
    name: String,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    query_offset: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    partial_response_strategy: Option<String>,
    #[serde(default)]
    source_tenants: Vec<String>,
    #[serde(default)]
    rules: Vec<RuleDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDoc {
    #[serde(default)]
    alert: Option<String>,
    #[serde(default)]
    record: Option<String>,
    expr: String,
    #[serde(default, rename = "for")]
    wait_for: Option<String>,
    #[serde(default)]
    keep_firing_for: Option<String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
}

/// Parses the rule file at `path`.
pub fn parse_file(path: &Path, options: &ParserOptions) -> Result<Vec<RuleGroup>, ParseError> {
    let label = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ParseError::FileRead {
        path: label.clone(),
        source,
    })?;
    parse_content(&label, &content, options)
}

/// Parses rule-file content. `path` is used only for error messages.
pub fn parse_content(
    path: &str,
    content: &str,
    options: &ParserOptions,
) -> Result<Vec<RuleGroup>, ParseError> {
    let doc: RuleFileDoc =
        serde_yaml::from_str(content).map_err(|err| ParseError::InvalidYaml {
            path: path.to_string(),
            reason: err.to_string(),
        })?;

    let mut comments = head_comments(content).into_iter();
    let mut groups = Vec::with_capacity(doc.groups.len());
    for group in doc.groups {
        if !group.source_tenants.is_empty() && !options.allow_source_tenants {
            return Err(ParseError::SourceTenantsDisabled {
                path: path.to_string(),
                group: group.name,
            });
        }

        let mut rules = Vec::with_capacity(group.rules.len());
        for rule in group.rules {
            let kind = match (rule.alert, rule.record) {
                (Some(name), None) => RuleKind::Alert {
                    name,
                    wait_for: rule.wait_for,
                    keep_firing_for: rule.keep_firing_for,
                },
                (None, Some(name)) => {
                    if rule.wait_for.is_some() || rule.keep_firing_for.is_some() {
                        return Err(ParseError::InvalidYaml {
                            path: path.to_string(),
                            reason: format!(
                                "recording rule `{name}` must not set `for` or `keep_firing_for`"
                            ),
                        });
                    }
                    RuleKind::Recording { name }
                }
                (Some(alert), Some(record)) => {
                    return Err(ParseError::InvalidYaml {
                        path: path.to_string(),
                        reason: format!(
                            "rule sets both `alert: {alert}` and `record: {record}`"
                        ),
                    })
                }
                (None, None) => {
                    return Err(ParseError::InvalidYaml {
                        path: path.to_string(),
                        reason: "rule sets neither `alert` nor `record`".to_string(),
                    })
                }
            };
            rules.push(Rule {
                kind,
                expr: rule.expr,
                labels: rule.labels,
                annotations: rule.annotations,
                comment: comments.next().unwrap_or_default(),
            });
        }

        groups.push(RuleGroup {
            name: group.name,
            interval: group.interval,
            query_offset: group.query_offset,
            limit: group.limit,
            partial_response_strategy: group.partial_response_strategy,
            source_tenants: group.source_tenants,
            rules,
        });
    }
    Ok(groups)
}

/// Collects, in document order, the comment block immediately preceding each
/// rule entry (`- alert:` / `- record:` lines).
///
/// A blank line or any non-comment line breaks the pending block, matching
/// how YAML head comments attach to nodes.
fn head_comments(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            pending.clear();
        } else if trimmed.starts_with('#') {
            pending.push(trimmed);
        } else if is_rule_start(trimmed) {
            out.push(pending.join("\n"));
            pending.clear();
        } else {
            pending.clear();
        }
    }
    out
}

/// Whether a line opens a rule list entry.
///
/// YAML key order is insignificant, so the entry's first key can be any of
/// the rule keys, not just the `alert`/`record` discriminant. Group entries
/// (`- name:`, `- interval:`, ...) share no keys with rules, so they never
/// match here.
fn is_rule_start(trimmed: &str) -> bool {
    let Some(rest) = trimmed.strip_prefix('-') else {
        return false;
    };
    let rest = rest.trim_start();
    for key in [
        "alert",
        "record",
        "expr",
        "for",
        "keep_firing_for",
        "labels",
        "annotations",
    ] {
        if let Some(after) = rest.strip_prefix(key) {
            if after.trim_start().starts_with(':') {
                return true;
            }
        }
    }
    false
}
