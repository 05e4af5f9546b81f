//! Tests for the report tree and validity bubbling.

use super::*;

/// Verify a rule error invalidates the rule, its group, its file, and the
/// root.
#[test]
fn test_validity_bubbles_to_root() {
    let mut rule = RuleReport::new("NodeHighLoad", RuleType::Alert);
    rule.add_error("missing label `severity`".to_string());
    assert!(!rule.valid);

    let mut group = GroupReport::new("node-alerts");
    group.add_rule(rule);
    assert!(!group.valid);

    let mut file = FileReport::new("rules/node.yaml");
    file.add_group(group);
    assert!(!file.valid);

    let mut report = ValidationReport::new();
    report.add_file(file);
    assert!(report.failed);
}

/// Verify a valid sibling does not mask an earlier failure.
#[test]
fn test_valid_sibling_does_not_reset_failure() {
    let mut group = GroupReport::new("g");
    let mut bad = RuleReport::new("bad", RuleType::Alert);
    bad.add_error("boom".to_string());
    group.add_rule(bad);
    group.add_rule(RuleReport::new("good", RuleType::Recording));
    assert!(!group.valid);
    assert!(group.rules[1].valid);
}

/// Verify file-level parse errors count as failures without any groups.
#[test]
fn test_file_level_errors_fail_the_run() {
    let mut file = FileReport::new("broken.yaml");
    file.add_error("yaml: mapping values are not allowed".to_string());

    let mut report = ValidationReport::new();
    report.add_file(file);
    assert!(report.failed);
}

/// Verify everything-valid stays valid.
#[test]
fn test_all_valid_report_is_not_failed() {
    let mut group = GroupReport::new("g");
    group.add_rule(RuleReport::new("r", RuleType::Recording));
    let mut file = FileReport::new("f.yaml");
    file.add_group(group);
    let mut report = ValidationReport::new();
    report.add_file(file);
    report.finish(Duration::from_millis(12));

    assert!(!report.failed);
    assert_eq!(report.files_count, 1);
    assert_eq!(report.groups_count, 1);
    assert_eq!(report.rules_count, 1);
    assert_eq!(report.errors_count, 0);
    assert_eq!(report.duration_ms, 12);
}

/// Verify the counters sum errors and exclusions across all levels.
#[test]
fn test_finish_counts_across_levels() {
    let mut report = ValidationReport::new();

    let mut file_a = FileReport::new("a.yaml");
    let mut group = GroupReport::new("g1");
    group.add_error("group check failed".to_string());
    let mut rule = RuleReport::new("r1", RuleType::Alert);
    rule.add_error("e1".to_string());
    rule.add_error("e2".to_string());
    group.add_rule(rule);
    let mut excluded_rule = RuleReport::new("r2", RuleType::Alert);
    excluded_rule.excluded = true;
    group.add_rule(excluded_rule);
    file_a.add_group(group);
    let mut skipped = GroupReport::new("g2");
    skipped.excluded = true;
    file_a.add_group(skipped);
    report.add_file(file_a);

    let mut file_b = FileReport::new("b.yaml");
    file_b.add_error("parse error".to_string());
    report.add_file(file_b);

    report.finish(Duration::from_secs(1));
    assert_eq!(report.files_count, 2);
    assert_eq!(report.groups_count, 2);
    assert_eq!(report.groups_excluded, 1);
    assert_eq!(report.rules_count, 2);
    assert_eq!(report.rules_excluded, 1);
    assert_eq!(report.errors_count, 4);
    assert!(report.failed);
}
