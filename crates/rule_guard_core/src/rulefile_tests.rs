//! Tests for rule-file parsing.

use super::*;

const OPTIONS: ParserOptions = ParserOptions {
    allow_source_tenants: true,
};

const BASIC_FILE: &str = r#"
groups:
  - name: node-alerts
    interval: 1m
    rules:
      # High load on a node.
      # ignore_validations: expressionReturnsData
      - alert: NodeHighLoad
        expr: node_load5 > 10
        for: 5m
        labels:
          severity: warning
        annotations:
          summary: Node load is high
      - record: job:up:count
        expr: count(up) by (job)
"#;

#[test]
fn test_parse_basic_file() {
    let groups = parse_content("basic.yaml", BASIC_FILE, &OPTIONS).unwrap();
    assert_eq!(groups.len(), 1);

    let group = &groups[0];
    assert_eq!(group.name, "node-alerts");
    assert_eq!(group.interval.as_deref(), Some("1m"));
    assert!(group.source_tenants.is_empty());
    assert_eq!(group.rules.len(), 2);

    let alert = &group.rules[0];
    assert_eq!(alert.name(), "NodeHighLoad");
    assert_eq!(alert.rule_type(), RuleType::Alert);
    assert_eq!(alert.expr, "node_load5 > 10");
    assert_eq!(alert.labels.get("severity").map(String::as_str), Some("warning"));
    match &alert.kind {
        RuleKind::Alert { wait_for, .. } => assert_eq!(wait_for.as_deref(), Some("5m")),
        other => panic!("expected alert, got {other:?}"),
    }

    let recording = &group.rules[1];
    assert_eq!(recording.name(), "job:up:count");
    assert_eq!(recording.rule_type(), RuleType::Recording);
}

/// Verify the head-comment block lands on the rule that follows it.
#[test]
fn test_head_comments_attach_to_rules() {
    let groups = parse_content("basic.yaml", BASIC_FILE, &OPTIONS).unwrap();
    let alert = &groups[0].rules[0];
    assert!(alert.comment.contains("High load on a node."));
    assert!(alert.comment.contains("ignore_validations: expressionReturnsData"));

    // The recording rule has no head comment of its own.
    assert_eq!(groups[0].rules[1].comment, "");
}

/// Verify comment attribution survives a rule whose first YAML key is not
/// the alert/record discriminant (key order is insignificant in YAML).
#[test]
fn test_head_comments_attach_when_expr_comes_first() {
    let content = r#"
groups:
  - name: g
    rules:
      # ignore_validations: hasLabels
      - alert: A
        expr: up == 0
      - expr: up == 1
        alert: B
      # ignore_validations: hasAnnotations
      - alert: C
        expr: up == 2
"#;
    let groups = parse_content("f.yaml", content, &OPTIONS).unwrap();
    let rules = &groups[0].rules;
    assert!(rules[0].comment.contains("hasLabels"));
    assert_eq!(rules[1].comment, "", "expr-first rule has no head comment");
    assert!(
        rules[2].comment.contains("hasAnnotations"),
        "directive must stay with the rule it precedes"
    );
}

/// Verify a blank line detaches a comment block from the following rule.
#[test]
fn test_blank_line_breaks_comment_block() {
    let content = r#"
groups:
  - name: g
    rules:
      # detached comment

      - record: r
        expr: up
"#;
    let groups = parse_content("f.yaml", content, &OPTIONS).unwrap();
    assert_eq!(groups[0].rules[0].comment, "");
}

#[test]
fn test_unknown_field_is_a_parse_error() {
    let content = r#"
groups:
  - name: g
    rules:
      - record: r
        expr: up
        interval: 5m
"#;
    let err = parse_content("f.yaml", content, &OPTIONS).unwrap_err();
    assert!(matches!(err, ParseError::InvalidYaml { .. }));
}

#[test]
fn test_rule_needs_alert_or_record() {
    let content = r#"
groups:
  - name: g
    rules:
      - expr: up
"#;
    let err = parse_content("f.yaml", content, &OPTIONS).unwrap_err();
    assert!(err.to_string().contains("neither"));
}

#[test]
fn test_rule_cannot_be_both_alert_and_record() {
    let content = r#"
groups:
  - name: g
    rules:
      - alert: A
        record: r
        expr: up
"#;
    assert!(parse_content("f.yaml", content, &OPTIONS).is_err());
}

#[test]
fn test_recording_rule_rejects_for_clause() {
    let content = r#"
groups:
  - name: g
    rules:
      - record: r
        expr: up
        for: 5m
"#;
    let err = parse_content("f.yaml", content, &OPTIONS).unwrap_err();
    assert!(err.to_string().contains("keep_firing_for"));
}

#[test]
fn test_source_tenants_gated_by_parser_options() {
    let content = r#"
groups:
  - name: g
    source_tenants: [team-a, team-b]
    rules:
      - record: r
        expr: up
"#;
    let disabled = ParserOptions {
        allow_source_tenants: false,
    };
    let err = parse_content("f.yaml", content, &disabled).unwrap_err();
    assert!(matches!(err, ParseError::SourceTenantsDisabled { .. }));

    let groups = parse_content("f.yaml", content, &OPTIONS).unwrap();
    assert_eq!(groups[0].source_tenants, vec!["team-a", "team-b"]);
}

#[test]
fn test_invalid_yaml_is_a_parse_error() {
    let err = parse_content("f.yaml", "groups: [not a group", &OPTIONS).unwrap_err();
    assert!(matches!(err, ParseError::InvalidYaml { .. }));
}
