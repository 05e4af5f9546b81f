//! Tests for annotation checks.

use super::*;

use crate::rulefile::{parse_content, ParserOptions, RuleGroup};

fn group_with_annotations(annotations_yaml: &str) -> RuleGroup {
    let content = format!(
        "groups:\n  - name: g\n    rules:\n      - alert: A\n        expr: up == 0\n{annotations_yaml}"
    );
    parse_content("test.yaml", &content, &ParserOptions::default())
        .expect("test rule file should parse")
        .remove(0)
}

fn config(params: serde_yaml::Value) -> ValidatorConfig {
    ValidatorConfig {
        validator_type: String::new(),
        params,
        additional_details: None,
    }
}

#[tokio::test]
async fn test_has_annotations() {
    let group = group_with_annotations("        annotations:\n          summary: something\n");
    let validator = HasAnnotations::from_config(&config(
        serde_yaml::from_str("annotations: [summary, runbook_url]").unwrap(),
    ))
    .unwrap();

    let errors = validator.validate(&group, Some(&group.rules[0]), None).await;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("runbook_url"));
}

#[tokio::test]
async fn test_annotation_matches_regexp() {
    let group = group_with_annotations(
        "        annotations:\n          summary: \"Node is down\"\n",
    );
    let validator = AnnotationMatchesRegexp::from_config(&config(
        serde_yaml::from_str("annotation: summary\nregexp: \"^[A-Z].*\"").unwrap(),
    ))
    .unwrap();
    assert!(validator.validate(&group, Some(&group.rules[0]), None).await.is_empty());

    let validator = AnnotationMatchesRegexp::from_config(&config(
        serde_yaml::from_str("annotation: summary\nregexp: \"^[a-z].*\"").unwrap(),
    ))
    .unwrap();
    let errors = validator.validate(&group, Some(&group.rules[0]), None).await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_annotation_is_valid_url() {
    let group = group_with_annotations(
        "        annotations:\n          runbook_url: \"https://runbooks.example.com/node\"\n",
    );
    let validator = AnnotationIsValidUrl::from_config(&config(
        serde_yaml::from_str("annotation: runbook_url").unwrap(),
    ))
    .unwrap();
    assert!(validator.validate(&group, Some(&group.rules[0]), None).await.is_empty());

    let group = group_with_annotations(
        "        annotations:\n          runbook_url: \"not a url\"\n",
    );
    let errors = validator.validate(&group, Some(&group.rules[0]), None).await;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("runbook_url"));
}

/// An absent annotation is hasAnnotations' concern, not this check's.
#[tokio::test]
async fn test_annotation_is_valid_url_skips_absent_annotation() {
    let group = group_with_annotations("");
    let validator = AnnotationIsValidUrl::from_config(&config(
        serde_yaml::from_str("annotation: runbook_url").unwrap(),
    ))
    .unwrap();
    assert!(validator.validate(&group, Some(&group.rules[0]), None).await.is_empty());
}
