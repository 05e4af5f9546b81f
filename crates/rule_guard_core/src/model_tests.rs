//! Tests for the validation rule model.

use super::*;

use crate::validator::{build_validator, ValidatorConfig};

fn validator(validator_type: &str, params: &str) -> Arc<dyn Validator> {
    build_validator(&ValidatorConfig {
        validator_type: validator_type.to_string(),
        params: serde_yaml::from_str(params).unwrap(),
        additional_details: None,
    })
    .unwrap()
}

#[test]
fn test_scope_applies_to() {
    assert!(Scope::All.applies_to(RuleType::Alert));
    assert!(Scope::All.applies_to(RuleType::Recording));
    assert!(Scope::Alert.applies_to(RuleType::Alert));
    assert!(!Scope::Alert.applies_to(RuleType::Recording));
    assert!(Scope::RecordingRule.applies_to(RuleType::Recording));
    assert!(!Scope::RecordingRule.applies_to(RuleType::Alert));
    assert!(!Scope::Group.applies_to(RuleType::Alert));
    assert!(!Scope::Group.applies_to(RuleType::Recording));
}

#[test]
fn test_scope_config_names() {
    assert_eq!(serde_yaml::from_str::<Scope>("alert").unwrap(), Scope::Alert);
    assert_eq!(
        serde_yaml::from_str::<Scope>("recordingRule").unwrap(),
        Scope::RecordingRule
    );
    assert_eq!(serde_yaml::from_str::<Scope>("group").unwrap(), Scope::Group);
    assert_eq!(serde_yaml::from_str::<Scope>("all").unwrap(), Scope::All);
    assert!(serde_yaml::from_str::<Scope>("everything").is_err());
}

#[test]
fn test_describe_lists_preconditions_first() {
    let mut spec = ValidationRuleSpec::new("check-severity", Scope::Alert);
    spec.attach_only_if(
        validator("expressionMatchesRegexp", "regexp: \".*\""),
        None,
    );
    spec.attach_validator(
        validator("hasLabels", "labels: [severity]"),
        Some("paging depends on this".to_string()),
    );

    let lines = spec.describe();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("only if:"));
    assert!(lines[1].contains("severity"));
    assert!(lines[1].contains("paging depends on this"));
}

#[test]
fn test_accessors() {
    let mut spec = ValidationRuleSpec::new("check-team", Scope::All);
    spec.attach_validator(validator("hasLabels", "labels: [team]"), None);

    assert_eq!(spec.name(), "check-team");
    assert_eq!(spec.scope(), Scope::All);
    assert_eq!(spec.validators().len(), 1);
    assert!(spec.only_if().is_empty());
}
