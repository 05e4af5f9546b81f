//! Tests for the validate command.

use super::*;

use std::fs;

use tempfile::TempDir;

const CONFIG: &str = r#"
validationRules:
  - name: check-severity
    scope: alert
    validations:
      - type: hasLabels
        params:
          labels: [severity]
"#;

const GOOD_RULES: &str = r#"
groups:
  - name: app-alerts
    rules:
      - alert: HighLatency
        expr: latency > 1
        labels:
          severity: warning
"#;

const BAD_RULES: &str = r#"
groups:
  - name: app-alerts
    rules:
      - alert: HighLatency
        expr: latency > 1
"#;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new(config: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("rule-guard.yaml");
        fs::write(&config_path, config).unwrap();
        Self {
            dir,
            config: config_path,
        }
    }

    fn add_rule_file(&self, name: &str, content: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    fn args(&self, files: Vec<String>) -> ValidateArgs {
        ValidateArgs {
            files,
            config: self.config.clone(),
            enabled_rules: Vec::new(),
            disabled_rules: Vec::new(),
            skip_groups: Vec::new(),
            output: OutputFormat::Json,
            color: false,
        }
    }
}

#[tokio::test]
async fn test_valid_rules_pass() {
    let workspace = Workspace::new(CONFIG);
    let file = workspace.add_rule_file("good.yaml", GOOD_RULES);

    let failed = execute(&workspace.args(vec![file])).await.unwrap();
    assert!(!failed);
}

#[tokio::test]
async fn test_invalid_rules_fail() {
    let workspace = Workspace::new(CONFIG);
    let file = workspace.add_rule_file("bad.yaml", BAD_RULES);

    let failed = execute(&workspace.args(vec![file])).await.unwrap();
    assert!(failed);
}

#[tokio::test]
async fn test_disabling_the_only_rule_passes_bad_files() {
    let workspace = Workspace::new(CONFIG);
    let file = workspace.add_rule_file("bad.yaml", BAD_RULES);

    let mut args = workspace.args(vec![file]);
    args.disabled_rules = vec!["check-severity".to_string()];
    let failed = execute(&args).await.unwrap();
    assert!(!failed);
}

#[tokio::test]
async fn test_unknown_filter_name_is_fatal() {
    let workspace = Workspace::new(CONFIG);
    let file = workspace.add_rule_file("good.yaml", GOOD_RULES);

    let mut args = workspace.args(vec![file]);
    args.disabled_rules = vec!["no-such-rule".to_string()];
    let result = execute(&args).await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_skip_group_excludes_without_validating() {
    let workspace = Workspace::new(CONFIG);
    let file = workspace.add_rule_file("bad.yaml", BAD_RULES);

    let mut args = workspace.args(vec![file]);
    args.skip_groups = vec!["app-alerts".to_string()];
    let failed = execute(&args).await.unwrap();
    assert!(!failed);
}

#[tokio::test]
async fn test_missing_config_is_fatal() {
    let workspace = Workspace::new(CONFIG);
    let file = workspace.add_rule_file("good.yaml", GOOD_RULES);

    let mut args = workspace.args(vec![file]);
    args.config = PathBuf::from("/nonexistent/rule-guard.yaml");
    let result = execute(&args).await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_patterns_expand_in_order() {
    // A dedicated directory: the glob must see exactly the rule files.
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.yaml"), GOOD_RULES).unwrap();
    fs::write(dir.path().join("b.yaml"), GOOD_RULES).unwrap();
    let other = dir.path().join("other.yml");
    fs::write(&other, GOOD_RULES).unwrap();

    let pattern = format!("{}/*.yaml", dir.path().display());
    let paths = expand_patterns(&[pattern, other.display().to_string()]).unwrap();
    assert_eq!(paths.len(), 3);
    assert!(paths[0].ends_with("a.yaml"));
    assert!(paths[1].ends_with("b.yaml"));
    assert_eq!(paths[2], other);
}

#[test]
fn test_no_matches_is_fatal() {
    let result = expand_patterns(&["/nonexistent/**/*.yaml".to_string()]);
    assert!(matches!(result, Err(Error::NoFilesMatched(_))));
}

#[test]
fn test_bad_pattern_is_fatal() {
    let result = expand_patterns(&["rules/[".to_string()]);
    assert!(matches!(result, Err(Error::BadPattern { .. })));
}
