//! Tests for expression checks.

use super::*;

use std::sync::Arc;
use std::time::Duration;

use prometheus_client::{Cache, PrometheusClientConfig};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::rulefile::{parse_content, ParserOptions, RuleGroup};

fn group_with_expr(expr: &str) -> RuleGroup {
    let content =
        format!("groups:\n  - name: g\n    rules:\n      - alert: A\n        expr: {expr}\n");
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

fn empty_config() -> ValidatorConfig {
    config(serde_yaml::Value::Null)
}

fn client_for(server: &MockServer, dir: &tempfile::TempDir) -> PrometheusClient {
    let cache = Arc::new(Cache::load(
        &dir.path().join("cache.json"),
        &server.uri(),
        Duration::from_secs(3600),
    ));
    PrometheusClient::new(
        PrometheusClientConfig {
            url: server.uri(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        },
        cache,
    )
    .unwrap()
}

#[tokio::test]
async fn test_expression_matches_regexp() {
    let group = group_with_expr("rate(http_requests_total[5m]) > 10");
    let validator = ExpressionMatchesRegexp::from_config(&config(
        serde_yaml::from_str("regexp: \"rate\\\\(.*\\\\)\"").unwrap(),
    ))
    .unwrap();
    assert!(validator.validate(&group, Some(&group.rules[0]), None).await.is_empty());

    let validator = ExpressionMatchesRegexp::from_config(&config(
        serde_yaml::from_str("regexp: \"^absent\\\\(\"").unwrap(),
    ))
    .unwrap();
    let errors = validator.validate(&group, Some(&group.rules[0]), None).await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_expression_does_not_match_regexp() {
    let group = group_with_expr("up == 0 or on() vector(1)");
    let validator = ExpressionDoesNotMatchRegexp::from_config(&config(
        serde_yaml::from_str("regexp: \"vector\\\\(1\\\\)\"").unwrap(),
    ))
    .unwrap();
    let errors = validator.validate(&group, Some(&group.rules[0]), None).await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_remote_checks_error_without_client() {
    let group = group_with_expr("up == 0");
    let rule = Some(&group.rules[0]);

    let evaluated = ExpressionCanBeEvaluated::from_config(&empty_config()).unwrap();
    assert_eq!(evaluated.validate(&group, rule, None).await.len(), 1);

    let returns_data = ExpressionReturnsData::from_config(&empty_config()).unwrap();
    assert_eq!(returns_data.validate(&group, rule, None).await.len(), 1);

    let selectors =
        ExpressionSelectorsMatchesAnything::from_config(&empty_config()).unwrap();
    assert_eq!(selectors.validate(&group, rule, None).await.len(), 1);
}

#[tokio::test]
async fn test_expression_can_be_evaluated_against_backend() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"status": "success", "data": {"resultType": "vector", "result": []}}),
        ))
        .mount(&mock_server)
        .await;
    let dir = tempdir().unwrap();
    let client = client_for(&mock_server, &dir);

    let group = group_with_expr("up == 0");
    let validator = ExpressionCanBeEvaluated::from_config(&empty_config()).unwrap();
    let errors = validator
        .validate(&group, Some(&group.rules[0]), Some(&client))
        .await;
    assert!(errors.is_empty());
}

#[tokio::test]
async fn test_expression_returns_data_flags_empty_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"status": "success", "data": {"resultType": "vector", "result": []}}),
        ))
        .mount(&mock_server)
        .await;
    let dir = tempdir().unwrap();
    let client = client_for(&mock_server, &dir);

    let group = group_with_expr("nonexistent_metric");
    let validator = ExpressionReturnsData::from_config(&empty_config()).unwrap();
    let errors = validator
        .validate(&group, Some(&group.rules[0]), Some(&client))
        .await;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("no data"));
}

/// A backend failure surfaces as a check error, never a panic or abort.
#[tokio::test]
async fn test_backend_failure_is_a_check_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;
    let dir = tempdir().unwrap();
    let client = client_for(&mock_server, &dir);

    let group = group_with_expr("up == 0");
    let validator = ExpressionCanBeEvaluated::from_config(&empty_config()).unwrap();
    let errors = validator
        .validate(&group, Some(&group.rules[0]), Some(&client))
        .await;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("500"));
}

#[tokio::test]
async fn test_selector_extraction() {
    let validator =
        ExpressionSelectorsMatchesAnything::from_config(&empty_config()).unwrap();
    let selectors = validator
        .selectors(r#"rate(http_requests_total{job="api"}[5m]) / ignoring(code) up{job="api"}"#);
    assert_eq!(
        selectors,
        vec![r#"http_requests_total{job="api"}"#, r#"up{job="api"}"#]
    );
}

#[tokio::test]
async fn test_selectors_matching_nothing_are_flagged() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/series"))
        .and(query_param("match[]", r#"up{job="ghost"}"#))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "success", "data": []})),
        )
        .mount(&mock_server)
        .await;
    let dir = tempdir().unwrap();
    let client = client_for(&mock_server, &dir);

    let group = group_with_expr(r#"up{job="ghost"} == 0"#);
    let validator =
        ExpressionSelectorsMatchesAnything::from_config(&empty_config()).unwrap();
    let errors = validator
        .validate(&group, Some(&group.rules[0]), Some(&client))
        .await;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("matches no series"));
}
