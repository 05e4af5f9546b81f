//! Checks over rule expressions.
//!
//! The pattern-based checks work on the expression text. The remote checks
//! delegate interpretation to the configured Prometheus itself: an
//! expression the backend evaluates is well-formed by definition, which
//! avoids shipping a second PromQL implementation that could drift from the
//! real one.

use async_trait::async_trait;
use prometheus_client::PrometheusClient;
use regex::Regex;
use serde::Deserialize;

use crate::errors::ConfigError;
use crate::rulefile::{Rule, RuleGroup};
use crate::validator::{decode_params, Validator, ValidatorConfig};

#[cfg(test)]
#[path = "expression_tests.rs"]
mod tests;

const NO_CLIENT_ERROR: &str = "this check needs a live Prometheus, but none is configured";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegexpParams {
    regexp: String,
}

fn compile(validator_type: &str, regexp: &str) -> Result<Regex, ConfigError> {
    Regex::new(regexp).map_err(|err| ConfigError::InvalidParams {
        validator_type: validator_type.to_string(),
        reason: err.to_string(),
    })
}

/// Requires the expression text to match a regular expression.
#[derive(Debug)]
pub struct ExpressionMatchesRegexp {
    regexp: Regex,
}

impl ExpressionMatchesRegexp {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: RegexpParams = decode_params("expressionMatchesRegexp", &config.params)?;
        Ok(Self {
            regexp: compile("expressionMatchesRegexp", &params.regexp)?,
        })
    }
}

#[async_trait]
impl Validator for ExpressionMatchesRegexp {
    fn name(&self) -> &'static str {
        "expressionMatchesRegexp"
    }

    fn describe(&self) -> String {
        format!("expression matches the regular expression `{}`", self.regexp)
    }

    async fn validate(
        &self,
        _group: &RuleGroup,
        rule: Option<&Rule>,
        _client: Option<&PrometheusClient>,
    ) -> Vec<String> {
        let Some(rule) = rule else {
            return Vec::new();
        };
        if self.regexp.is_match(&rule.expr) {
            Vec::new()
        } else {
            vec![format!("expression does not match `{}`", self.regexp)]
        }
    }
}

/// Forbids the expression text from matching a regular expression.
#[derive(Debug)]
pub struct ExpressionDoesNotMatchRegexp {
    regexp: Regex,
}

impl ExpressionDoesNotMatchRegexp {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: RegexpParams = decode_params("expressionDoesNotMatchRegexp", &config.params)?;
        Ok(Self {
            regexp: compile("expressionDoesNotMatchRegexp", &params.regexp)?,
        })
    }
}

#[async_trait]
impl Validator for ExpressionDoesNotMatchRegexp {
    fn name(&self) -> &'static str {
        "expressionDoesNotMatchRegexp"
    }

    fn describe(&self) -> String {
        format!(
            "expression does not match the regular expression `{}`",
            self.regexp
        )
    }

    async fn validate(
        &self,
        _group: &RuleGroup,
        rule: Option<&Rule>,
        _client: Option<&PrometheusClient>,
    ) -> Vec<String> {
        let Some(rule) = rule else {
            return Vec::new();
        };
        if self.regexp.is_match(&rule.expr) {
            vec![format!("expression matches the forbidden `{}`", self.regexp)]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

/// Requires the backend to accept and evaluate the expression.
#[derive(Debug)]
pub struct ExpressionCanBeEvaluated;

impl ExpressionCanBeEvaluated {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let NoParams {} = decode_params("expressionCanBeEvaluated", &config.params)?;
        Ok(Self)
    }
}

#[async_trait]
impl Validator for ExpressionCanBeEvaluated {
    fn name(&self) -> &'static str {
        "expressionCanBeEvaluated"
    }

    fn describe(&self) -> String {
        "expression evaluates successfully on the live Prometheus".to_string()
    }

    async fn validate(
        &self,
        group: &RuleGroup,
        rule: Option<&Rule>,
        client: Option<&PrometheusClient>,
    ) -> Vec<String> {
        let Some(rule) = rule else {
            return Vec::new();
        };
        let Some(client) = client else {
            return vec![NO_CLIENT_ERROR.to_string()];
        };
        match client.evaluate_query(&group.source_tenants, &rule.expr).await {
            Ok(_) => Vec::new(),
            Err(err) => vec![format!("expression failed to evaluate: {err}")],
        }
    }
}

/// Requires the expression to return at least one series right now.
#[derive(Debug)]
pub struct ExpressionReturnsData;

impl ExpressionReturnsData {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let NoParams {} = decode_params("expressionReturnsData", &config.params)?;
        Ok(Self)
    }
}

#[async_trait]
impl Validator for ExpressionReturnsData {
    fn name(&self) -> &'static str {
        "expressionReturnsData"
    }

    fn describe(&self) -> String {
        "expression returns data on the live Prometheus".to_string()
    }

    async fn validate(
        &self,
        group: &RuleGroup,
        rule: Option<&Rule>,
        client: Option<&PrometheusClient>,
    ) -> Vec<String> {
        let Some(rule) = rule else {
            return Vec::new();
        };
        let Some(client) = client else {
            return vec![NO_CLIENT_ERROR.to_string()];
        };
        match client.evaluate_query(&group.source_tenants, &rule.expr).await {
            Ok((0, _)) => vec!["expression returns no data".to_string()],
            Ok(_) => Vec::new(),
            Err(err) => vec![format!("expression failed to evaluate: {err}")],
        }
    }
}

/// Requires every selector in the expression to match at least one series.
///
/// Selectors are lifted from the expression text (`metric{matchers}`
/// shapes); bare metric names without matchers are left to
/// `expressionReturnsData`.
#[derive(Debug)]
pub struct ExpressionSelectorsMatchesAnything {
    selector_pattern: Regex,
}

impl ExpressionSelectorsMatchesAnything {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let NoParams {} = decode_params("expressionSelectorsMatchesAnything", &config.params)?;
        Ok(Self {
            selector_pattern: compile(
                "expressionSelectorsMatchesAnything",
                r"(?:[a-zA-Z_:][a-zA-Z0-9_:]*)?\{[^}]*\}",
            )?,
        })
    }

    fn selectors<'e>(&self, expr: &'e str) -> Vec<&'e str> {
        self.selector_pattern
            .find_iter(expr)
            .map(|m| m.as_str())
            .collect()
    }
}

#[async_trait]
impl Validator for ExpressionSelectorsMatchesAnything {
    fn name(&self) -> &'static str {
        "expressionSelectorsMatchesAnything"
    }

    fn describe(&self) -> String {
        "every selector in the expression matches series on the live Prometheus".to_string()
    }

    async fn validate(
        &self,
        group: &RuleGroup,
        rule: Option<&Rule>,
        client: Option<&PrometheusClient>,
    ) -> Vec<String> {
        let Some(rule) = rule else {
            return Vec::new();
        };
        let Some(client) = client else {
            return vec![NO_CLIENT_ERROR.to_string()];
        };

        let mut errors = Vec::new();
        for selector in self.selectors(&rule.expr) {
            match client.match_selector(&group.source_tenants, selector).await {
                Ok(0) => errors.push(format!("selector `{selector}` matches no series")),
                Ok(_) => {}
                Err(err) => errors.push(format!("selector `{selector}` failed to match: {err}")),
            }
        }
        errors
    }
}
