//! Checks over rule labels.

use async_trait::async_trait;
use prometheus_client::PrometheusClient;
use regex::Regex;
use serde::Deserialize;

use crate::errors::ConfigError;
use crate::rulefile::{Rule, RuleGroup};
use crate::validator::{decode_params, Validator, ValidatorConfig};

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LabelListParams {
    labels: Vec<String>,
}

/// Requires every listed label to be present on the rule.
#[derive(Debug)]
pub struct HasLabels {
    labels: Vec<String>,
}

impl HasLabels {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: LabelListParams = decode_params("hasLabels", &config.params)?;
        Ok(Self {
            labels: params.labels,
        })
    }
}

#[async_trait]
impl Validator for HasLabels {
    fn name(&self) -> &'static str {
        "hasLabels"
    }

    fn describe(&self) -> String {
        format!("has all of the labels: {}", self.labels.join(", "))
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
        self.labels
            .iter()
            .filter(|label| !rule.labels.contains_key(*label))
            .map(|label| format!("missing label `{label}`"))
            .collect()
    }
}

/// Requires at least one of the listed labels to be present on the rule.
#[derive(Debug)]
pub struct HasAnyOfLabels {
    labels: Vec<String>,
}

impl HasAnyOfLabels {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: LabelListParams = decode_params("hasAnyOfLabels", &config.params)?;
        Ok(Self {
            labels: params.labels,
        })
    }
}

#[async_trait]
impl Validator for HasAnyOfLabels {
    fn name(&self) -> &'static str {
        "hasAnyOfLabels"
    }

    fn describe(&self) -> String {
        format!("has at least one of the labels: {}", self.labels.join(", "))
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
        if self
            .labels
            .iter()
            .any(|label| rule.labels.contains_key(label))
        {
            Vec::new()
        } else {
            vec![format!(
                "missing all of the labels: {}",
                self.labels.join(", ")
            )]
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LabelMatchesRegexpParams {
    label: String,
    regexp: String,
}

/// Requires a label's value, when the label is present, to match a regular
/// expression.
#[derive(Debug)]
pub struct LabelMatchesRegexp {
    label: String,
    regexp: Regex,
}

impl LabelMatchesRegexp {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: LabelMatchesRegexpParams = decode_params("labelMatchesRegexp", &config.params)?;
        let regexp = Regex::new(&params.regexp).map_err(|err| ConfigError::InvalidParams {
            validator_type: "labelMatchesRegexp".to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            label: params.label,
            regexp,
        })
    }
}

#[async_trait]
impl Validator for LabelMatchesRegexp {
    fn name(&self) -> &'static str {
        "labelMatchesRegexp"
    }

    fn describe(&self) -> String {
        format!(
            "label `{}` matches the regular expression `{}`",
            self.label, self.regexp
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
        match rule.labels.get(&self.label) {
            Some(value) if !self.regexp.is_match(value) => vec![format!(
                "label `{}` value `{}` does not match `{}`",
                self.label, value, self.regexp
            )],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LabelHasAllowedValueParams {
    label: String,
    #[serde(rename = "allowedValues")]
    allowed_values: Vec<String>,
    /// Treat the label value as a CSV list and check every element.
    #[serde(default, rename = "commaSeparatedValue")]
    comma_separated_value: bool,
}

/// Requires a label's value, when the label is present, to come from a fixed
/// allow-list.
#[derive(Debug)]
pub struct LabelHasAllowedValue {
    label: String,
    allowed_values: Vec<String>,
    comma_separated_value: bool,
}

impl LabelHasAllowedValue {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: LabelHasAllowedValueParams =
            decode_params("labelHasAllowedValue", &config.params)?;
        Ok(Self {
            label: params.label,
            allowed_values: params.allowed_values,
            comma_separated_value: params.comma_separated_value,
        })
    }
}

#[async_trait]
impl Validator for LabelHasAllowedValue {
    fn name(&self) -> &'static str {
        "labelHasAllowedValue"
    }

    fn describe(&self) -> String {
        format!(
            "label `{}` has one of the allowed values: {}",
            self.label,
            self.allowed_values.join(", ")
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
        let Some(value) = rule.labels.get(&self.label) else {
            return Vec::new();
        };

        let candidates: Vec<&str> = if self.comma_separated_value {
            value.split(',').map(str::trim).collect()
        } else {
            vec![value.as_str()]
        };
        candidates
            .into_iter()
            .filter(|candidate| !self.allowed_values.iter().any(|v| v == candidate))
            .map(|candidate| {
                format!(
                    "label `{}` value `{}` is not one of the allowed values: {}",
                    self.label,
                    candidate,
                    self.allowed_values.join(", ")
                )
            })
            .collect()
    }
}
