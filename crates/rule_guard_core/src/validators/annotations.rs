//! Checks over rule annotations.

use async_trait::async_trait;
use prometheus_client::PrometheusClient;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::errors::ConfigError;
use crate::rulefile::{Rule, RuleGroup};
use crate::validator::{decode_params, Validator, ValidatorConfig};

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod tests;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnnotationListParams {
    annotations: Vec<String>,
}

/// Requires every listed annotation to be present on the rule.
#[derive(Debug)]
pub struct HasAnnotations {
    annotations: Vec<String>,
}

impl HasAnnotations {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: AnnotationListParams = decode_params("hasAnnotations", &config.params)?;
        Ok(Self {
            annotations: params.annotations,
        })
    }
}

#[async_trait]
impl Validator for HasAnnotations {
    fn name(&self) -> &'static str {
        "hasAnnotations"
    }

    fn describe(&self) -> String {
        format!(
            "has all of the annotations: {}",
            self.annotations.join(", ")
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
        self.annotations
            .iter()
            .filter(|annotation| !rule.annotations.contains_key(*annotation))
            .map(|annotation| format!("missing annotation `{annotation}`"))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnnotationMatchesRegexpParams {
    annotation: String,
    regexp: String,
}

/// Requires an annotation's value, when present, to match a regular
/// expression.
#[derive(Debug)]
pub struct AnnotationMatchesRegexp {
    annotation: String,
    regexp: Regex,
}

impl AnnotationMatchesRegexp {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: AnnotationMatchesRegexpParams =
            decode_params("annotationMatchesRegexp", &config.params)?;
        let regexp = Regex::new(&params.regexp).map_err(|err| ConfigError::InvalidParams {
            validator_type: "annotationMatchesRegexp".to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            annotation: params.annotation,
            regexp,
        })
    }
}

#[async_trait]
impl Validator for AnnotationMatchesRegexp {
    fn name(&self) -> &'static str {
        "annotationMatchesRegexp"
    }

    fn describe(&self) -> String {
        format!(
            "annotation `{}` matches the regular expression `{}`",
            self.annotation, self.regexp
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
        match rule.annotations.get(&self.annotation) {
            Some(value) if !self.regexp.is_match(value) => vec![format!(
                "annotation `{}` value `{}` does not match `{}`",
                self.annotation, value, self.regexp
            )],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnnotationIsValidUrlParams {
    annotation: String,
}

/// Requires an annotation's value, when present, to be a well-formed
/// absolute URL (for example a runbook link).
#[derive(Debug)]
pub struct AnnotationIsValidUrl {
    annotation: String,
}

impl AnnotationIsValidUrl {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: AnnotationIsValidUrlParams =
            decode_params("annotationIsValidURL", &config.params)?;
        Ok(Self {
            annotation: params.annotation,
        })
    }
}

#[async_trait]
impl Validator for AnnotationIsValidUrl {
    fn name(&self) -> &'static str {
        "annotationIsValidURL"
    }

    fn describe(&self) -> String {
        format!("annotation `{}` is a valid URL", self.annotation)
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
        match rule.annotations.get(&self.annotation) {
            Some(value) => match Url::parse(value) {
                Ok(_) => Vec::new(),
                Err(err) => vec![format!(
                    "annotation `{}` value `{}` is not a valid URL: {}",
                    self.annotation, value, err
                )],
            },
            None => Vec::new(),
        }
    }
}
