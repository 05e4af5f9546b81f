//! The Validator contract and the configuration-to-object factory.
//!
//! Every check the tool can run implements [`Validator`]: a stateless,
//! reusable predicate over a rule group and (usually) one of its rules,
//! optionally backed by a live Prometheus client. Checks are instantiated
//! from `{type, params}` configuration records by [`build_validator`]; an
//! unknown `type` or malformed `params` is a configuration error raised
//! before any file is validated.

use std::sync::Arc;

use async_trait::async_trait;
use prometheus_client::PrometheusClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::ConfigError;
use crate::rulefile::{Rule, RuleGroup};
use crate::validators;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// A single configurable check.
///
/// Implementations own only their decoded parameters and hold no per-call
/// state, so one instance is safely shared across every rule it applies to,
/// including under concurrent evaluation.
#[async_trait]
pub trait Validator: Send + Sync + std::fmt::Debug {
    /// Stable name used in configuration and suppression directives.
    ///
    /// This is an explicit contract, not a reflection of the Rust type
    /// name: renaming the implementing type must never break suppression
    /// comments in rule files.
    fn name(&self) -> &'static str;

    /// Human-readable description of what the check enforces.
    fn describe(&self) -> String;

    /// Evaluates the check.
    ///
    /// `rule` is `None` when the check runs at group scope. Rule-targeted
    /// checks return no errors in that case. Checks needing a backend
    /// return a single error when `client` is `None`.
    async fn validate(
        &self,
        group: &RuleGroup,
        rule: Option<&Rule>,
        client: Option<&PrometheusClient>,
    ) -> Vec<String>;
}

/// One `{type, params}` record from the operator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    #[serde(rename = "type")]
    pub validator_type: String,
    /// Validator-specific parameters, decoded strictly by the variant.
    #[serde(default)]
    pub params: serde_yaml::Value,
    /// Free-form operator note rendered next to the check description.
    #[serde(default, rename = "additionalDetails")]
    pub additional_details: Option<String>,
}

/// Builds the validator a configuration record names.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownValidatorType`] for a `type` not in the
/// catalog and [`ConfigError::InvalidParams`] when the parameters do not
/// decode strictly (missing required fields, unknown fields, invalid
/// regular expressions or durations).
pub fn build_validator(config: &ValidatorConfig) -> Result<Arc<dyn Validator>, ConfigError> {
    let validator: Arc<dyn Validator> = match config.validator_type.as_str() {
        "hasLabels" => Arc::new(validators::labels::HasLabels::from_config(config)?),
        "hasAnyOfLabels" => Arc::new(validators::labels::HasAnyOfLabels::from_config(config)?),
        "labelMatchesRegexp" => {
            Arc::new(validators::labels::LabelMatchesRegexp::from_config(config)?)
        }
        "labelHasAllowedValue" => {
            Arc::new(validators::labels::LabelHasAllowedValue::from_config(config)?)
        }
        "hasAnnotations" => {
            Arc::new(validators::annotations::HasAnnotations::from_config(config)?)
        }
        "annotationMatchesRegexp" => Arc::new(
            validators::annotations::AnnotationMatchesRegexp::from_config(config)?,
        ),
        "annotationIsValidURL" => Arc::new(
            validators::annotations::AnnotationIsValidUrl::from_config(config)?,
        ),
        "forIsNotLongerThan" => {
            Arc::new(validators::alerts::ForIsNotLongerThan::from_config(config)?)
        }
        "keepFiringForIsNotLongerThan" => Arc::new(
            validators::alerts::KeepFiringForIsNotLongerThan::from_config(config)?,
        ),
        "expressionMatchesRegexp" => Arc::new(
            validators::expression::ExpressionMatchesRegexp::from_config(config)?,
        ),
        "expressionDoesNotMatchRegexp" => Arc::new(
            validators::expression::ExpressionDoesNotMatchRegexp::from_config(config)?,
        ),
        "expressionCanBeEvaluated" => Arc::new(
            validators::expression::ExpressionCanBeEvaluated::from_config(config)?,
        ),
        "expressionReturnsData" => Arc::new(
            validators::expression::ExpressionReturnsData::from_config(config)?,
        ),
        "expressionSelectorsMatchesAnything" => Arc::new(
            validators::expression::ExpressionSelectorsMatchesAnything::from_config(config)?,
        ),
        other => {
            return Err(ConfigError::UnknownValidatorType {
                validator_type: other.to_string(),
            })
        }
    };
    Ok(validator)
}

/// Strictly decodes a validator's parameters.
///
/// Absent params decode as an empty mapping so parameterless validators can
/// be configured without an explicit `params: {}`.
pub(crate) fn decode_params<T: DeserializeOwned>(
    validator_type: &str,
    params: &serde_yaml::Value,
) -> Result<T, ConfigError> {
    let value = if params.is_null() {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
    } else {
        params.clone()
    };
    serde_yaml::from_value(value).map_err(|err| ConfigError::InvalidParams {
        validator_type: validator_type.to_string(),
        reason: err.to_string(),
    })
}
