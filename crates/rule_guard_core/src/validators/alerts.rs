//! Checks specific to alerting rules.

use std::time::Duration;

use async_trait::async_trait;
use prometheus_client::PrometheusClient;
use serde::Deserialize;

use crate::duration::{format_duration, parse_duration};
use crate::errors::ConfigError;
use crate::rulefile::{Rule, RuleGroup, RuleKind};
use crate::validator::{decode_params, Validator, ValidatorConfig};

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DurationLimitParams {
    limit: String,
}

fn parse_limit(validator_type: &str, limit: &str) -> Result<Duration, ConfigError> {
    parse_duration(limit).map_err(|err| ConfigError::InvalidParams {
        validator_type: validator_type.to_string(),
        reason: err.to_string(),
    })
}

/// Requires an alert's `for` clause to stay at or below a limit.
#[derive(Debug)]
pub struct ForIsNotLongerThan {
    limit: Duration,
}

impl ForIsNotLongerThan {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: DurationLimitParams = decode_params("forIsNotLongerThan", &config.params)?;
        Ok(Self {
            limit: parse_limit("forIsNotLongerThan", &params.limit)?,
        })
    }
}

#[async_trait]
impl Validator for ForIsNotLongerThan {
    fn name(&self) -> &'static str {
        "forIsNotLongerThan"
    }

    fn describe(&self) -> String {
        format!("`for` is not longer than {}", format_duration(self.limit))
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
        let RuleKind::Alert {
            wait_for: Some(wait_for),
            ..
        } = &rule.kind
        else {
            return Vec::new();
        };
        match parse_duration(wait_for) {
            Ok(parsed) if parsed > self.limit => vec![format!(
                "`for: {wait_for}` is longer than the limit {}",
                format_duration(self.limit)
            )],
            Ok(_) => Vec::new(),
            Err(err) => vec![err.to_string()],
        }
    }
}

/// Requires an alert's `keep_firing_for` clause to stay at or below a limit.
#[derive(Debug)]
pub struct KeepFiringForIsNotLongerThan {
    limit: Duration,
}

impl KeepFiringForIsNotLongerThan {
    pub(crate) fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let params: DurationLimitParams =
            decode_params("keepFiringForIsNotLongerThan", &config.params)?;
        Ok(Self {
            limit: parse_limit("keepFiringForIsNotLongerThan", &params.limit)?,
        })
    }
}

#[async_trait]
impl Validator for KeepFiringForIsNotLongerThan {
    fn name(&self) -> &'static str {
        "keepFiringForIsNotLongerThan"
    }

    fn describe(&self) -> String {
        format!(
            "`keep_firing_for` is not longer than {}",
            format_duration(self.limit)
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
        let RuleKind::Alert {
            keep_firing_for: Some(keep_firing_for),
            ..
        } = &rule.kind
        else {
            return Vec::new();
        };
        match parse_duration(keep_firing_for) {
            Ok(parsed) if parsed > self.limit => vec![format!(
                "`keep_firing_for: {keep_firing_for}` is longer than the limit {}",
                format_duration(self.limit)
            )],
            Ok(_) => Vec::new(),
            Err(err) => vec![err.to_string()],
        }
    }
}
