//! Loading and schema-checking of the RuleGuard operator configuration.
//!
//! The configuration is a single YAML file declaring the optional
//! Prometheus connection and the validation rules to enforce. Decoding is
//! strict: unknown fields, unknown validator types, and malformed validator
//! parameters are all errors raised before any rule file is touched.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use prometheus_client::PrometheusClientConfig;
use rule_guard_core::duration::parse_duration;
use rule_guard_core::{build_validator, Scope, ValidationRuleSpec, ValidatorConfig};

pub mod errors;
pub use errors::{ConfigurationError, ConfigurationResult};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

fn default_cache_file() -> PathBuf {
    PathBuf::from(".rule-guard-cache.json")
}

fn default_max_cache_age() -> String {
    "1h".to_string()
}

/// Connection settings for the optional live Prometheus.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PrometheusConfig {
    pub url: String,
    /// Per-call timeout as a Prometheus duration string. Absent means no
    /// deadline.
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    /// Persisted cache entries older than this are discarded on load.
    #[serde(default = "default_max_cache_age")]
    pub max_cache_age: String,
    /// Header carrying the tenant set; defaults to the client's own.
    #[serde(default)]
    pub tenant_header: Option<String>,
    /// File holding a bearer token sent as the `Authorization` header.
    /// Read at client construction, so CI secrets stay out of the
    /// configuration file itself.
    #[serde(default)]
    pub bearer_token_file: Option<PathBuf>,
    /// Extra headers attached to every backend call.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl PrometheusConfig {
    pub fn timeout(&self) -> ConfigurationResult<Duration> {
        match &self.timeout {
            Some(timeout) => parse_duration(timeout).map_err(|err| ConfigurationError::Invalid {
                field: "prometheus.timeout".to_string(),
                reason: err.to_string(),
            }),
            None => Ok(Duration::ZERO),
        }
    }

    pub fn max_cache_age(&self) -> ConfigurationResult<Duration> {
        parse_duration(&self.max_cache_age).map_err(|err| ConfigurationError::Invalid {
            field: "prometheus.maxCacheAge".to_string(),
            reason: err.to_string(),
        })
    }

    /// Translates these settings into the client crate's configuration,
    /// reading the bearer token file if one is configured.
    pub fn client_config(&self) -> ConfigurationResult<PrometheusClientConfig> {
        let mut config = PrometheusClientConfig {
            url: self.url.clone(),
            timeout: self.timeout()?,
            headers: self.headers.clone(),
            ..Default::default()
        };
        if let Some(tenant_header) = &self.tenant_header {
            config.tenant_header = tenant_header.clone();
        }
        if let Some(token_file) = &self.bearer_token_file {
            let token =
                fs::read_to_string(token_file).map_err(|err| ConfigurationError::FileRead {
                    path: token_file.display().to_string(),
                    reason: err.to_string(),
                })?;
            config.headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", token.trim()),
            );
        }
        Ok(config)
    }
}

/// One configured validation rule, still in YAML shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ValidationRuleConfig {
    pub name: String,
    pub scope: Scope,
    #[serde(default)]
    pub validations: Vec<ValidatorConfig>,
    #[serde(default)]
    pub only_if: Vec<ValidatorConfig>,
}

/// The whole operator configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub prometheus: Option<PrometheusConfig>,
    /// Accept the multi-tenant `source_tenants` field in rule files.
    #[serde(default)]
    pub allow_source_tenants: bool,
    pub validation_rules: Vec<ValidationRuleConfig>,
}

/// Loads and strictly decodes the configuration file at `path`.
pub fn load_from_file(path: &Path) -> ConfigurationResult<Config> {
    let content = fs::read_to_string(path).map_err(|err| ConfigurationError::FileRead {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let config: Config =
        serde_yaml::from_str(&content).map_err(|err| ConfigurationError::Parse {
            reason: err.to_string(),
        })?;
    debug!(
        path = %path.display(),
        rules = config.validation_rules.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Builds the runtime validation rules from configuration, applying the
/// CLI's enable/disable filters.
///
/// When `enabled` is non-empty only the named rules are kept; `disabled`
/// names are dropped. Names that match no configured rule are an error, so
/// a typo in a CI pipeline flag cannot silently validate nothing.
pub fn build_specs(
    config: &Config,
    enabled: &[String],
    disabled: &[String],
) -> ConfigurationResult<Vec<ValidationRuleSpec>> {
    let known: HashSet<&str> = config
        .validation_rules
        .iter()
        .map(|rule| rule.name.as_str())
        .collect();
    if known.len() != config.validation_rules.len() {
        let mut seen = HashSet::new();
        for rule in &config.validation_rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigurationError::DuplicateRuleName {
                    name: rule.name.clone(),
                });
            }
        }
    }
    for (names, flag) in [(enabled, "--enable-rule"), (disabled, "--disable-rule")] {
        if let Some(unknown) = names.iter().find(|name| !known.contains(name.as_str())) {
            return Err(ConfigurationError::UnknownRuleName {
                name: unknown.clone(),
                flag: flag.to_string(),
            });
        }
    }

    let mut specs = Vec::new();
    for rule in &config.validation_rules {
        if !enabled.is_empty() && !enabled.contains(&rule.name) {
            continue;
        }
        if disabled.contains(&rule.name) {
            continue;
        }

        let mut spec = ValidationRuleSpec::new(&rule.name, rule.scope);
        for validation in &rule.validations {
            spec.attach_validator(
                build_validator(validation)?,
                validation.additional_details.clone(),
            );
        }
        for precondition in &rule.only_if {
            spec.attach_only_if(
                build_validator(precondition)?,
                precondition.additional_details.clone(),
            );
        }
        specs.push(spec);
    }
    Ok(specs)
}
