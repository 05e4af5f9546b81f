//! The `validate` command: the CI gate itself.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{debug, info, instrument, warn};

use prometheus_client::{Cache, PrometheusClient};
use rule_guard_core::{validate_files, ParserOptions, ValidationOptions};
use validation_config::{build_specs, load_from_file};

use crate::errors::Error;
use crate::render::{render, OutputFormat};

#[cfg(test)]
#[path = "validate_cmd_tests.rs"]
mod tests;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Rule files or glob patterns to validate
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Path to the RuleGuard configuration file
    #[arg(short, long, default_value = "rule-guard.yaml")]
    pub config: PathBuf,

    /// Only run the named validation rules (repeatable)
    #[arg(long = "enable-rule", value_name = "NAME")]
    pub enabled_rules: Vec<String>,

    /// Skip the named validation rules (repeatable)
    #[arg(long = "disable-rule", value_name = "NAME")]
    pub disabled_rules: Vec<String>,

    /// Mark the named rule groups excluded instead of validating them (repeatable)
    #[arg(long = "skip-group", value_name = "NAME")]
    pub skip_groups: Vec<String>,

    /// Report output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Force colored output even when stdout is not a terminal
    #[arg(long)]
    pub color: bool,
}

/// Runs a validation and prints the report.
///
/// Returns whether the run found problems; the caller turns that into the
/// exit code. `Err` means the run could not happen at all (configuration,
/// pattern, or client construction failure).
#[instrument(skip_all, fields(config = %args.config.display()))]
pub async fn execute(args: &ValidateArgs) -> Result<bool, Error> {
    if args.color {
        colored::control::set_override(true);
    }
    let config = load_from_file(&args.config)?;
    let specs = build_specs(&config, &args.enabled_rules, &args.disabled_rules)?;
    let paths = expand_patterns(&args.files)?;
    debug!(files = paths.len(), specs = specs.len(), "Resolved validation inputs");

    let client = match &config.prometheus {
        Some(prometheus) => {
            let cache = Cache::load(
                &prometheus.cache_file,
                &prometheus.url,
                prometheus.max_cache_age()?,
            );
            let client = PrometheusClient::new(prometheus.client_config()?, Arc::new(cache))?;
            info!(url = %prometheus.url, "Using live Prometheus backend");
            Some(Arc::new(client))
        }
        None => None,
    };

    let options = ValidationOptions {
        skip_groups: args.skip_groups.iter().cloned().collect(),
        parser: ParserOptions {
            allow_source_tenants: config.allow_source_tenants,
        },
        ..Default::default()
    };

    let report = validate_files(&paths, Arc::new(specs), Arc::new(options), client.clone()).await;

    // Persist whatever the run learned before reporting; a render failure
    // must not cost the next run its cache.
    if let Some(client) = &client {
        client.cache().dump();
    }

    let rendered = render(&report, args.output)?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(report.failed)
}

/// Expands the given file patterns into an ordered list of rule file paths.
///
/// Pattern order is preserved and each pattern's matches keep glob's sorted
/// order, so report order is stable across runs. Matching nothing at all is
/// fatal.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>, Error> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|err| Error::BadPattern {
            pattern: pattern.clone(),
            reason: err.to_string(),
        })?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(err) => warn!(pattern = %pattern, error = %err, "Skipping unreadable match"),
            }
        }
    }
    if paths.is_empty() {
        return Err(Error::NoFilesMatched(patterns.join(", ")));
    }
    Ok(paths)
}
