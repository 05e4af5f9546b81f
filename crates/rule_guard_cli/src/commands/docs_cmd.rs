//! The `validation-docs` command.
//!
//! Renders the configured validation rules as human-readable documentation,
//! so teams can publish what their CI gate actually enforces straight from
//! the configuration that enforces it.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::instrument;

use rule_guard_core::ValidationRuleSpec;
use validation_config::{build_specs, load_from_file};

use crate::errors::Error;

#[cfg(test)]
#[path = "docs_cmd_tests.rs"]
mod tests;

/// Documentation output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocsFormat {
    Text,
    Markdown,
    Html,
}

/// Arguments for the validation-docs command
#[derive(Args, Debug)]
pub struct DocsArgs {
    /// Path to the RuleGuard configuration file
    #[arg(short, long, default_value = "rule-guard.yaml")]
    pub config: PathBuf,

    /// Documentation output format
    #[arg(short, long, value_enum, default_value_t = DocsFormat::Text)]
    pub output: DocsFormat,
}

/// Prints documentation for every configured validation rule.
#[instrument(skip_all, fields(config = %args.config.display()))]
pub async fn execute(args: &DocsArgs) -> Result<(), Error> {
    let config = load_from_file(&args.config)?;
    let specs = build_specs(&config, &[], &[])?;
    print!("{}", render_docs(&specs, args.output));
    Ok(())
}

fn render_docs(specs: &[ValidationRuleSpec], format: DocsFormat) -> String {
    match format {
        DocsFormat::Text => render_text(specs),
        DocsFormat::Markdown => render_markdown(specs),
        DocsFormat::Html => render_html(specs),
    }
}

fn render_text(specs: &[ValidationRuleSpec]) -> String {
    let mut out = String::from("Validation rules:\n");
    for spec in specs {
        out.push_str(&format!("\n{} (scope: {})\n", spec.name(), spec.scope()));
        for line in spec.describe() {
            out.push_str(&format!("  - {line}\n"));
        }
    }
    out
}

fn render_markdown(specs: &[ValidationRuleSpec]) -> String {
    let mut out = String::from("# Validation rules\n");
    for spec in specs {
        out.push_str(&format!("\n## {}\n\nScope: {}\n\n", spec.name(), spec.scope()));
        for line in spec.describe() {
            out.push_str(&format!("- {line}\n"));
        }
    }
    out
}

fn render_html(specs: &[ValidationRuleSpec]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Validation rules</title></head>\n<body>\n<h1>Validation rules</h1>\n",
    );
    for spec in specs {
        out.push_str(&format!("<h2>{}</h2>\n", escape_html(spec.name())));
        out.push_str(&format!("<p>Scope: {}</p>\n<ul>\n", spec.scope()));
        for line in spec.describe() {
            out.push_str(&format!("<li>{}</li>\n", escape_html(&line)));
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Check descriptions carry operator-written text (regexps, notes), so they
/// cannot be trusted as markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
