//! Report rendering for the terminal and for machine consumers.

use clap::ValueEnum;
use colored::Colorize;

use rule_guard_core::{FileReport, GroupReport, RuleReport, ValidationReport};

use crate::errors::Error;

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

/// Report output formats selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tree with colors.
    Text,
    Json,
    Yaml,
}

/// Renders the report in the requested format.
pub fn render(report: &ValidationReport, format: OutputFormat) -> Result<String, Error> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|err| Error::Render(err.to_string()))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|err| Error::Render(err.to_string()))
        }
    }
}

fn mark(valid: bool, excluded: bool) -> colored::ColoredString {
    if excluded {
        "-".yellow()
    } else if valid {
        "✓".green()
    } else {
        "✗".red()
    }
}

fn render_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    for file in &report.files {
        render_file(&mut out, file);
    }

    out.push_str(&format!(
        "\nChecked {} files ({} excluded), {} groups ({} excluded), {} rules ({} excluded) in {} ms\n",
        report.files_count,
        report.files_excluded,
        report.groups_count,
        report.groups_excluded,
        report.rules_count,
        report.rules_excluded,
        report.duration_ms,
    ));
    if report.failed {
        out.push_str(&format!(
            "{}\n",
            format!("Validation FAILED: {} problems found", report.errors_count).red()
        ));
    } else {
        out.push_str(&format!("{}\n", "Validation PASSED".green()));
    }
    out
}

fn render_file(out: &mut String, file: &FileReport) {
    out.push_str(&format!("{} {}\n", mark(file.valid, file.excluded), file.path));
    for error in &file.errors {
        out.push_str(&format!("    {}\n", error.red()));
    }
    for group in &file.groups {
        render_group(out, group);
    }
}

fn render_group(out: &mut String, group: &GroupReport) {
    out.push_str(&format!(
        "  {} group `{}`\n",
        mark(group.valid, group.excluded),
        group.name
    ));
    for error in &group.errors {
        out.push_str(&format!("      {}\n", error.red()));
    }
    for rule in &group.rules {
        render_rule(out, rule);
    }
}

fn render_rule(out: &mut String, rule: &RuleReport) {
    out.push_str(&format!(
        "    {} {} [{}]\n",
        mark(rule.valid, rule.excluded),
        rule.name,
        rule.rule_type
    ));
    for error in &rule.errors {
        out.push_str(&format!("        {}\n", error.red()));
    }
}
