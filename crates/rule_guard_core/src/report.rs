//! The hierarchical validation report.
//!
//! A pure data aggregator: File reports own group reports, which own rule
//! reports. The only logic here is validity bubbling (a node is invalid iff
//! it or any descendant recorded an error) and the aggregate counters on the
//! root. The tree is built fresh per run, rendered, and discarded.

use std::time::Duration;

use serde::Serialize;

use crate::rulefile::RuleType;

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// Outcome of validating one rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub name: String,
    pub rule_type: RuleType,
    pub valid: bool,
    pub excluded: bool,
    pub errors: Vec<String>,
}

impl RuleReport {
    pub fn new(name: impl Into<String>, rule_type: RuleType) -> Self {
        Self {
            name: name.into(),
            rule_type,
            valid: true,
            excluded: false,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }
}

/// Outcome of validating one rule group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub valid: bool,
    pub excluded: bool,
    /// Errors recorded at group level (group-scoped checks).
    pub errors: Vec<String>,
    pub rules: Vec<RuleReport>,
}

impl GroupReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            valid: true,
            excluded: false,
            errors: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Appends a rule report, bubbling its validity up to this group.
    pub fn add_rule(&mut self, rule: RuleReport) {
        if !rule.valid {
            self.valid = false;
        }
        self.rules.push(rule);
    }
}

/// Outcome of validating one rule file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub valid: bool,
    pub excluded: bool,
    /// Errors recorded at file level (parse failures).
    pub errors: Vec<String>,
    pub groups: Vec<GroupReport>,
}

impl FileReport {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            valid: true,
            excluded: false,
            errors: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Appends a group report, bubbling its validity up to this file.
    pub fn add_group(&mut self, group: GroupReport) {
        if !group.valid {
            self.valid = false;
        }
        self.groups.push(group);
    }
}

/// Root of the report tree with run-wide counters.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub failed: bool,
    pub duration_ms: u64,
    pub files_count: usize,
    pub files_excluded: usize,
    pub groups_count: usize,
    pub groups_excluded: usize,
    pub rules_count: usize,
    pub rules_excluded: usize,
    pub errors_count: usize,
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            failed: false,
            duration_ms: 0,
            files_count: 0,
            files_excluded: 0,
            groups_count: 0,
            groups_excluded: 0,
            rules_count: 0,
            rules_excluded: 0,
            errors_count: 0,
            files: Vec::new(),
        }
    }

    /// Appends a file report, bubbling its validity into `failed`.
    pub fn add_file(&mut self, file: FileReport) {
        if !file.valid {
            self.failed = true;
        }
        self.files.push(file);
    }

    /// Recomputes the aggregate counters from the tree and records the
    /// run's wall-clock duration. Called once, after all files are in.
    pub fn finish(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
        self.files_count = self.files.len();
        self.files_excluded = self.files.iter().filter(|f| f.excluded).count();
        self.groups_count = 0;
        self.groups_excluded = 0;
        self.rules_count = 0;
        self.rules_excluded = 0;
        self.errors_count = 0;

        for file in &self.files {
            self.errors_count += file.errors.len();
            for group in &file.groups {
                self.groups_count += 1;
                if group.excluded {
                    self.groups_excluded += 1;
                }
                self.errors_count += group.errors.len();
                for rule in &group.rules {
                    self.rules_count += 1;
                    if rule.excluded {
                        self.rules_excluded += 1;
                    }
                    self.errors_count += rule.errors.len();
                }
            }
        }
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
