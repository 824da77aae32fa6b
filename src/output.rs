//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Build / watch cycle
//!
//! ```text
//! Built 3 files → .pub
//!     index.md
//!     blog/post.md
//!     img/logo.png
//! Failed 1 file
//!     broken.html: closing delimiter "}}" not found after offset 12
//! Hooks: prehook, posthook
//! ```
//!
//! A pass that follows a change in `.zs/` or `.zsignore` is announced with
//! `Support files changed, rebuilt everything`. A pass with nothing to do
//! prints `Up to date`.
//!
//! ## Variables
//!
//! ```text
//! description:
//! file:blog/post.md
//! layout:layout.html
//! title:My Post
//! ```
//!
//! Named variables print one value per line, in the order asked for; an
//! unknown name prints an empty line.
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::paths::{PUBLISH_DIR, slash_path};
use crate::vars::Vars;
use crate::watch::CycleReport;
use std::collections::BTreeMap;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// "1 file", "2 files".
fn files(n: usize) -> String {
    if n == 1 {
        "1 file".to_string()
    } else {
        format!("{n} files")
    }
}

// ============================================================================
// Cycle reports
// ============================================================================

pub fn format_cycle(report: &CycleReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.reset {
        lines.push("Support files changed, rebuilt everything".to_string());
    }

    if !report.built.is_empty() {
        lines.push(format!("Built {} \u{2192} {PUBLISH_DIR}", files(report.built.len())));
        for path in &report.built {
            lines.push(format!("{}{}", indent(1), slash_path(path)));
        }
    }

    if !report.failed.is_empty() {
        lines.push(format!("Failed {}", files(report.failed.len())));
        for (path, message) in &report.failed {
            lines.push(format!("{}{}: {}", indent(1), slash_path(path), message));
        }
    }

    if !report.walk_errors.is_empty() {
        lines.push(format!("Walk errors: {}", report.walk_errors.len()));
        for message in &report.walk_errors {
            lines.push(format!("{}{}", indent(1), message));
        }
    }

    if !report.hooks.is_empty() {
        lines.push(format!("Hooks: {}", report.hooks.join(", ")));
    }

    if !report.modified() {
        lines.push("Up to date".to_string());
    }

    lines
}

/// Print a cycle report to stdout.
pub fn print_cycle(report: &CycleReport) {
    for line in format_cycle(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Variables
// ============================================================================

/// `name:value` for every variable, or just the values of `names`.
pub fn format_vars(vars: &Vars, names: &[String]) -> Vec<String> {
    if names.is_empty() {
        vars.iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect()
    } else {
        names
            .iter()
            .map(|name| vars.get(name).unwrap_or_default().to_string())
            .collect()
    }
}

/// Print variables to stdout.
pub fn print_vars(vars: &Vars, names: &[String]) {
    for line in format_vars(vars, names) {
        println!("{}", line);
    }
}

/// Variables as a pretty JSON object, restricted to `names` if any are given.
pub fn format_vars_json(vars: &Vars, names: &[String]) -> serde_json::Result<String> {
    if names.is_empty() {
        return serde_json::to_string_pretty(vars);
    }
    let selected: BTreeMap<&str, &str> = names
        .iter()
        .filter_map(|name| vars.get(name).map(|value| (name.as_str(), value)))
        .collect();
    serde_json::to_string_pretty(&selected)
}
