//! Site configuration module.
//!
//! Handles loading, validating, and merging `.zs/config.toml`. Stock
//! defaults are overridden by the user's file, which in turn is overridden
//! by command-line flags.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = ""                # Site title, available as {{ title }}
//! description = ""          # Site description
//! keywords = ""             # Site keywords
//! production = false        # Hide "plugin or variable not found" markers
//!
//! [vars]                    # Extra global variables
//! author = "Jane Doe"
//!
//! [macros]
//! open = "{{"               # Opening delimiter for variables and plugins
//! close = "}}"              # Closing delimiter
//!
//! [templates]
//! open = "<%"               # Template expression delimiters used by
//! close = "%>"              # layouts and .html/.xml files
//!
//! [markdown]
//! extensions = ["tables", "strikethrough", "tasklists", "footnotes",
//!               "heading-attributes", "wikilinks"]
//!
//! [watch]
//! interval_ms = 1000        # Polling interval for `zs watch`
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! title = "My Site"
//! [watch]
//! interval_ms = 250
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `.zs/config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, exposed as the `title` global variable.
    pub title: String,
    /// Site description, exposed as `description`.
    pub description: String,
    /// Site keywords, exposed as `keywords`.
    pub keywords: String,
    /// Production mode: unresolved macros expand to nothing instead of a
    /// visible marker, and `production` is set to `"1"`.
    pub production: bool,
    /// Extra global variables.
    pub vars: BTreeMap<String, String>,
    /// Delimiters around `{{ variable }}` and `{{ plugin args }}` macros.
    #[serde(default = "default_macro_delimiters")]
    pub macros: Delimiters,
    /// Expression delimiters for the template engine.
    #[serde(default = "default_template_delimiters")]
    pub templates: Delimiters,
    /// Markdown converter settings.
    pub markdown: MarkdownConfig,
    /// Polling settings for watch mode.
    pub watch: WatchConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            keywords: String::new(),
            production: false,
            vars: BTreeMap::new(),
            macros: default_macro_delimiters(),
            templates: default_template_delimiters(),
            markdown: MarkdownConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.macros.open.is_empty() || self.macros.close.is_empty() {
            return Err(ConfigError::Validation(
                "macros.open and macros.close must not be empty".into(),
            ));
        }
        if self.templates.open.is_empty() || self.templates.close.is_empty() {
            return Err(ConfigError::Validation(
                "templates.open and templates.close must not be empty".into(),
            ));
        }
        if self.templates.open == self.templates.close {
            return Err(ConfigError::Validation(
                "templates.open and templates.close must differ".into(),
            ));
        }
        if self.watch.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// An opening/closing delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

fn default_macro_delimiters() -> Delimiters {
    Delimiters::new("{{", "}}")
}

fn default_template_delimiters() -> Delimiters {
    Delimiters::new("<%", "%>")
}

/// Markdown extensions that can be switched on in `[markdown]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkdownExtension {
    Tables,
    Footnotes,
    Strikethrough,
    Tasklists,
    HeadingAttributes,
    SmartPunctuation,
    Wikilinks,
}

impl MarkdownExtension {
    pub const ALL: [MarkdownExtension; 7] = [
        MarkdownExtension::Tables,
        MarkdownExtension::Footnotes,
        MarkdownExtension::Strikethrough,
        MarkdownExtension::Tasklists,
        MarkdownExtension::HeadingAttributes,
        MarkdownExtension::SmartPunctuation,
        MarkdownExtension::Wikilinks,
    ];

    /// Name as written in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            MarkdownExtension::Tables => "tables",
            MarkdownExtension::Footnotes => "footnotes",
            MarkdownExtension::Strikethrough => "strikethrough",
            MarkdownExtension::Tasklists => "tasklists",
            MarkdownExtension::HeadingAttributes => "heading-attributes",
            MarkdownExtension::SmartPunctuation => "smart-punctuation",
            MarkdownExtension::Wikilinks => "wikilinks",
        }
    }
}

impl FromStr for MarkdownExtension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ext| ext.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|ext| ext.name()).collect();
                format!("unknown markdown extension {s:?}, expected one of: {}", known.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    pub extensions: Vec<MarkdownExtension>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        use MarkdownExtension::*;
        Self {
            extensions: vec![
                Tables,
                Strikethrough,
                Tasklists,
                Footnotes,
                HeadingAttributes,
                Wikilinks,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Milliseconds between two scans of the source tree.
    pub interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Values from the command line that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub production: bool,
    pub vars: Vec<(String, String)>,
    pub opening_delimiter: Option<String>,
    pub closing_delimiter: Option<String>,
    /// Replaces `[markdown] extensions` when non-empty.
    pub extensions: Vec<MarkdownExtension>,
}

impl SiteConfig {
    /// Apply command-line overrides on top of the loaded file.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(title) = overrides.title {
            self.title = title;
        }
        if let Some(description) = overrides.description {
            self.description = description;
        }
        if let Some(keywords) = overrides.keywords {
            self.keywords = keywords;
        }
        self.production |= overrides.production;
        if let Some(open) = overrides.opening_delimiter {
            self.macros.open = open;
        }
        if let Some(close) = overrides.closing_delimiter {
            self.macros.close = close;
        }
        if !overrides.extensions.is_empty() {
            self.markdown.extensions = overrides.extensions;
        }
        self.vars.extend(overrides.vars);
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from the given file, merged over stock defaults.
///
/// A missing file yields the defaults. Validation is left to the caller,
/// since command-line overrides may still change the result.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# zs configuration
# =================
# Place this file at .zs/config.toml. All settings are optional; values
# shown below are the defaults. Unknown keys cause an error.

# Site-wide variables, available in every file as {{ title }} etc.
title = ""
description = ""
keywords = ""

# In production, macros that name neither a variable nor a plugin expand
# to nothing instead of "<name>: plugin or variable not found".
production = false

# ---------------------------------------------------------------------------
# Extra global variables
# ---------------------------------------------------------------------------
# Front matter in a file overrides these.
[vars]
# author = "Jane Doe"

# ---------------------------------------------------------------------------
# Macro delimiters
# ---------------------------------------------------------------------------
# {{ name }} is replaced by a variable; {{ command arg1 arg2 }} by the
# output of a plugin found in .zs/ or on $PATH.
[macros]
open = "{{"
close = "}}"

# ---------------------------------------------------------------------------
# Template delimiters
# ---------------------------------------------------------------------------
# Expressions in layouts and .html/.xml files, e.g. <% title %>.
[templates]
open = "<%"
close = "%>"

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
# Available: tables, footnotes, strikethrough, tasklists,
# heading-attributes, smart-punctuation, wikilinks
[markdown]
extensions = ["tables", "strikethrough", "tasklists", "footnotes", "heading-attributes", "wikilinks"]

# ---------------------------------------------------------------------------
# Watch mode
# ---------------------------------------------------------------------------
[watch]
# Milliseconds between scans of the source tree.
interval_ms = 1000
"##
}
