//! Variable resolution for a single source file.
//!
//! Every build starts by computing the file's effective [`Vars`]. Layers are
//! applied lowest precedence first, later writes replacing earlier ones:
//!
//! 1. **Defaults** derived from the path: `title` (guessed from the file
//!    name), an empty `description`, `file`, `url`, `output`.
//! 2. **Globals**: site title/description/keywords, `production`, `ZS_*`
//!    environment variables, `[vars]` from the config and `--var` flags.
//! 3. **`layout`** is set to `layout.html` if no layer so far provided it.
//! 4. **Front matter**: a YAML mapping before the first `\n---\n` line.
//!
//! ```text
//! title: Hello
//! layout: post.html
//! ---
//! # {{ title }}
//! ```
//!
//! Malformed front matter never fails a build. It is logged and the whole
//! file is treated as body, exactly as if no header were present.

use crate::config::SiteConfig;
use crate::naming::{guess_title, url_for};
use crate::paths::{DEFAULT_LAYOUT, PUBLISH_DIR, SitePaths, slash_path};
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Line separating front matter from body.
pub const HEADER_DELIMITER: &str = "\n---\n";

/// Prefix of environment variables that become global variables, and of
/// the variables handed to plugins.
pub const ENV_PREFIX: &str = "ZS_";

#[derive(Error, Debug)]
pub enum VarsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter is not a mapping")]
    NotAMapping,
    #[error("front matter entry {0:?} is not a plain value")]
    NotAScalar(String),
}

/// Variable name to value, names stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Vars(BTreeMap<String, String>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` (lower-cased) to `value`, returning the previous value.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.as_ref().to_lowercase(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Copy every entry of `other` over this set.
    pub fn overlay(&mut self, other: &Vars) {
        for (name, value) in other.iter() {
            self.0.insert(name.to_string(), value.to_string());
        }
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for Vars {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Vars::new();
        vars.extend(iter);
        vars
    }
}

impl IntoIterator for Vars {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The process environment, skipping entries that are not valid UTF-8.
pub fn environment() -> impl Iterator<Item = (String, String)> {
    env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

/// Build the global variables shared by every file of the site.
///
/// Site title, description and keywords are only set when non-empty, so
/// an unset site title leaves the per-file guess alone. `environment` is
/// scanned for `ZS_<NAME>` entries, which become `<name>`.
pub fn globals<I>(config: &SiteConfig, environment: I) -> Vars
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut vars = Vars::new();
    let site = [
        ("title", &config.title),
        ("description", &config.description),
        ("keywords", &config.keywords),
    ];
    for (name, value) in site {
        if !value.is_empty() {
            vars.insert(name, value.as_str());
        }
    }
    if config.production {
        vars.insert("production", "1");
    }

    for (key, value) in environment {
        if let Some(name) = key.strip_prefix(ENV_PREFIX)
            && !name.is_empty()
        {
            vars.insert(name, value);
        }
    }

    vars.extend(config.vars.iter().map(|(k, v)| (k, v.as_str())));
    vars
}

/// Split `text` into front matter and body at the first delimiter line.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let sep = text.find(HEADER_DELIMITER)?;
    Some((&text[..sep], &text[sep + HEADER_DELIMITER.len()..]))
}

/// Parse a front matter block into variables.
///
/// The block must be a YAML mapping of plain values. Numbers and booleans
/// keep their YAML spelling, `null` becomes the empty string.
pub fn parse_front_matter(header: &str) -> Result<Vars, HeaderError> {
    let doc: Value = serde_yaml::from_str(header)?;
    let mapping = match doc {
        Value::Null => return Ok(Vars::new()),
        Value::Mapping(mapping) => mapping,
        _ => return Err(HeaderError::NotAMapping),
    };

    let mut vars = Vars::new();
    for (key, value) in mapping {
        let name = scalar(&key).ok_or_else(|| HeaderError::NotAScalar(format!("{key:?}")))?;
        let value = scalar(&value).ok_or_else(|| HeaderError::NotAScalar(name.clone()))?;
        vars.insert(name, value);
    }
    Ok(vars)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Effective variables and body text of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub vars: Vars,
    pub body: String,
}

/// Computes per-file variables on top of a fixed set of globals.
#[derive(Debug, Clone)]
pub struct Resolver {
    paths: SitePaths,
    globals: Vars,
}

impl Resolver {
    pub fn new(paths: SitePaths, globals: Vars) -> Self {
        Self { paths, globals }
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    pub fn globals(&self) -> &Vars {
        &self.globals
    }

    /// Resolve `path` against the site globals.
    pub fn resolve(&self, path: &Path) -> Result<Resolved, VarsError> {
        self.resolve_with(path, &self.globals)
    }

    /// Resolve `path` with `globals` standing in for the site globals.
    ///
    /// Layouts are resolved this way, with the page's variables as globals.
    pub fn resolve_with(&self, path: &Path, globals: &Vars) -> Result<Resolved, VarsError> {
        let text = fs::read_to_string(path).map_err(|source| VarsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut vars = self.defaults(path);
        vars.overlay(globals);
        if !vars.contains("layout") {
            vars.insert("layout", DEFAULT_LAYOUT);
        }

        let body = match split_front_matter(&text) {
            None => text,
            Some((header, body)) => match parse_front_matter(header) {
                Ok(front) => {
                    vars.overlay(&front);
                    body.to_string()
                }
                Err(err) => {
                    warn!(path = %path.display(), "ignoring front matter: {err}");
                    text
                }
            },
        };

        if let Some(url) = vars.get("url").and_then(|u| u.strip_prefix("./")) {
            let url = url.to_string();
            vars.insert("url", url);
        }

        Ok(Resolved { vars, body })
    }

    fn defaults(&self, path: &Path) -> Vars {
        let rel = self.paths.relative(path);
        let url = url_for(&rel);

        let mut vars = Vars::new();
        vars.insert("title", guess_title(&rel));
        vars.insert("description", "");
        vars.insert("file", slash_path(&rel));
        vars.insert("output", format!("{PUBLISH_DIR}/{url}"));
        vars.insert("url", url);
        vars
    }
}
