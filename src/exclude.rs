//! Ignore rules for the source tree.
//!
//! `.zsignore` at the project root uses gitignore syntax. Without one, the
//! defaults hide backups, dotfiles and the usual repository furniture:
//!
//! ```text
//! *~
//! *.bak
//! .*
//!
//! COPYING
//! LICENSE
//! Makefile
//! README.md
//! ```
//!
//! An ignored directory is skipped with everything below it.

use crate::paths::SitePaths;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_IGNORE: &[&str] = &[
    "*~",
    "*.bak",
    ".*",
    "",
    "COPYING",
    "LICENSE",
    "Makefile",
    "README.md",
];

#[derive(Debug, Clone)]
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    pub fn defaults(root: &Path) -> Self {
        Self::from_lines(root, DEFAULT_IGNORE.iter().copied())
    }

    /// Build rules from gitignore lines. Invalid lines are logged and skipped.
    pub fn from_lines<'a>(root: &Path, lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        for line in lines {
            if let Err(err) = builder.add_line(None, line) {
                warn!("skipping ignore rule {line:?}: {err}");
            }
        }
        let matcher = builder.build().unwrap_or_else(|err| {
            warn!("invalid ignore rules: {err}");
            Gitignore::empty()
        });
        Self { matcher }
    }

    /// Rules from the site's ignore file, or the defaults if there is none.
    pub fn load(paths: &SitePaths) -> Self {
        let file = paths.ignore_file();
        match fs::read_to_string(&file) {
            Ok(text) => Self::from_lines(paths.root(), text.lines()),
            Err(err) if err.kind() == ErrorKind::NotFound => Self::defaults(paths.root()),
            Err(err) => {
                warn!(path = %file.display(), "using default ignore rules: {err}");
                Self::defaults(paths.root())
            }
        }
    }

    /// Whether the root-relative `rel` is excluded.
    pub fn is_ignored(&self, rel: &Path, is_dir: bool) -> bool {
        self.matcher.matched(rel, is_dir).is_ignore()
    }
}
