//! Project layout.
//!
//! A zs project is a plain directory. Content sits at the root; everything
//! that is not content lives in two dot-directories and one dotfile:
//!
//! ```text
//! site/
//! ├── .zs/                 # Support directory
//! │   ├── config.toml      # Site configuration (optional)
//! │   ├── layout.html      # Default layout for markdown pages
//! │   ├── footer.html      # Partial: {{ footer }} is replaced by this file
//! │   └── toc              # Plugin: any executable, found before $PATH
//! ├── .zsignore            # Ignore rules (gitignore syntax)
//! ├── .pub/                # Publish directory, mirrors the tree below
//! ├── index.md             # → .pub/index.html
//! ├── feed.xml             # → .pub/feed.xml (template)
//! └── img/logo.png         # → .pub/img/logo.png (raw copy)
//! ```

use std::path::{Component, Path, PathBuf};

/// Support directory holding layouts, partials, plugins and config.
pub const SUPPORT_DIR: &str = ".zs";

/// Publish directory that mirrors the source tree.
pub const PUBLISH_DIR: &str = ".pub";

/// Ignore rules at the project root.
pub const IGNORE_FILE: &str = ".zsignore";

/// Configuration file name inside the support directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Layout applied to markdown pages that don't name one.
pub const DEFAULT_LAYOUT: &str = "layout.html";

/// Extension of precomputed partial fragments in the support directory.
pub const PARTIAL_EXTENSION: &str = "html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    root: PathBuf,
}

impl SitePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn support_dir(&self) -> PathBuf {
        self.root.join(SUPPORT_DIR)
    }

    pub fn publish_dir(&self) -> PathBuf {
        self.root.join(PUBLISH_DIR)
    }

    pub fn ignore_file(&self) -> PathBuf {
        self.root.join(IGNORE_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.support_dir().join(CONFIG_FILE)
    }

    /// Path of the partial fragment that shadows a plugin called `name`.
    ///
    /// Returns `None` for names that are not a single plain file name, so a
    /// macro can never read outside the support directory.
    pub fn partial(&self, name: &str) -> Option<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(
                self.support_dir()
                    .join(format!("{name}.{PARTIAL_EXTENSION}")),
            ),
            _ => None,
        }
    }

    /// Express `path` relative to the project root.
    ///
    /// Paths outside the root are returned as given. `.` components are
    /// dropped either way, so `./blog/post.md` and `blog/post.md` agree.
    pub fn relative(&self, path: &Path) -> PathBuf {
        let stripped = path.strip_prefix(&self.root).unwrap_or(path);
        stripped
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    /// Where the mirrored copy of a root-relative path lands.
    pub fn published(&self, rel: &Path) -> PathBuf {
        self.publish_dir().join(rel)
    }

    /// True for the ignore file and anything inside the support directory.
    ///
    /// Control entries are never built; a change to one forces a full rebuild.
    pub fn is_control(&self, rel: &Path) -> bool {
        rel == Path::new(IGNORE_FILE) || rel.starts_with(SUPPORT_DIR)
    }

    pub fn is_published(&self, rel: &Path) -> bool {
        rel.starts_with(PUBLISH_DIR)
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub fn slash_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
