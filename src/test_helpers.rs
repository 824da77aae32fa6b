//! Shared test utilities for the zs test suite.
//!
//! Provides a throwaway site directory with write/mtime helpers, and a
//! [`MockHost`] that stands in for real plugin processes.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = TestSite::new();
//! site.write(".zs/layout.html", "<% content %>");
//! let page = site.write("index.md", "{{ toc }}");
//!
//! let host = MockHost::new().with_plugin("toc", "<nav></nav>");
//! // build `page` with a Renderer over `host`, then:
//! assert_eq!(site.read_output("index.html"), "<nav></nav>");
//! ```

use crate::paths::SitePaths;
use crate::plugin::{Plugin, PluginError, PluginHost, PluginKind};
use crate::vars::Vars;
use filetime::FileTime;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tempfile::TempDir;

// =========================================================================
// Site fixture
// =========================================================================

/// A site root in a temp directory, removed on drop.
pub struct TestSite {
    _dir: TempDir,
    paths: SitePaths,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self {
            _dir: dir,
            paths: SitePaths::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    /// Absolute path of a root-relative path.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write a text file, creating parent directories. Returns its path.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        self.write_bytes(rel, contents.as_bytes())
    }

    pub fn write_bytes(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write a file with mode 0755.
    #[cfg(unix)]
    pub fn write_executable(&self, rel: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write(rel, script);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn set_mtime(&self, rel: &str, time: SystemTime) {
        filetime::set_file_mtime(self.path(rel), FileTime::from_system_time(time)).unwrap();
    }

    /// Contents of a file under the publish directory. Panics if missing.
    pub fn read_output(&self, rel: &str) -> String {
        let path = self.paths.published(Path::new(rel));
        fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("output {} not readable: {err}", path.display()))
    }

    pub fn output_exists(&self, rel: &str) -> bool {
        self.paths.published(Path::new(rel)).exists()
    }
}

// =========================================================================
// Plugin host mock
// =========================================================================

/// One recorded plugin or hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

/// Plugin host with canned outputs that records every invocation.
/// Uses Mutex (not RefCell) so it is Send and can live in a Scheduler.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Name → output; `None` fails.
    plugins: BTreeMap<String, Option<String>>,
    hooks: BTreeMap<String, bool>,
    calls: Mutex<Vec<Invocation>>,
    last_vars: Mutex<Option<Vars>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, name: &str, output: &str) -> Self {
        self.plugins.insert(name.to_string(), Some(output.to_string()));
        self
    }

    pub fn with_failing_plugin(mut self, name: &str) -> Self {
        self.plugins.insert(name.to_string(), None);
        self
    }

    pub fn with_hook(mut self, name: &str) -> Self {
        self.hooks.insert(name.to_string(), true);
        self
    }

    pub fn with_failing_hook(mut self, name: &str) -> Self {
        self.hooks.insert(name.to_string(), false);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Variables passed to the most recent invocation.
    pub fn last_vars(&self) -> Option<Vars> {
        self.last_vars.lock().unwrap().clone()
    }

    fn plugin(name: &str) -> Plugin {
        Plugin {
            name: name.to_string(),
            kind: PluginKind::Executable(PathBuf::from(name)),
        }
    }

    fn failure(name: &str) -> PluginError {
        PluginError::Spawn {
            name: name.to_string(),
            source: std::io::Error::other("mock failure"),
        }
    }
}

impl PluginHost for MockHost {
    fn resolve(&self, name: &str) -> Option<Plugin> {
        self.plugins.contains_key(name).then(|| Self::plugin(name))
    }

    fn resolve_hook(&self, name: &str) -> Option<Plugin> {
        self.hooks.contains_key(name).then(|| Self::plugin(name))
    }

    fn invoke(&self, plugin: &Plugin, args: &[String], vars: &Vars) -> Result<String, PluginError> {
        self.calls.lock().unwrap().push(Invocation {
            name: plugin.name.clone(),
            args: args.to_vec(),
        });
        *self.last_vars.lock().unwrap() = Some(vars.clone());

        if let Some(ok) = self.hooks.get(&plugin.name) {
            return if *ok {
                Ok(String::new())
            } else {
                Err(Self::failure(&plugin.name))
            };
        }
        match self.plugins.get(&plugin.name) {
            Some(Some(output)) => Ok(output.clone()),
            _ => Err(Self::failure(&plugin.name)),
        }
    }
}
