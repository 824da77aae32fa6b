//! Plugins: external programs whose output replaces a macro.
//!
//! A macro such as `{{ toc 3 }}` that does not name a variable is looked up
//! as a plugin called `toc`:
//!
//! 1. **Partial**: `.zs/toc.html` exists → its contents are substituted and
//!    no process is started.
//! 2. **Executable**: `toc` is found on the search path (`.zs/` first, then
//!    `$PATH`) → it is run with the macro's remaining words as arguments and
//!    its standard output is substituted.
//!
//! ## Process contract
//!
//! | Entry | Value |
//! |-------|-------|
//! | `ZS_<NAME>` | every resolved variable except `content` |
//! | `ZS` | path of the running `zs` binary |
//! | `ZS_OUTDIR` | absolute publish directory |
//! | `PATH` | the search path, so plugins find sibling plugins first |
//!
//! The working directory is the project root, standard input is empty, and
//! standard error is captured and logged. Hooks (`prehook`, `posthook`) use
//! the same contract but are only ever executables.
//!
//! [`PluginHost`] is the seam between the expander/scheduler and the
//! operating system; tests swap in a recording mock.

use crate::paths::SitePaths;
use crate::vars::{ENV_PREFIX, Vars};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

/// Hook run before the first build of a cycle.
pub const PREHOOK: &str = "prehook";

/// Hook run after the last build of a cycle.
pub const POSTHOOK: &str = "posthook";

/// Variable never exported to plugins.
const WITHHELD_VAR: &str = "content";

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("cannot read partial {path}: {source}")]
    Partial {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot start {name}: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },
    #[error("{name} failed ({status}): {stderr}")]
    Failed {
        name: String,
        status: ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginKind {
    /// Precomputed fragment in the support directory.
    Partial(PathBuf),
    /// Program found on the search path.
    Executable(PathBuf),
}

/// A resolved plugin, ready to invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: String,
    pub kind: PluginKind,
}

/// Finds and runs plugins.
pub trait PluginHost {
    /// Resolve a macro command name to a partial or an executable.
    fn resolve(&self, name: &str) -> Option<Plugin>;

    /// Resolve a hook. Hooks are executables only.
    fn resolve_hook(&self, name: &str) -> Option<Plugin>;

    /// Run `plugin` and return the text that replaces the macro.
    fn invoke(&self, plugin: &Plugin, args: &[String], vars: &Vars) -> Result<String, PluginError>;
}

/// Environment entries exported for `vars`.
///
/// Names that cannot be environment keys and values containing NUL are
/// skipped.
pub fn plugin_env(vars: &Vars) -> Vec<(String, String)> {
    vars.iter()
        .filter(|(name, _)| *name != WITHHELD_VAR)
        .filter(|(name, value)| {
            !name.is_empty() && !name.contains(['=', '\0']) && !value.contains('\0')
        })
        .map(|(name, value)| {
            (
                format!("{ENV_PREFIX}{}", name.to_uppercase()),
                value.to_string(),
            )
        })
        .collect()
}

/// Runs plugins as child processes of the current one.
#[derive(Debug, Clone)]
pub struct ProcessHost {
    paths: SitePaths,
    search_path: OsString,
    binary: PathBuf,
}

impl ProcessHost {
    /// Host searching `.zs/` then the inherited `$PATH`.
    pub fn new(paths: SitePaths) -> Self {
        let inherited = env::var_os("PATH").unwrap_or_default();
        Self::with_search_path(paths, &inherited)
    }

    /// Host searching `.zs/` then `path`.
    pub fn with_search_path(paths: SitePaths, path: &OsString) -> Self {
        let mut dirs = vec![paths.support_dir()];
        dirs.extend(env::split_paths(path).filter(|dir| !dir.as_os_str().is_empty()));
        // Fall back to the support dir alone if an inherited entry holds a separator.
        let search_path =
            env::join_paths(&dirs).unwrap_or_else(|_| paths.support_dir().into_os_string());
        let binary = env::current_exe().unwrap_or_else(|_| PathBuf::from("zs"));
        Self {
            paths,
            search_path,
            binary,
        }
    }

    pub fn search_path(&self) -> &OsString {
        &self.search_path
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        which::which_in(name, Some(&self.search_path), self.paths.root()).ok()
    }
}

impl PluginHost for ProcessHost {
    fn resolve(&self, name: &str) -> Option<Plugin> {
        if let Some(partial) = self.paths.partial(name).filter(|p| p.is_file()) {
            return Some(Plugin {
                name: name.to_string(),
                kind: PluginKind::Partial(partial),
            });
        }
        self.resolve_hook(name)
    }

    fn resolve_hook(&self, name: &str) -> Option<Plugin> {
        self.find_executable(name).map(|path| Plugin {
            name: name.to_string(),
            kind: PluginKind::Executable(path),
        })
    }

    fn invoke(&self, plugin: &Plugin, args: &[String], vars: &Vars) -> Result<String, PluginError> {
        let program = match &plugin.kind {
            PluginKind::Partial(path) => {
                return fs::read_to_string(path).map_err(|source| PluginError::Partial {
                    path: path.clone(),
                    source,
                });
            }
            PluginKind::Executable(program) => program,
        };

        debug!(plugin = %plugin.name, ?args, "running plugin");
        let output = Command::new(program)
            .args(args)
            .current_dir(self.paths.root())
            .envs(plugin_env(vars))
            .env("PATH", &self.search_path)
            .env("ZS", &self.binary)
            .env("ZS_OUTDIR", self.paths.publish_dir())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PluginError::Spawn {
                name: plugin.name.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(PluginError::Failed {
                name: plugin.name.clone(),
                status: output.status,
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!(plugin = %plugin.name, "{}", stderr.trim_end());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
