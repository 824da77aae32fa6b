//! Polling rebuild scheduler.
//!
//! One pass walks the whole source tree in file-name order and builds every
//! entry whose modification time is newer than the **watermark**:
//!
//! ```text
//!           ┌──────────── tick / first pass ────────────┐
//!           ▼                                           │
//!   Idle ─► Scanning ─► (walk, builds, hooks) ─► Idle ──┘
//!    │
//!    └── cancel ─► Cancelled
//! ```
//!
//! - The ignore file or anything in `.zs/` being newer than the watermark
//!   resets it to the epoch, so the rest of the pass rebuilds everything.
//!   If the reset comes after unchanged entries were already skipped, the
//!   next pass starts from the epoch as well.
//! - A changed ignore file is re-read on the spot; the entries after it in
//!   the same pass are already matched against the new rules.
//! - `prehook` runs before the first build of a pass and `posthook` after
//!   the last one, each at most once, and only when something was built.
//! - A failing file is logged and recorded; the walk goes on. In watch
//!   mode a failing pass is logged too, and the next tick tries again.
//! - After a pass the watermark moves to the time the pass started.
//!
//! Change detection is deliberately coarse: a changed layout or partial
//! only triggers rebuilds through the `.zs/` reset.

use crate::cancel::CancelToken;
use crate::exclude::IgnoreRules;
use crate::paths::{IGNORE_FILE, SitePaths};
use crate::plugin::{POSTHOOK, PREHOOK, PluginHost};
use crate::render::Renderer;
use crossbeam::channel;
use crossbeam::select;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("site root {0} is not a directory")]
    MissingRoot(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Scanning,
    Cancelled,
}

/// What one pass did. Paths are relative to the site root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub built: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub walk_errors: Vec<String>,
    pub hooks: Vec<String>,
    /// A control entry changed and the watermark went back to the epoch.
    pub reset: bool,
}

impl CycleReport {
    /// True if at least one entry was due for a build.
    pub fn modified(&self) -> bool {
        !self.built.is_empty() || !self.failed.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Scheduler<H> {
    renderer: Renderer<H>,
    ignore: IgnoreRules,
    interval: Duration,
    watermark: SystemTime,
    modified: bool,
    state: State,
}

impl<H: PluginHost> Scheduler<H> {
    pub fn new(renderer: Renderer<H>, interval: Duration) -> Self {
        let ignore = IgnoreRules::load(renderer.paths());
        Self {
            renderer,
            ignore,
            interval,
            watermark: UNIX_EPOCH,
            modified: false,
            state: State::Idle,
        }
    }

    pub fn renderer(&self) -> &Renderer<H> {
        &self.renderer
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn watermark(&self) -> SystemTime {
        self.watermark
    }

    pub fn set_watermark(&mut self, watermark: SystemTime) {
        self.watermark = watermark;
    }

    /// Build everything once and report.
    pub fn run_once(&mut self) -> Result<CycleReport, WatchError> {
        self.scan()
    }

    /// Scan on every tick until `cancel` fires.
    ///
    /// The first pass starts immediately. `on_cycle` sees the report of each
    /// pass that completed; a pass that fails is logged and retried on the
    /// next tick. A pass in progress always runs to completion.
    pub fn watch<F>(&mut self, cancel: &CancelToken, mut on_cycle: F)
    where
        F: FnMut(&CycleReport),
    {
        let ticker = channel::tick(self.interval);
        info!(root = %self.renderer.paths().root().display(), "watching for changes");

        while !cancel.is_cancelled() {
            match self.scan() {
                Ok(report) => on_cycle(&report),
                Err(err) => {
                    error!("scan failed: {err}");
                    self.state = State::Idle;
                }
            }

            select! {
                recv(ticker) -> _ => {}
                recv(cancel.signal()) -> _ => {}
            }
        }

        self.state = State::Cancelled;
        debug!("watch cancelled");
    }

    /// One full walk of the source tree.
    pub fn scan(&mut self) -> Result<CycleReport, WatchError> {
        let paths = self.renderer.paths().clone();
        if !paths.root().is_dir() {
            return Err(WatchError::MissingRoot(paths.root().to_path_buf()));
        }
        fs::create_dir_all(paths.publish_dir())?;

        self.state = State::Scanning;
        debug!(watermark = ?self.watermark, "scan started");
        let started = SystemTime::now();
        let mut report = CycleReport::default();
        let mut skipped = false;
        let mut rescan_all = false;

        let mut walker = WalkDir::new(paths.root())
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("walk error: {err}");
                    report.walk_errors.push(err.to_string());
                    continue;
                }
            };
            let rel = paths.relative(entry.path());
            let is_dir = entry.file_type().is_dir();
            let control = paths.is_control(&rel);

            // Control entries are visited even when a rule like `.*` matches them.
            if !control && (paths.is_published(&rel) || self.ignore.is_ignored(&rel, is_dir)) {
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            let mtime = match modified_time(&entry) {
                Ok(mtime) => mtime,
                Err(err) => {
                    warn!(path = %rel.display(), "walk error: {err}");
                    report.walk_errors.push(format!("{}: {err}", rel.display()));
                    continue;
                }
            };

            if control {
                if mtime > self.watermark {
                    debug!(path = %rel.display(), "support files changed, rebuilding everything");
                    self.watermark = UNIX_EPOCH;
                    report.reset = true;
                    rescan_all |= skipped;
                    if rel == Path::new(IGNORE_FILE) {
                        self.ignore = IgnoreRules::load(&paths);
                        debug!("ignore rules reloaded");
                    }
                }
                continue;
            }

            if is_dir {
                if let Err(err) = fs::create_dir_all(paths.published(&rel)) {
                    warn!(path = %rel.display(), "cannot create output directory: {err}");
                    report.walk_errors.push(format!("{}: {err}", rel.display()));
                }
                continue;
            }

            if mtime <= self.watermark {
                skipped = true;
                continue;
            }

            if !self.modified {
                self.modified = true;
                self.run_hook(PREHOOK, &mut report);
            }
            info!("build: {}", rel.display());
            match self.renderer.build(entry.path(), None) {
                Ok(()) => report.built.push(rel),
                Err(err) => {
                    error!(path = %rel.display(), "{err}");
                    report.failed.push((rel, err.to_string()));
                }
            }
        }

        if self.modified {
            self.run_hook(POSTHOOK, &mut report);
            self.modified = false;
        }

        self.watermark = if rescan_all { UNIX_EPOCH } else { started };
        self.state = State::Idle;
        debug!(
            built = report.built.len(),
            failed = report.failed.len(),
            "scan finished"
        );
        Ok(report)
    }

    fn run_hook(&self, name: &str, report: &mut CycleReport) {
        let host = self.renderer.host();
        let Some(hook) = host.resolve_hook(name) else {
            return;
        };
        report.hooks.push(name.to_string());
        if let Err(err) = host.invoke(&hook, &[], self.renderer.globals()) {
            warn!(hook = name, "{err}");
        }
    }
}

fn modified_time(entry: &DirEntry) -> io::Result<SystemTime> {
    entry.metadata().map_err(io::Error::from)?.modified()
}
