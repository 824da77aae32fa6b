//! # zs
//!
//! A zen static site generator. Content lives at the project root as
//! markdown, HTML/XML templates and plain assets; the site is mirrored into
//! `.pub/`. Everything else (layouts, partials, plugins, config) sits in
//! `.zs/`.
//!
//! # Architecture: One File at a Time
//!
//! Every source file goes through the same pipeline, independently of all
//! others:
//!
//! ```text
//! 1. Resolve   file     →  Vars + body      (defaults, globals, front matter)
//! 2. Expand    body     →  text             ({{ var }} and {{ plugin args }})
//! 3. Render    text     →  .pub/…           (markdown + layout, template, or copy)
//! ```
//!
//! The [`watch`] scheduler drives this pipeline for every file newer than
//! its watermark, once for `zs build` or on a timer for `zs watch`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Project layout: `.zs/`, `.pub/`, `.zsignore` and path helpers |
//! | [`config`] | `.zs/config.toml` loading, merging with stock defaults, validation |
//! | [`vars`] | Variable resolution: defaults, globals, YAML front matter |
//! | [`naming`] | Title and URL defaults derived from file names |
//! | [`expand`] | Macro expansion over variables and plugins |
//! | [`plugin`] | Plugin lookup and the child process contract |
//! | [`render`] | Extension-based dispatch to markdown, templates or raw copy |
//! | [`exclude`] | Gitignore-style rules from `.zsignore` |
//! | [`watch`] | Polling scheduler: walk, change detection, hooks |
//! | [`cancel`] | Cooperative cancellation for the watch loop |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Plugins Are Just Programs
//!
//! Any executable in `.zs/` or on `$PATH` can fill a `{{ macro }}`. It gets
//! the page's variables as `ZS_*` environment entries and whatever it
//! prints becomes the substitution. A static `.zs/<name>.html` file
//! shadows the program of the same name, which makes shared fragments
//! (headers, footers) free.
//!
//! ## Polling Over Events
//!
//! `zs watch` compares modification times against a single watermark on a
//! fixed tick instead of subscribing to filesystem events. Bursts of writes
//! coalesce into the next tick, and there is no platform-specific watcher
//! to go wrong. The price is coarse dependency tracking: pages are rebuilt
//! after a layout change only because any change in `.zs/` rebuilds
//! everything.
//!
//! ## No Global State
//!
//! The resolved configuration and global variables are plain values handed
//! to the [`vars::Resolver`], [`render::Renderer`] and
//! [`watch::Scheduler`] at construction. Plugins receive their `PATH`
//! explicitly rather than through a mutated process environment.

pub mod cancel;
pub mod config;
pub mod exclude;
pub mod expand;
pub mod logging;
pub mod naming;
pub mod output;
pub mod paths;
pub mod plugin;
pub mod render;
pub mod vars;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
