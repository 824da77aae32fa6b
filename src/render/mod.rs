//! Per-file build dispatch.
//!
//! The literal file extension picks the strategy:
//!
//! | Extension | Strategy | Output |
//! |---|---|---|
//! | `.md`, `.mkd` | variables → macros → markdown → layout | `name.html` |
//! | `.html`, `.xml` | variables → macros → template | same name |
//! | anything else | byte-for-byte copy | same name |
//!
//! Output goes to the mirrored path under `.pub/`, or to an explicit sink
//! for single-file builds. Raw copies keep the source's permission bits only
//! in the mirrored case.
//!
//! A markdown page is rendered in two passes. The body's expanded text is
//! stored as `source` and its HTML as `content`; then the file named by
//! `layout` (inside `.zs/`) is built as a template with the page's
//! variables as its globals, so the layout sees `<% content %>`.

mod markdown;
mod template;

pub use markdown::Markdown;
pub use template::TemplateEngine;

use crate::config::SiteConfig;
use crate::expand::{ExpandError, Expander};
use crate::naming::rename_ext;
use crate::paths::SitePaths;
use crate::plugin::PluginHost;
use crate::vars::{Resolved, Resolver, Vars, VarsError};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Vars(#[from] VarsError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error("template error in {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
    #[error("invalid template delimiters: {0}")]
    Syntax(minijinja::Error),
    #[error("{0} is outside the site root")]
    OutsideRoot(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Markdown,
    Template,
    Raw,
}

impl RenderKind {
    /// Strategy for `path`, by case-sensitive extension.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("md" | "mkd") => Self::Markdown,
            Some("html" | "xml") => Self::Template,
            _ => Self::Raw,
        }
    }
}

/// Builds single files of a site.
#[derive(Debug)]
pub struct Renderer<H> {
    resolver: Resolver,
    expander: Expander,
    markdown: Markdown,
    templates: TemplateEngine,
    host: H,
}

impl<H: PluginHost> Renderer<H> {
    pub fn new(config: &SiteConfig, resolver: Resolver, host: H) -> Result<Self, RenderError> {
        Ok(Self {
            resolver,
            expander: Expander::new(config.macros.clone(), config.production),
            markdown: Markdown::new(&config.markdown.extensions),
            templates: TemplateEngine::new(&config.templates).map_err(RenderError::Syntax)?,
            host,
        })
    }

    pub fn paths(&self) -> &SitePaths {
        self.resolver.paths()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn globals(&self) -> &Vars {
        self.resolver.globals()
    }

    /// Effective variables of `path`, as a build would see them.
    pub fn vars_for(&self, path: &Path) -> Result<Vars, RenderError> {
        Ok(self.resolver.resolve(path)?.vars)
    }

    /// Build `path` into its mirrored output, or into `sink` when given.
    pub fn build(&self, path: &Path, sink: Option<&mut dyn Write>) -> Result<(), RenderError> {
        match RenderKind::for_path(path) {
            RenderKind::Markdown => self.build_markdown(path, sink),
            RenderKind::Template => {
                let out = self.render_template(path, self.resolver.globals())?;
                self.emit(path, out.as_bytes(), sink)
            }
            RenderKind::Raw => self.build_raw(path, sink),
        }
    }

    /// Render a fragment: macros, then markdown. No front matter or layout.
    pub fn generate(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), RenderError> {
        let mut body = String::new();
        input.read_to_string(&mut body)?;
        let source = self
            .expander
            .expand(&body, self.resolver.globals(), &self.host)?;
        output.write_all(self.markdown.to_html(&source).as_bytes())?;
        Ok(())
    }

    fn build_markdown(&self, path: &Path, sink: Option<&mut dyn Write>) -> Result<(), RenderError> {
        let Resolved { mut vars, body } = self.resolver.resolve(path)?;
        let source = self.expander.expand(&body, &vars, &self.host)?;
        let content = self.markdown.to_html(&source);
        vars.insert("source", source);
        vars.insert("content", content);

        let layout = self
            .paths()
            .support_dir()
            .join(vars.get("layout").unwrap_or_default());
        let html = self.render_template(&layout, &vars)?;
        self.emit(&rename_ext(path, "html"), html.as_bytes(), sink)
    }

    fn render_template(&self, path: &Path, globals: &Vars) -> Result<String, RenderError> {
        let Resolved { vars, body } = self.resolver.resolve_with(path, globals)?;
        let body = self.expander.expand(&body, &vars, &self.host)?;
        self.templates
            .render(&body, &vars)
            .map_err(|source| RenderError::Template {
                path: path.to_path_buf(),
                source,
            })
    }

    fn build_raw(&self, path: &Path, sink: Option<&mut dyn Write>) -> Result<(), RenderError> {
        match sink {
            Some(sink) => {
                io::copy(&mut File::open(path)?, sink)?;
            }
            None => {
                let dest = self.destination(path)?;
                fs::copy(path, dest)?;
            }
        }
        Ok(())
    }

    fn emit(&self, path: &Path, bytes: &[u8], sink: Option<&mut dyn Write>) -> Result<(), RenderError> {
        match sink {
            Some(sink) => sink.write_all(bytes)?,
            None => fs::write(self.destination(path)?, bytes)?,
        }
        Ok(())
    }

    /// Mirrored output path for a source path, with its parent created.
    fn destination(&self, path: &Path) -> Result<PathBuf, RenderError> {
        let rel = self.paths().relative(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || rel.as_os_str().is_empty() {
            return Err(RenderError::OutsideRoot(path.to_path_buf()));
        }
        let dest = self.paths().published(&rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(dest)
    }
}
