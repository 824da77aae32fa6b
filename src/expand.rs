//! Macro expansion.
//!
//! A body is scanned once, left to right, for `open … close` spans (`{{`
//! and `}}` by default). The enclosed text is split on whitespace:
//!
//! - a single word naming a variable is replaced by its value;
//! - otherwise the first word names a plugin, the rest are its arguments,
//!   and the span is replaced by the plugin's output;
//! - a name that is neither expands to `<name>: plugin or variable not
//!   found`, or to nothing in production.
//!
//! Substituted text is never scanned again, so a plugin emitting `{{` is
//! safe. Delimiters cannot be escaped. A plugin failure is logged and
//! replaced by nothing; only an unterminated span fails the expansion.

use crate::config::Delimiters;
use crate::plugin::PluginHost;
use crate::vars::Vars;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExpandError {
    #[error("closing delimiter {close:?} not found after offset {offset}")]
    Unterminated { close: String, offset: usize },
}

/// Placeholder for a macro that names neither a variable nor a plugin.
pub fn not_found(name: &str) -> String {
    format!("{name}: plugin or variable not found")
}

#[derive(Debug, Clone)]
pub struct Expander {
    delimiters: Delimiters,
    production: bool,
}

impl Expander {
    pub fn new(delimiters: Delimiters, production: bool) -> Self {
        Self {
            delimiters,
            production,
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Expand every macro in `body`.
    ///
    /// Nothing is returned on error: an unterminated span discards the
    /// partially expanded text.
    pub fn expand<H>(&self, body: &str, vars: &Vars, host: &H) -> Result<String, ExpandError>
    where
        H: PluginHost + ?Sized,
    {
        let Delimiters { open, close } = &self.delimiters;
        let mut out = String::with_capacity(body.len());
        let mut rest = body;

        while let Some(from) = rest.find(open.as_str()) {
            let inner = &rest[from + open.len()..];
            let Some(to) = inner.find(close.as_str()) else {
                return Err(ExpandError::Unterminated {
                    close: close.clone(),
                    offset: body.len() - rest.len() + from,
                });
            };
            out.push_str(&rest[..from]);
            self.substitute(&inner[..to], vars, host, &mut out);
            rest = &inner[to + close.len()..];
        }

        out.push_str(rest);
        Ok(out)
    }

    fn substitute<H>(&self, token: &str, vars: &Vars, host: &H, out: &mut String)
    where
        H: PluginHost + ?Sized,
    {
        let mut words = token.split_whitespace();
        let Some(name) = words.next() else {
            return;
        };
        let args: Vec<String> = words.map(str::to_string).collect();

        if args.is_empty()
            && let Some(value) = vars.get(name)
        {
            out.push_str(value);
            return;
        }

        match host.resolve(name) {
            Some(plugin) => match host.invoke(&plugin, &args, vars) {
                Ok(output) => out.push_str(&output),
                Err(err) => warn!(plugin = name, "{err}"),
            },
            None if self.production => {}
            None => out.push_str(&not_found(name)),
        }
    }
}
