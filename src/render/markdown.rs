//! Markdown to HTML via `pulldown-cmark`.
//!
//! Raw HTML in the source passes through untouched, so partials and plugin
//! output can inject markup.

use crate::config::MarkdownExtension;
use pulldown_cmark::{Options, Parser, html as md_html};

#[derive(Debug, Clone, Copy)]
pub struct Markdown {
    options: Options,
}

impl Markdown {
    pub fn new(extensions: &[MarkdownExtension]) -> Self {
        let mut options = Options::empty();
        for extension in extensions {
            options.insert(match extension {
                MarkdownExtension::Tables => Options::ENABLE_TABLES,
                MarkdownExtension::Footnotes => Options::ENABLE_FOOTNOTES,
                MarkdownExtension::Strikethrough => Options::ENABLE_STRIKETHROUGH,
                MarkdownExtension::Tasklists => Options::ENABLE_TASKLISTS,
                MarkdownExtension::HeadingAttributes => Options::ENABLE_HEADING_ATTRIBUTES,
                MarkdownExtension::SmartPunctuation => Options::ENABLE_SMART_PUNCTUATION,
                MarkdownExtension::Wikilinks => Options::ENABLE_WIKILINKS,
            });
        }
        Self { options }
    }

    pub fn to_html(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options);
        let mut html = String::with_capacity(source.len() * 3 / 2);
        md_html::push_html(&mut html, parser);
        html
    }
}
