//! Template rendering via `minijinja`.
//!
//! Only the expression delimiters are configurable (`<% title %>` by
//! default); statements and comments keep the engine's `{% %}` and `{# #}`.
//! Output is plain text: nothing is auto-escaped, and undefined names render
//! as nothing.

use crate::config::Delimiters;
use crate::vars::Vars;
use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment};

pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new(delimiters: &Delimiters) -> Result<Self, minijinja::Error> {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters(delimiters.open.clone(), delimiters.close.clone())
            .build()?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        Ok(Self { env })
    }

    /// Render `source` with `vars` as the template context.
    pub fn render(&self, source: &str, vars: &Vars) -> Result<String, minijinja::Error> {
        self.env.render_str(source, vars)
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TemplateEngine {
        TemplateEngine::new(&Delimiters::new("<%", "%>")).unwrap()
    }

    fn vars(pairs: &[(&str, &str)]) -> Vars {
        pairs.iter().copied().collect()
    }

    #[test]
    fn renders_variables() {
        let out = engine()
            .render("<title><% title %></title>\n", &vars(&[("title", "Home")]))
            .unwrap();
        assert_eq!(out, "<title>Home</title>\n");
    }

    #[test]
    fn does_not_escape_html() {
        let out = engine()
            .render("<% content %>", &vars(&[("content", "<p>a & b</p>")]))
            .unwrap();
        assert_eq!(out, "<p>a & b</p>");
    }

    #[test]
    fn default_curly_expressions_are_literal() {
        let out = engine().render("{{ title }}", &vars(&[("title", "x")])).unwrap();
        assert_eq!(out, "{{ title }}");
    }

    #[test]
    fn statements_keep_engine_syntax() {
        let out = engine()
            .render(
                "{% if production %}prod{% else %}dev{% endif %}",
                &vars(&[("production", "1")]),
            )
            .unwrap();
        assert_eq!(out, "prod");
    }

    #[test]
    fn undefined_renders_empty() {
        let out = engine().render("[<% missing %>]", &Vars::new()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn syntax_error_is_reported() {
        assert!(engine().render("<% title ", &Vars::new()).is_err());
    }

    #[test]
    fn custom_delimiters() {
        let engine = TemplateEngine::new(&Delimiters::new("[[", "]]")).unwrap();
        let out = engine.render("[[ title ]]", &vars(&[("title", "x")])).unwrap();
        assert_eq!(out, "x");
    }
}
