//! Syntax highlighting for code blocks.

use syntect::{highlighting::ThemeSet, html::highlighted_html_for_string, parsing::SyntaxSet};
use thiserror::Error;

/// Syntax highlighting errors.
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// The requested theme is not bundled.
    #[error("unknown highlight theme: {0}")]
    UnknownTheme(String),
}

/// Syntax highlighter using syntect.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme: "base16-ocean.dark".to_string(),
        }
    }
}

impl SyntaxHighlighter {
    /// Create a highlighter using the named theme.
    pub fn new(theme: &str) -> Result<Self, SyntaxError> {
        let mut highlighter = Self::default();
        highlighter.set_theme(theme)?;
        Ok(highlighter)
    }

    /// Get available theme names.
    pub fn available_themes(&self) -> Vec<&str> {
        self.theme_set.themes.keys().map(|s| s.as_str()).collect()
    }

    /// Name of the active theme.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Switch to another bundled theme.
    pub fn set_theme(&mut self, theme: &str) -> Result<(), SyntaxError> {
        if !self.theme_set.themes.contains_key(theme) {
            return Err(SyntaxError::UnknownTheme(theme.to_string()));
        }
        self.theme = theme.to_string();
        Ok(())
    }

    /// Highlight code with the given language.
    ///
    /// Unknown languages are highlighted as plain text; if syntect fails the
    /// code is wrapped in an escaped `<pre><code>` block.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang
            .and_then(|l| self.syntax_set.find_syntax_by_token(l))
            .or_else(|| self.syntax_set.find_syntax_by_extension("txt"));

        let theme = self.theme_set.themes.get(&self.theme);

        match (syntax, theme) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                    .unwrap_or_else(|_| fallback_highlight(code, lang))
            }
            _ => fallback_highlight(code, lang),
        }
    }
}

fn fallback_highlight(code: &str, lang: Option<&str>) -> String {
    let lang_class = lang
        .map(|l| format!(" class=\"language-{}\"", html_escape(l)))
        .unwrap_or_default();
    format!("<pre><code{lang_class}>{}</code></pre>", html_escape(code))
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
