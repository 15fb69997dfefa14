//! Folio Parser Library
//!
//! Markdown-to-HTML rendering with syntax-highlighted code blocks.

pub mod markdown;
pub mod syntax;

pub use markdown::MarkdownParser;
pub use syntax::{SyntaxError, SyntaxHighlighter};

/// Converts a markdown body into HTML.
///
/// Rendering is a pure function of the input text; it has no failure path.
pub trait HtmlRenderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

impl HtmlRenderer for MarkdownParser {
    fn render(&self, source: &str) -> String {
        MarkdownParser::render(self, source)
    }
}
