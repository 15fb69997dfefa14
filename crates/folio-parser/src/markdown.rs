//! Markdown renderer using pulldown-cmark.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::syntax::{SyntaxError, SyntaxHighlighter};

/// Markdown renderer with syntax highlighting support.
#[derive(Debug)]
pub struct MarkdownParser {
    highlighter: SyntaxHighlighter,
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Heading being rendered: where its id attribute goes and its plain text.
struct OpenHeading {
    attr_pos: usize,
    has_id: bool,
    text: String,
}

impl MarkdownParser {
    /// Create a new markdown parser with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter: SyntaxHighlighter::default(),
            options,
        }
    }

    /// Create a parser with a custom syntax theme.
    pub fn with_theme(theme: &str) -> Result<Self, SyntaxError> {
        let mut parser = Self::new();
        parser.highlighter.set_theme(theme)?;
        Ok(parser)
    }

    /// Render a markdown body (frontmatter already removed) to HTML.
    ///
    /// Text is escaped for `&`, `<` and `>` only, so quoted arguments of
    /// inline `{% ... %}` directives pass through intact.
    pub fn render(&self, content: &str) -> String {
        let parser = Parser::new_ext(content, self.options);
        let mut html = String::with_capacity(content.len() * 3 / 2);
        let mut heading: Option<OpenHeading> = None;
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();
        let mut image_depth = 0usize;

        for event in parser {
            match event {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    html.push_str(&format!("<h{}", level as u8));
                    let has_id = id.is_some();
                    if let Some(id) = id {
                        html.push_str(&format!(" id=\"{}\"", escape_attr(&id)));
                    }
                    heading = Some(OpenHeading {
                        attr_pos: html.len(),
                        has_id,
                        text: String::new(),
                    });
                    html.push('>');
                }

                Event::End(TagEnd::Heading(level)) => {
                    if let Some(open) = heading.take() {
                        let id = slugify(&open.text);
                        if !open.has_id && !id.is_empty() {
                            html.insert_str(open.attr_pos, &format!(" id=\"{id}\""));
                        }
                    }
                    html.push_str(&format!("</h{}>\n", level as u8));
                }

                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            // Info strings may carry attributes after the language.
                            let lang = lang.split_whitespace().next().unwrap_or_default();
                            if lang.is_empty() {
                                None
                            } else {
                                Some(lang.to_string())
                            }
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }

                Event::End(TagEnd::CodeBlock) => {
                    let highlighted = self
                        .highlighter
                        .highlight(&code_block_content, code_block_lang.as_deref());
                    html.push_str(&highlighted);
                    html.push('\n');
                    in_code_block = false;
                    code_block_lang = None;
                    code_block_content.clear();
                }

                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }

                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    image_depth += 1;
                    html.push_str(&format!("<img src=\"{}\"", escape_attr(&dest_url)));
                    if !title.is_empty() {
                        html.push_str(&format!(" title=\"{}\"", escape_attr(&title)));
                    }
                    html.push_str(" alt=\"");
                }

                Event::End(TagEnd::Image) => {
                    image_depth = image_depth.saturating_sub(1);
                    html.push_str("\" />");
                }

                Event::Text(text) | Event::Code(text) if image_depth > 0 => {
                    html.push_str(&escape_attr(&text));
                }

                Event::Text(text) => {
                    if let Some(open) = heading.as_mut() {
                        open.text.push_str(&text);
                    }
                    html.push_str(&escape_text(&text));
                }

                Event::Code(code) => {
                    if let Some(open) = heading.as_mut() {
                        open.text.push_str(&code);
                    }
                    html.push_str(&format!("<code>{}</code>", escape_text(&code)));
                }

                Event::SoftBreak => {
                    html.push('\n');
                }

                Event::HardBreak => {
                    html.push_str("<br />\n");
                }

                Event::Start(tag) => {
                    html.push_str(&tag_to_html_start(&tag));
                }

                Event::End(tag) => {
                    html.push_str(&tag_to_html_end(&tag));
                }

                Event::Html(raw) | Event::InlineHtml(raw) => {
                    html.push_str(&raw);
                }

                Event::FootnoteReference(name) => {
                    let name = escape_attr(&name);
                    html.push_str(&format!(
                        "<sup class=\"footnote-ref\"><a href=\"#fn-{name}\">[{name}]</a></sup>"
                    ));
                }

                Event::Rule => {
                    html.push_str("<hr />\n");
                }

                Event::TaskListMarker(checked) => {
                    let checkbox = if checked {
                        "<input type=\"checkbox\" checked disabled />"
                    } else {
                        "<input type=\"checkbox\" disabled />"
                    };
                    html.push_str(checkbox);
                }

                Event::InlineMath(math) => {
                    html.push_str(&format!(
                        "<span class=\"math inline\">\\({}\\)</span>",
                        escape_text(&math)
                    ));
                }

                Event::DisplayMath(math) => {
                    html.push_str(&format!(
                        "<div class=\"math display\">\\[{}\\]</div>",
                        escape_text(&math)
                    ));
                }
            }
        }

        html
    }
}

/// Convert a pulldown-cmark tag to HTML opening tag.
fn tag_to_html_start(tag: &Tag) -> String {
    match tag {
        Tag::Paragraph => "<p>".to_string(),
        // Headings, code blocks and images are handled in `render`.
        Tag::Heading { .. } | Tag::CodeBlock(_) | Tag::Image { .. } => String::new(),
        Tag::BlockQuote(_) => "<blockquote>\n".to_string(),
        Tag::List(Some(1)) => "<ol>\n".to_string(),
        Tag::List(Some(start)) => format!("<ol start=\"{start}\">\n"),
        Tag::List(None) => "<ul>\n".to_string(),
        Tag::Item => "<li>".to_string(),
        Tag::FootnoteDefinition(name) => {
            format!("<div class=\"footnote\" id=\"fn-{}\">", escape_attr(name))
        }
        Tag::Table(_) => "<table>".to_string(),
        Tag::TableHead => "<thead><tr>".to_string(),
        Tag::TableRow => "<tr>".to_string(),
        Tag::TableCell => "<td>".to_string(),
        Tag::Emphasis => "<em>".to_string(),
        Tag::Strong => "<strong>".to_string(),
        Tag::Strikethrough => "<del>".to_string(),
        Tag::Link {
            dest_url, title, ..
        } => {
            let title_attr = if title.is_empty() {
                String::new()
            } else {
                format!(" title=\"{}\"", escape_attr(title))
            };
            format!("<a href=\"{}\"{title_attr}>", escape_attr(dest_url))
        }
        Tag::HtmlBlock => String::new(),
        Tag::MetadataBlock(_) => String::new(),
        Tag::DefinitionList => "<dl>".to_string(),
        Tag::DefinitionListTitle => "<dt>".to_string(),
        Tag::DefinitionListDefinition => "<dd>".to_string(),
        Tag::Superscript => "<sup>".to_string(),
        Tag::Subscript => "<sub>".to_string(),
    }
}

/// Convert a pulldown-cmark tag end to HTML closing tag.
fn tag_to_html_end(tag: &TagEnd) -> String {
    match tag {
        TagEnd::Paragraph => "</p>\n".to_string(),
        TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::Image => String::new(),
        TagEnd::BlockQuote(_) => "</blockquote>\n".to_string(),
        TagEnd::List(true) => "</ol>\n".to_string(),
        TagEnd::List(false) => "</ul>\n".to_string(),
        TagEnd::Item => "</li>\n".to_string(),
        TagEnd::FootnoteDefinition => "</div>\n".to_string(),
        TagEnd::Table => "</table>\n".to_string(),
        TagEnd::TableHead => "</tr></thead>\n".to_string(),
        TagEnd::TableRow => "</tr>\n".to_string(),
        TagEnd::TableCell => "</td>".to_string(),
        TagEnd::Emphasis => "</em>".to_string(),
        TagEnd::Strong => "</strong>".to_string(),
        TagEnd::Strikethrough => "</del>".to_string(),
        TagEnd::Link => "</a>".to_string(),
        TagEnd::HtmlBlock => String::new(),
        TagEnd::MetadataBlock(_) => String::new(),
        TagEnd::DefinitionList => "</dl>\n".to_string(),
        TagEnd::DefinitionListTitle => "</dt>\n".to_string(),
        TagEnd::DefinitionListDefinition => "</dd>\n".to_string(),
        TagEnd::Superscript => "</sup>".to_string(),
        TagEnd::Subscript => "</sub>".to_string(),
    }
}

/// Escape text content.
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value.
fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Convert heading text to an anchor id.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_markdown() {
        let parser = MarkdownParser::new();
        let html = parser.render("# Hello World\n\nThis is a test.");

        assert!(html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_explicit_heading_id() {
        let parser = MarkdownParser::new();
        let html = parser.render("## Setup {#custom}");

        assert!(html.contains("<h2 id=\"custom\">Setup</h2>"));
    }

    #[test]
    fn test_render_code_block() {
        let parser = MarkdownParser::new();
        let html = parser.render(
            r#"```rust
fn main() {
    println!("Hello");
}
```"#,
        );

        assert!(html.contains("<pre"));
        assert!(html.contains("fn"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_indented_code_block_is_not_paragraph_text() {
        let parser = MarkdownParser::new();
        let html = parser.render("Intro\n\n    let x = 1;\n");

        assert!(html.contains("<pre"));
        assert!(!html.contains("<p>let x"));
    }

    #[test]
    fn test_directive_quotes_survive() {
        let parser = MarkdownParser::new();
        let html = parser.render(r#"See {% link article="guides/setup" %} for details."#);

        assert!(html.contains(r#"{% link article="guides/setup" %}"#));
    }

    #[test]
    fn test_text_is_escaped() {
        let parser = MarkdownParser::new();
        let html = parser.render("a < b && c > d");

        assert!(html.contains("a &lt; b &amp;&amp; c &gt; d"));
    }

    #[test]
    fn test_link_and_image() {
        let parser = MarkdownParser::new();
        let html = parser.render(r#"[Docs](https://example.com "The docs") ![A "cat"](cat.png)"#);

        assert!(html.contains(r#"<a href="https://example.com" title="The docs">Docs</a>"#));
        assert!(html.contains(r#"<img src="cat.png" alt="A &quot;cat&quot;" />"#));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test 123 Post"), "test-123-post");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("Special!@#Chars"), "specialchars");
    }

    #[test]
    fn test_table_rendering() {
        let parser = MarkdownParser::new();
        let html = parser.render(
            r#"| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |"#,
        );

        assert!(html.contains("<table>"));
        assert!(html.contains("<thead>"));
        assert!(html.contains("<td>"));
    }

    #[test]
    fn test_task_list() {
        let parser = MarkdownParser::new();
        let html = parser.render("- [x] Done\n- [ ] Not done");

        assert!(html.contains("checkbox"));
        assert!(html.contains("checked"));
    }

    #[test]
    fn test_unknown_theme_rejected() {
        assert!(MarkdownParser::with_theme("no-such-theme").is_err());
        assert!(MarkdownParser::with_theme("InspiredGitHub").is_ok());
    }
}
