//! HTML template system for page generation.
//!
//! Templates use plain variable interpolation: `{{ name }}` inserts a required
//! variable and `{{ name? }}` an optional one. Names may be dotted
//! (`site.title`, `args.article`). Substituted values are inserted verbatim and
//! never re-scanned.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Missing required variable.
    #[error("missing required variable '{name}' in {template} at line {line}")]
    MissingVariable {
        name: String,
        template: String,
        line: usize,
    },

    /// Invalid template syntax.
    #[error("invalid template syntax in {template} at line {line}: {message}")]
    InvalidSyntax {
        message: String,
        template: String,
        line: usize,
    },

    /// Failure reading a template file.
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TemplateError {
    /// Line of the offending placeholder, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MissingVariable { line, .. } | Self::InvalidSyntax { line, .. } => Some(*line),
            Self::NotFound(_) | Self::Io { .. } => None,
        }
    }
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a variable only when a value is present.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for TemplateContext {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// A simple template that supports variable interpolation.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let content = self.content.as_str();
        let mut output = String::with_capacity(content.len());
        let mut pos = 0;

        while let Some(offset) = content[pos..].find("{{") {
            let start = pos + offset;
            output.push_str(&content[pos..start]);

            let end = content[start + 2..]
                .find("}}")
                .map(|e| start + 2 + e)
                .ok_or_else(|| self.syntax_error("unclosed {{ delimiter", start))?;

            let expr = content[start + 2..end].trim();
            let (name, optional) = match expr.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (expr, false),
            };

            if name.is_empty() {
                return Err(self.syntax_error("empty variable name", start));
            }
            if !name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-')
            {
                return Err(self.syntax_error(format!("invalid variable name '{name}'"), start));
            }

            match context.get(name) {
                Some(value) => output.push_str(value),
                None if optional => {}
                None => {
                    return Err(TemplateError::MissingVariable {
                        name: name.to_string(),
                        template: self.name.clone(),
                        line: line_of(content, start),
                    });
                }
            }

            pos = end + 2;
        }

        output.push_str(&content[pos..]);
        Ok(output)
    }

    fn syntax_error(&self, message: impl Into<String>, offset: usize) -> TemplateError {
        TemplateError::InvalidSyntax {
            message: message.into(),
            template: self.name.clone(),
            line: line_of(&self.content, offset),
        }
    }
}

/// 1-based line number of a byte offset.
fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Registry of templates keyed by `/`-separated path.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a new registry with the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    /// Load every file below `dir` on top of the built-in templates.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(TemplateError::NotFound(dir.display().to_string()));
        }

        let mut registry = Self::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| TemplateError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let name = template_name(path.strip_prefix(dir).unwrap_or(path));
            let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(template = %name, "loaded template");
            registry.register(Template::new(name, content));
        }

        Ok(registry)
    }

    /// Register default built-in templates.
    fn register_defaults(&mut self) {
        self.register(Template::new("article.html", DEFAULT_ARTICLE_TEMPLATE));
        self.register(Template::new("tags/link.html", DEFAULT_LINK_TAG_TEMPLATE));
        self.register(Template::new(
            "tags/site_meta.html",
            DEFAULT_SITE_META_TAG_TEMPLATE,
        ));
    }

    /// Register a template, replacing any with the same name.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Get a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        template.render(context)
    }
}

/// Registry key for a path relative to the templates directory.
fn template_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Default article page template.
pub const DEFAULT_ARTICLE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }} | {{ site.title }}</title>
    <meta name="description" content="{{ description? }}">
    <link rel="canonical" href="{{ page_url }}">
    {{ alternate_links? }}
</head>
<body>
    <header>
        <a href="{{ base_url }}" class="site-title">{{ site.title }}</a>
    </header>
    <main>
        <article>
            <header>
                <h1>{{ title }}</h1>
                <time datetime="{{ written }}">{{ written_formatted }}</time>
                {{ topics_html? }}
                {{ alternates_html? }}
            </header>
            <div class="content">
                {{ content }}
            </div>
        </article>
        <nav class="article-nav">
            {{ previous_html? }}
            {{ next_html? }}
        </nav>
        {{ related_html? }}
    </main>
    <footer>
        <p>&copy; {{ site.current_year }} {{ site.author? }}</p>
    </footer>
</body>
</html>
"#;

/// Default template for the `link` tag.
pub const DEFAULT_LINK_TAG_TEMPLATE: &str = r#"<a href="{{ url }}">{{ title }}</a>"#;

/// Default template for the `site_meta` tag.
pub const DEFAULT_SITE_META_TAG_TEMPLATE: &str = "{{ value }}";
