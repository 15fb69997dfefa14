//! Site configuration management.
//!
//! The site configuration is a YAML file. String values of the form
//! `$$include_yaml <path>` or `$$include_json <path>` inside the `data` section
//! are replaced by the parsed content of the referenced file, resolved relative
//! to the directory containing the configuration file.

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: String,

    /// Site author name.
    #[serde(default)]
    pub author: String,

    /// Public site URL (e.g., "https://example.com").
    #[serde(default)]
    pub url: String,

    /// Default language code.
    #[serde(default = "default_language")]
    pub language: String,

    /// `strftime` format used for human-readable dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Path prefix the site is served under; always starts and ends with `/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Custom tag name to template path.
    #[serde(default)]
    pub custom_tags: BTreeMap<String, String>,

    #[serde(default)]
    pub theme: Map<String, Value>,

    #[serde(default)]
    pub social: Map<String, Value>,

    #[serde(default)]
    pub seo: Map<String, Value>,

    /// Pages rendered from a template outside the article flow.
    #[serde(default)]
    pub standalone_pages: Vec<StandalonePage>,

    /// Syntax highlighting theme name.
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,

    /// User-defined data, with include directives expanded.
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Year the build runs in.
    #[serde(skip, default = "current_year")]
    pub current_year: i32,
}

/// A page rendered from a template and written to a fixed output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandalonePage {
    /// Template path, relative to the templates directory.
    pub template: String,
    /// Output path, relative to the output directory.
    pub output: PathBuf,
}

// Default value functions
fn default_language() -> String {
    "en".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_base_url() -> String {
    "/".to_string()
}

fn default_highlight_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn current_year() -> i32 {
    Local::now().year()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            author: String::new(),
            url: String::new(),
            language: default_language(),
            date_format: default_date_format(),
            base_url: default_base_url(),
            custom_tags: BTreeMap::new(),
            theme: Map::new(),
            social: Map::new(),
            seo: Map::new(),
            standalone_pages: Vec::new(),
            highlight_theme: default_highlight_theme(),
            data: Map::new(),
            current_year: current_year(),
        }
    }
}

/// Normalize a base URL so it starts and ends with `/`.
///
/// Absolute URLs (`http://`, `https://`) keep their scheme and only gain the
/// trailing slash.
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    let mut normalized = if trimmed.starts_with('/')
        || trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
    {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

impl SiteConfig {
    /// Load configuration from a YAML file, expanding include directives.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Site config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: SiteConfig = serde_yaml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Invalid site configuration in {}", path.display()),
                e,
            )
        })?;

        let root = path.parent().unwrap_or(Path::new("."));
        if !config.data.is_empty() {
            tracing::debug!("Processing include directives in data section");
            let data = std::mem::take(&mut config.data);
            config.data = data
                .into_iter()
                .map(|(k, v)| resolve_includes(v, root).map(|v| (k, v)))
                .collect::<Result<_>>()?;
        }

        config.base_url = normalize_base_url(&config.base_url);
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::config("title cannot be empty"));
        }

        if self.language.trim().is_empty() {
            return Err(CoreError::config("language cannot be empty"));
        }

        if let Some(page) = self
            .standalone_pages
            .iter()
            .find(|p| p.output.is_absolute())
        {
            return Err(CoreError::config(format!(
                "standalone page output must be relative: {}",
                page.output.display()
            )));
        }

        Ok(())
    }

    /// Replace the base URL, re-normalising it.
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = normalize_base_url(base_url);
    }

    /// Get the full URL for an output-relative path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Look up a configuration value by name.
    ///
    /// Top-level scalar fields are addressed by name (`title`, `base_url`,
    /// `current_year`, ...). Dotted keys reach into `theme`, `social`, `seo` and
    /// `data` (e.g. `social.github`, `data.menu.0.label`). Non-scalar values are
    /// returned as compact JSON.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut parts = key.split('.');
        let head = parts.next()?;

        let scalar = match head {
            "title" => Some(self.title.clone()),
            "description" => Some(self.description.clone()),
            "author" => Some(self.author.clone()),
            "url" => Some(self.url.clone()),
            "language" => Some(self.language.clone()),
            "date_format" => Some(self.date_format.clone()),
            "base_url" => Some(self.base_url.clone()),
            "highlight_theme" => Some(self.highlight_theme.clone()),
            "current_year" => Some(self.current_year.to_string()),
            _ => None,
        };
        if let Some(value) = scalar {
            return parts.next().is_none().then_some(value);
        }

        let map = match head {
            "theme" => &self.theme,
            "social" => &self.social,
            "seo" => &self.seo,
            "data" => &self.data,
            _ => return None,
        };

        let first = parts.next()?;
        let mut current = map.get(first)?;
        for part in parts {
            current = match current {
                Value::Object(obj) => obj.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value_to_text(current))
    }

    /// Flattened `site.*` template variables.
    ///
    /// Nested values in `theme`, `social`, `seo` and `data` are exposed under
    /// dotted names such as `site.social.github`.
    pub fn template_vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        for key in [
            "title",
            "description",
            "author",
            "url",
            "language",
            "date_format",
            "base_url",
            "highlight_theme",
            "current_year",
        ] {
            if let Some(value) = self.lookup(key) {
                vars.insert(format!("site.{key}"), value);
            }
        }
        for (name, map) in [
            ("theme", &self.theme),
            ("social", &self.social),
            ("seo", &self.seo),
            ("data", &self.data),
        ] {
            for (key, value) in map {
                flatten_value(&format!("site.{name}.{key}"), value, &mut vars);
            }
        }
        vars
    }
}

fn flatten_value(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(obj) => {
            for (key, nested) in obj {
                flatten_value(&format!("{prefix}.{key}"), nested, out);
            }
        }
        Value::Array(items) => {
            for (i, nested) in items.iter().enumerate() {
                flatten_value(&format!("{prefix}.{i}"), nested, out);
            }
        }
        scalar => {
            out.insert(prefix.to_string(), value_to_text(scalar));
        }
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Data file formats that can be pulled into the `data` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeFormat {
    Yaml,
    Json,
}

/// Lookup table of include directives.
const INCLUDE_FORMATS: &[IncludeFormat] = &[IncludeFormat::Yaml, IncludeFormat::Json];

impl IncludeFormat {
    /// Directive prefix for this format (e.g. `$$include_yaml`).
    pub fn directive_prefix(&self) -> &'static str {
        match self {
            Self::Yaml => "$$include_yaml",
            Self::Json => "$$include_json",
        }
    }

    /// Human-readable format name.
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }

    /// Match a string value against the directive table, returning the format
    /// and the referenced path.
    pub fn parse_directive(value: &str) -> Option<(Self, &str)> {
        INCLUDE_FORMATS.iter().find_map(|format| {
            value
                .strip_prefix(format.directive_prefix())
                .and_then(|rest| rest.strip_prefix(' '))
                .map(|path| (*format, path.trim()))
        })
    }

    /// Parse a data file of this format.
    pub fn load(&self, path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path)?;
        let value = match self {
            Self::Yaml => serde_yaml::from_str(&content)?,
            Self::Json => serde_json::from_str(&content)?,
        };
        Ok(value)
    }
}

/// Recursively replace include directives inside a value.
pub fn resolve_includes(value: Value, root: &Path) -> Result<Value> {
    match value {
        Value::Object(obj) => obj
            .into_iter()
            .map(|(k, v)| resolve_includes(v, root).map(|v| (k, v)))
            .collect::<Result<Map<_, _>>>()
            .map(Value::Object),
        Value::Array(items) => items
            .into_iter()
            .map(|v| resolve_includes(v, root))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::String(s) => match IncludeFormat::parse_directive(&s) {
            Some((format, file)) => load_include(format, file, root),
            None => Ok(Value::String(s)),
        },
        other => Ok(other),
    }
}

fn load_include(format: IncludeFormat, file: &str, root: &Path) -> Result<Value> {
    let root = std::path::absolute(root)?;
    let full_path = normalize_lexically(&root.join(file));
    let root_normalized = normalize_lexically(&root);

    if !full_path.starts_with(&root_normalized) {
        return Err(CoreError::include(
            file,
            "file path outside config directory",
        ));
    }
    if !full_path.is_file() {
        return Err(CoreError::include(file, "data file not found"));
    }
    // Symlinks must not lead out of the config directory either.
    if let (Ok(real), Ok(real_root)) = (full_path.canonicalize(), root.canonicalize()) {
        if !real.starts_with(&real_root) {
            return Err(CoreError::include(
                file,
                "file path outside config directory",
            ));
        }
    }

    let value = format.load(&full_path).map_err(|e| {
        CoreError::include(
            file,
            format!("error loading {} file: {e}", format.format_name()),
        )
    })?;
    tracing::debug!(file, format = format.format_name(), "Loaded include file");
    Ok(value)
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
