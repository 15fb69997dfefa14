//! Content types and structures.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::{
    error::{CoreError, Result},
    frontmatter::{FieldValue, Frontmatter, parse_flag, parse_topics, parse_written},
    slug::{generate_slugs, url_for_slug},
};

/// Frontmatter fields that must be present by default.
pub const REQUIRED_FIELDS: &[&str] = &["title", "written", "topics"];

/// Frontmatter fields read when present by default.
pub const OPTIONAL_FIELDS: &[&str] = &["description", "disabled", "image", "lang", "id"];

/// Type of content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Markdown content (.md / .markdown files).
    Markdown,
}

impl ContentType {
    /// Determine content type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Determine content type from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Index of a record inside the build's record arena.
///
/// Relationships between records (`previous`, `next`, `related`,
/// `alternate_languages`) are stored as ids into the canonical record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordId(pub usize);

impl RecordId {
    /// Position in the record list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Alternate-language variants of a record, keyed by language code.
///
/// Keeps insertion order; inserting an existing language replaces its entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternateLanguages {
    entries: Vec<(String, RecordId)>,
}

impl AlternateLanguages {
    /// Insert or replace the variant for `lang`.
    pub fn insert(&mut self, lang: impl Into<String>, id: RecordId) {
        let lang = lang.into();
        match self.entries.iter_mut().find(|(l, _)| *l == lang) {
            Some(entry) => entry.1 = id,
            None => self.entries.push((lang, id)),
        }
    }

    /// Variant for a language, if any.
    pub fn get(&self, lang: &str) -> Option<RecordId> {
        self.entries
            .iter()
            .find(|(l, _)| l == lang)
            .map(|(_, id)| *id)
    }

    pub fn contains_language(&self, lang: &str) -> bool {
        self.get(lang).is_some()
    }

    /// Iterate `(language, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, RecordId)> {
        self.entries.iter().map(|(l, id)| (l.as_str(), *id))
    }

    /// Language codes in insertion order.
    pub fn codes(&self) -> Vec<String> {
        self.entries.iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Typed metadata of one content file.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Title, `"Untitled"` when absent.
    pub title: String,
    /// Publication date.
    pub written: NaiveDate,
    /// Topics, trimmed and de-duplicated in declaration order.
    pub topics: Vec<String>,
    pub description: Option<String>,
    pub disabled: bool,
    pub image: Option<String>,
    /// Language code, the site default when absent.
    pub language: String,
    /// Explicit `id` used for cross-language matching.
    pub external_id: Option<String>,
    /// Optional fields outside the typed set, copied verbatim.
    pub extra: BTreeMap<String, FieldValue>,
}

impl Metadata {
    /// Build metadata from decoded frontmatter.
    ///
    /// With `enforce_required` set, every field in `required` plus `written` and
    /// `topics` must be present. Without it, `written` defaults to today and
    /// `topics` to an empty list. Typed optional fields are only read when named
    /// in `optional`; other names in `optional` land in [`Metadata::extra`].
    pub fn from_frontmatter(
        fm: &Frontmatter,
        required: &[String],
        optional: &[String],
        enforce_required: bool,
        default_language: &str,
        path: &Path,
    ) -> Result<Self> {
        if enforce_required {
            fm.require(required, path)?;
            fm.require(&["written".to_string(), "topics".to_string()], path)?;
        }

        let title = fm
            .get("title")
            .and_then(FieldValue::as_text)
            .unwrap_or_else(|| "Untitled".to_string());

        let written = match fm.get("written") {
            Some(value) => parse_written(value, path)?,
            None => Local::now().date_naive(),
        };

        let topics = match fm.get("topics") {
            Some(value) => parse_topics(value, path)?,
            None => Vec::new(),
        };

        let disabled = match fm.get("disabled") {
            Some(value) => parse_flag(value, "disabled", path)?,
            None => false,
        };

        let mut metadata = Self {
            title,
            written,
            topics,
            description: None,
            disabled,
            image: None,
            language: default_language.to_string(),
            external_id: None,
            extra: BTreeMap::new(),
        };

        for field in optional {
            let Some(value) = fm.get(field) else {
                continue;
            };
            match field.as_str() {
                "description" => metadata.description = text_field(value, field, path)?,
                "image" => metadata.image = text_field(value, field, path)?,
                "lang" => {
                    if let Some(lang) = text_field(value, field, path)? {
                        metadata.language = lang;
                    }
                }
                "id" => metadata.external_id = text_field(value, field, path)?,
                "disabled" => {}
                _ => {
                    metadata.extra.insert(field.clone(), value.clone());
                }
            }
        }

        Ok(metadata)
    }
}

/// Read an optional text field; null and empty strings count as absent.
fn text_field(value: &FieldValue, field: &str, path: &Path) -> Result<Option<String>> {
    match value {
        FieldValue::Null => Ok(None),
        other => match other.as_text() {
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => Ok(Some(text.trim().to_string())),
            None => Err(CoreError::parse(
                path,
                format!(
                    "Invalid type for '{field}' field: {}. Expected string.",
                    other.type_name()
                ),
            )),
        },
    }
}

/// One loaded content file and its place in the content graph.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    /// Source file location.
    pub path: PathBuf,
    /// Language-prefixed URL slug, unique across the site.
    pub slug: String,
    /// Path-shaped identifier used by `{% link %}` tags.
    pub reference_slug: String,
    /// Output-relative URL (`content/<slug>.html`).
    pub url: String,
    /// Rendered HTML body; custom tags are still unresolved here.
    pub body_html: String,
    pub metadata: Metadata,
    /// Cross-language grouping key: the explicit `id`, else the file stem.
    pub content_id: String,
    pub previous: Option<RecordId>,
    pub next: Option<RecordId>,
    /// Related records ranked by shared topics.
    pub related: Vec<RecordId>,
    pub alternate_languages: AlternateLanguages,
}

impl ContentRecord {
    /// Create a record for a file found at `relative_path` under its content root.
    pub fn new(path: PathBuf, relative_path: &Path, metadata: Metadata, body_html: String) -> Self {
        let slugs = generate_slugs(
            relative_path,
            metadata.external_id.as_deref(),
            &metadata.language,
        );
        let content_id = metadata.external_id.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Self {
            url: url_for_slug(&slugs.slug),
            slug: slugs.slug,
            reference_slug: slugs.reference_slug,
            path,
            body_html,
            metadata,
            content_id,
            previous: None,
            next: None,
            related: Vec::new(),
            alternate_languages: AlternateLanguages::default(),
        }
    }

    /// Language code of this record.
    pub fn language(&self) -> &str {
        &self.metadata.language
    }

    /// First slug segment when the slug has several segments, else `"general"`.
    pub fn category(&self) -> &str {
        match self.slug.split_once('/') {
            Some((first, _)) => first,
            None => "general",
        }
    }

    /// Clear all graph relationships before they are recomputed.
    pub fn reset_links(&mut self) {
        self.previous = None;
        self.next = None;
        self.related.clear();
        self.alternate_languages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> (Vec<String>, Vec<String>) {
        (
            REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
            OPTIONAL_FIELDS.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn fm(pairs: &[(&str, FieldValue)]) -> Frontmatter {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::String(s.to_string())
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(ContentType::from_extension("md"), Some(ContentType::Markdown));
        assert_eq!(
            ContentType::from_extension("Markdown"),
            Some(ContentType::Markdown)
        );
        assert_eq!(ContentType::from_extension("typ"), None);
        assert_eq!(
            ContentType::from_path(Path::new("a/b.md")),
            Some(ContentType::Markdown)
        );
    }

    #[test]
    fn test_metadata_from_frontmatter() {
        let (required, optional) = defaults();
        let fm = fm(&[
            ("title", text("Hello")),
            ("written", text("2024-03-01")),
            ("topics", text("rust, web")),
            ("lang", text("de")),
            ("id", text("hello")),
            ("description", text("A greeting")),
            ("unlisted", text("ignored")),
        ]);

        let meta =
            Metadata::from_frontmatter(&fm, &required, &optional, true, "en", Path::new("a.md"))
                .expect("metadata");

        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.topics, vec!["rust", "web"]);
        assert_eq!(meta.language, "de");
        assert_eq!(meta.external_id.as_deref(), Some("hello"));
        assert_eq!(meta.description.as_deref(), Some("A greeting"));
        assert!(!meta.disabled);
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_metadata_missing_required_field() {
        let (required, optional) = defaults();
        let fm = fm(&[("title", text("Hello")), ("written", text("2024-03-01"))]);
        let err =
            Metadata::from_frontmatter(&fm, &required, &optional, true, "en", Path::new("a.md"))
                .unwrap_err();
        assert!(err.to_string().contains("topics"));
    }

    #[test]
    fn test_metadata_relaxed_defaults() {
        let (required, optional) = defaults();
        let meta = Metadata::from_frontmatter(
            &Frontmatter::default(),
            &required,
            &optional,
            false,
            "fr",
            Path::new("a.md"),
        )
        .expect("metadata");
        assert_eq!(meta.title, "Untitled");
        assert!(meta.topics.is_empty());
        assert_eq!(meta.language, "fr");
    }

    #[test]
    fn test_metadata_extra_optional_field() {
        let (required, mut optional) = defaults();
        optional.push("series".to_string());
        let fm = fm(&[
            ("title", text("Hello")),
            ("written", text("2024-03-01")),
            ("topics", FieldValue::List(vec![])),
            ("series", text("intro")),
        ]);
        let meta =
            Metadata::from_frontmatter(&fm, &required, &optional, true, "en", Path::new("a.md"))
                .expect("metadata");
        assert_eq!(meta.extra.get("series"), Some(&text("intro")));
    }

    #[test]
    fn test_typed_field_not_in_optional_list_is_ignored() {
        let (required, _) = defaults();
        let fm = fm(&[
            ("title", text("Hello")),
            ("written", text("2024-03-01")),
            ("topics", text("a")),
            ("lang", text("de")),
        ]);
        let meta = Metadata::from_frontmatter(&fm, &required, &[], true, "en", Path::new("a.md"))
            .expect("metadata");
        assert_eq!(meta.language, "en");
    }

    #[test]
    fn test_record_slugs_and_content_id() {
        let (required, optional) = defaults();
        let fm = fm(&[
            ("title", text("Setup")),
            ("written", text("2024-03-01")),
            ("topics", text("guides")),
        ]);
        let meta =
            Metadata::from_frontmatter(&fm, &required, &optional, true, "en", Path::new("x.md"))
                .expect("metadata");
        let record = ContentRecord::new(
            PathBuf::from("content/publish/guides/Initial_Setup.md"),
            Path::new("guides/Initial_Setup.md"),
            meta,
            "<p>hi</p>".into(),
        );

        assert_eq!(record.slug, "en/guides/initial-setup");
        assert_eq!(record.reference_slug, "guides/Initial_Setup");
        assert_eq!(record.url, "content/en/guides/initial-setup.html");
        assert_eq!(record.content_id, "Initial_Setup");
        assert_eq!(record.category(), "en");
    }

    #[test]
    fn test_alternate_languages_upsert() {
        let mut alt = AlternateLanguages::default();
        alt.insert("de", RecordId(1));
        alt.insert("fr", RecordId(2));
        alt.insert("de", RecordId(3));

        assert_eq!(alt.len(), 2);
        assert_eq!(alt.get("de"), Some(RecordId(3)));
        assert_eq!(alt.codes(), vec!["de", "fr"]);
        assert!(!alt.contains_language("en"));
    }
}
