//! Content index document (`content/index.json`).

use folio_core::{ContentRecord, frontmatter::ISO_DATE_FORMAT};
use serde::Serialize;

/// One article in the content index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub slug: String,
    pub title: String,
    /// Empty when the article has no description.
    pub description: String,
    /// ISO-8601 calendar date.
    pub written: String,
    pub topics: Vec<String>,
    pub url: String,
    pub category: String,
    pub lang: String,
    pub content_id: String,
    /// Codes of the article's other language variants.
    pub alternate_languages: Vec<String>,
}

impl From<&ContentRecord> for IndexEntry {
    fn from(record: &ContentRecord) -> Self {
        let meta = &record.metadata;
        Self {
            slug: record.slug.clone(),
            title: meta.title.clone(),
            description: meta.description.clone().unwrap_or_default(),
            written: meta.written.format(ISO_DATE_FORMAT).to_string(),
            topics: meta.topics.clone(),
            url: record.url.clone(),
            category: record.category().to_string(),
            lang: record.language().to_string(),
            content_id: record.content_id.clone(),
            alternate_languages: record.alternate_languages.codes(),
        }
    }
}

/// Index entries in canonical order.
pub fn build_index(records: &[ContentRecord]) -> Vec<IndexEntry> {
    records.iter().map(IndexEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        languages::link_alternate_languages,
        testing::{localized, record},
    };

    #[test]
    fn test_entry_fields() {
        let mut first = record("guides/setup.md", "Setup", "2024-02-29", &["rust", "tools"]);
        first.metadata.description = Some("How to set up".to_string());

        let entry = IndexEntry::from(&first);

        assert_eq!(entry.slug, "en/guides/setup");
        assert_eq!(entry.written, "2024-02-29");
        assert_eq!(entry.url, "content/en/guides/setup.html");
        assert_eq!(entry.category, "en");
        assert_eq!(entry.description, "How to set up");
        assert_eq!(entry.content_id, "setup");
    }

    #[test]
    fn test_serialized_shape() {
        let mut records = vec![
            localized("hello.md", "Hello", "2024-01-02", &["greeting"], "en", Some("hello")),
            localized("hallo.md", "Hallo", "2024-01-01", &[], "de", Some("hello")),
        ];
        link_alternate_languages(&mut records);

        let json = serde_json::to_value(build_index(&records)).expect("serialize");

        assert_eq!(
            json[0],
            serde_json::json!({
                "slug": "en/hello",
                "title": "Hello",
                "description": "",
                "written": "2024-01-02",
                "topics": ["greeting"],
                "url": "content/en/hello.html",
                "category": "en",
                "lang": "en",
                "content_id": "hello",
                "alternate_languages": ["de"],
            })
        );
        assert_eq!(json[1]["alternate_languages"], serde_json::json!(["en"]));
    }
}
