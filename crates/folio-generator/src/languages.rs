//! Cross-language linking.

use std::collections::{BTreeSet, HashMap};

use folio_core::{ContentRecord, RecordId};
use tracing::debug;

/// Group records by content id and cross-link each multi-member group.
///
/// Every member of a group with more than one record gets an
/// `alternate_languages` entry for every other member, keyed by that member's
/// language. Groups are visited in canonical order. Returns the number of
/// linked groups.
pub fn link_alternate_languages(records: &mut [ContentRecord]) -> usize {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<RecordId>> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        if record.content_id.is_empty() {
            continue;
        }
        let members = groups.entry(record.content_id.as_str()).or_default();
        if members.is_empty() {
            order.push(record.content_id.as_str());
        }
        members.push(RecordId(index));
    }

    let mut links: Vec<(RecordId, String, RecordId)> = Vec::new();
    let mut linked = 0;
    for id in &order {
        let members = &groups[id];
        if members.len() < 2 {
            continue;
        }
        linked += 1;
        for &member in members {
            for &other in members.iter().filter(|&&other| other != member) {
                links.push((member, records[other.index()].language().to_string(), other));
            }
        }
    }

    for (member, lang, other) in links {
        records[member.index()].alternate_languages.insert(lang, other);
    }

    debug!(groups = linked, "linked alternate languages");
    linked
}

/// Sorted set of languages used by the records.
pub fn collect_languages(records: &[ContentRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.language().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::localized;

    #[test]
    fn test_links_are_symmetric() {
        let mut records = vec![
            localized("en/hello.md", "Hello", "2024-01-02", &[], "en", Some("hello")),
            localized("de/hallo.md", "Hallo", "2024-01-01", &[], "de", Some("hello")),
            localized("fr/bonjour.md", "Bonjour", "2024-01-01", &[], "fr", Some("hello")),
            localized("en/other.md", "Other", "2023-01-01", &[], "en", None),
        ];

        assert_eq!(link_alternate_languages(&mut records), 1);

        assert_eq!(records[0].alternate_languages.codes(), vec!["de", "fr"]);
        assert_eq!(records[1].alternate_languages.codes(), vec!["en", "fr"]);
        assert_eq!(records[2].alternate_languages.get("en"), Some(RecordId(0)));
        assert!(records[3].alternate_languages.is_empty());

        for (i, record) in records.iter().enumerate() {
            for (_, other) in record.alternate_languages.iter() {
                assert_ne!(other, RecordId(i));
                assert!(
                    records[other.index()]
                        .alternate_languages
                        .iter()
                        .any(|(_, back)| back == RecordId(i))
                );
            }
        }
    }

    #[test]
    fn test_singletons_get_no_entries() {
        let mut records = vec![
            localized("a.md", "A", "2024-01-02", &[], "en", None),
            localized("b.md", "B", "2024-01-01", &[], "de", None),
        ];

        assert_eq!(link_alternate_languages(&mut records), 0);
        assert!(records.iter().all(|r| r.alternate_languages.is_empty()));
    }

    #[test]
    fn test_collect_languages_sorted_unique() {
        let records = vec![
            localized("a.md", "A", "2024-01-03", &[], "fr", None),
            localized("b.md", "B", "2024-01-02", &[], "de", None),
            localized("c.md", "C", "2024-01-01", &[], "fr", None),
        ];

        assert_eq!(collect_languages(&records), vec!["de", "fr"]);
    }
}
