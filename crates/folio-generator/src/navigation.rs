//! Chronological navigation and topic-based related content.

use std::collections::HashMap;

use folio_core::{ContentRecord, RecordId};
use tracing::debug;

use crate::topics::TopicIndex;

/// Scan direction through the canonical (newest first) record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the list (newer records).
    Previous,
    /// Towards the end of the list (older records).
    Next,
}

/// Find the previous or next record for `records[current]`.
///
/// Records sharing the current content id are skipped. The first other record
/// found decides the target:
/// 1. it is used directly if it is in the current language,
/// 2. else its variant in the current language, if any,
/// 3. else, for a non-default current language, its variant in the default
///    language, if any,
/// 4. else the record itself.
///
/// The scan never continues past that first record.
pub fn find_navigation_target(
    records: &[ContentRecord],
    current: usize,
    direction: Direction,
    default_language: &str,
) -> Option<RecordId> {
    let record = records.get(current)?;
    let lang = record.language();

    let mut candidates: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::Previous => Box::new((0..current).rev()),
        Direction::Next => Box::new(current + 1..records.len()),
    };

    let index = candidates.find(|&i| records[i].content_id != record.content_id)?;
    let candidate = &records[index];

    if candidate.language() == lang {
        return Some(RecordId(index));
    }
    if let Some(alternate) = candidate.alternate_languages.get(lang) {
        return Some(alternate);
    }
    if lang != default_language
        && let Some(alternate) = candidate.alternate_languages.get(default_language)
    {
        return Some(alternate);
    }
    Some(RecordId(index))
}

/// Rank other records by the number of topics shared with `records[current]`.
///
/// The record itself and records with the same content id are excluded.
/// Records with equal counts keep the order in which they were first met while
/// walking the record's topics.
pub fn compute_related(
    records: &[ContentRecord],
    topics: &TopicIndex,
    current: usize,
) -> Vec<RecordId> {
    let Some(record) = records.get(current) else {
        return Vec::new();
    };

    let mut tally: Vec<(RecordId, usize)> = Vec::new();
    let mut positions: HashMap<RecordId, usize> = HashMap::new();

    for topic in &record.metadata.topics {
        for &id in topics.get(topic) {
            if id.index() == current || records[id.index()].content_id == record.content_id {
                continue;
            }
            match positions.get(&id) {
                Some(&pos) => tally[pos].1 += 1,
                None => {
                    positions.insert(id, tally.len());
                    tally.push((id, 1));
                }
            }
        }
    }

    // Stable: equal counts stay in first-encounter order.
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally.into_iter().map(|(id, _)| id).collect()
}

/// Fill `previous`, `next` and `related` for every record.
///
/// Requires the full, sorted and language-linked record set.
pub fn compute_navigation(
    records: &mut [ContentRecord],
    topics: &TopicIndex,
    default_language: &str,
) {
    let computed: Vec<_> = (0..records.len())
        .map(|i| {
            (
                find_navigation_target(records, i, Direction::Previous, default_language),
                find_navigation_target(records, i, Direction::Next, default_language),
                compute_related(records, topics, i),
            )
        })
        .collect();

    for (record, (previous, next, related)) in records.iter_mut().zip(computed) {
        record.previous = previous;
        record.next = next;
        record.related = related;
    }

    debug!(count = records.len(), "computed navigation and related content");
}
