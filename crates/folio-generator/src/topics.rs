//! Topic index.

use std::collections::HashMap;

use folio_core::{ContentRecord, RecordId};

/// Mapping from topic name to the records tagged with it.
///
/// Topics keep the order in which they were first seen and each topic lists its
/// records in canonical (newest first) order.
#[derive(Debug, Clone, Default)]
pub struct TopicIndex {
    topics: Vec<(String, Vec<RecordId>)>,
    positions: HashMap<String, usize>,
}

impl TopicIndex {
    /// Build the index in one pass over the records.
    pub fn build(records: &[ContentRecord]) -> Self {
        let mut index = Self::default();
        for (i, record) in records.iter().enumerate() {
            for topic in &record.metadata.topics {
                index.add(topic, RecordId(i));
            }
        }
        index
    }

    /// Append a record to a topic, creating the topic if needed.
    pub fn add(&mut self, topic: &str, id: RecordId) {
        match self.positions.get(topic) {
            Some(&pos) => self.topics[pos].1.push(id),
            None => {
                self.positions.insert(topic.to_string(), self.topics.len());
                self.topics.push((topic.to_string(), vec![id]));
            }
        }
    }

    /// Records tagged with `topic`; empty for unknown topics.
    pub fn get(&self, topic: &str) -> &[RecordId] {
        self.positions
            .get(topic)
            .map(|&pos| self.topics[pos].1.as_slice())
            .unwrap_or_default()
    }

    /// Iterate topics with their records.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RecordId])> {
        self.topics
            .iter()
            .map(|(topic, ids)| (topic.as_str(), ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[test]
    fn test_build_preserves_order() {
        let records = vec![
            record("a.md", "A", "2024-01-03", &["rust", "web"]),
            record("b.md", "B", "2024-01-02", &["web"]),
            record("c.md", "C", "2024-01-01", &["rust"]),
        ];

        let index = TopicIndex::build(&records);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("rust"), &[RecordId(0), RecordId(2)]);
        assert_eq!(index.get("web"), &[RecordId(0), RecordId(1)]);
        assert!(index.get("python").is_empty());

        let names: Vec<_> = index.iter().map(|(t, _)| t).collect();
        assert_eq!(names, vec!["rust", "web"]);
    }

    #[test]
    fn test_empty_index() {
        let index = TopicIndex::build(&[]);
        assert!(index.is_empty());
    }
}
