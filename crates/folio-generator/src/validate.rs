//! Duplicate detection across loaded content.

use std::{collections::HashMap, path::Path};

use folio_core::{BuildResult, ContentRecord};
use tracing::warn;

/// Check the record set for duplicate slugs and titles.
///
/// A duplicate slug is an error; a duplicate title only a warning. Each record
/// is compared against the first record that claimed the slug or title.
/// Returns `false` when any slug collides. Later stages must still cope with
/// the colliding records.
pub fn validate_content(records: &[ContentRecord], result: &mut BuildResult) -> bool {
    let mut valid = true;
    let mut slugs: HashMap<&str, &Path> = HashMap::new();
    let mut titles: HashMap<&str, &Path> = HashMap::new();

    for record in records {
        match slugs.get(record.slug.as_str()) {
            Some(previous) => {
                warn!(slug = %record.slug, "duplicate slug");
                result.add_error(format!(
                    "Duplicate slug '{}' in {} and {}",
                    record.slug,
                    record.path.display(),
                    previous.display()
                ));
                valid = false;
            }
            None => {
                slugs.insert(&record.slug, &record.path);
            }
        }

        let title = record.metadata.title.as_str();
        match titles.get(title) {
            Some(previous) => {
                result.add_warning(format!(
                    "Duplicate title '{title}' in {} and {}",
                    record.path.display(),
                    previous.display()
                ));
            }
            None => {
                titles.insert(title, &record.path);
            }
        }
    }

    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[test]
    fn test_unique_content_is_valid() {
        let records = vec![
            record("a.md", "A", "2024-01-02", &["x"]),
            record("b.md", "B", "2024-01-01", &["x"]),
        ];
        let mut result = BuildResult::new();

        assert!(validate_content(&records, &mut result));
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_slug_is_error() {
        let records = vec![
            record("Hello World.md", "One", "2024-01-02", &[]),
            record("hello_world.md", "Two", "2024-01-01", &[]),
        ];
        let mut result = BuildResult::new();

        assert!(!validate_content(&records, &mut result));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0],
            "Duplicate slug 'en/hello-world' in hello_world.md and Hello World.md"
        );
        assert!(!result.success);
    }

    #[test]
    fn test_one_error_per_duplicate_pair() {
        let records = vec![
            record("a.md", "One", "2024-01-03", &[]),
            record("A.md", "Two", "2024-01-02", &[]),
            record("b.md", "Three", "2024-01-01", &[]),
            record("B.md", "Four", "2024-01-01", &[]),
        ];
        let mut result = BuildResult::new();

        assert!(!validate_content(&records, &mut result));
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_duplicate_title_is_warning() {
        let records = vec![
            record("a.md", "Same", "2024-01-02", &[]),
            record("b.md", "Same", "2024-01-01", &[]),
        ];
        let mut result = BuildResult::new();

        assert!(validate_content(&records, &mut result));
        assert_eq!(
            result.warnings,
            vec!["Duplicate title 'Same' in b.md and a.md"]
        );
        assert!(result.success);
    }

    #[test]
    fn test_untitled_records_share_title() {
        let mut first = record("a.md", "x", "2024-01-02", &[]);
        first.metadata.title = "Untitled".into();
        let mut second = record("b.md", "x", "2024-01-01", &[]);
        second.metadata.title = "Untitled".into();

        let mut result = BuildResult::new();
        assert!(validate_content(&[first, second], &mut result));
        assert_eq!(result.warnings.len(), 1);
    }
}
