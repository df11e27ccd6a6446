//! Read-only queries over bundle entries
//!
//! Matching on `resourceType` is exact and case-sensitive. A type that does
//! not occur yields an empty result, never an error.

use std::collections::{HashMap, HashSet};

use crate::bundle::Entry;
use crate::resource::Resource;

/// Distinct resource types in order of first appearance
pub fn resource_types(entries: &[Entry]) -> Vec<&str> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .map(|e| e.resource.resource_type())
        .filter(|t| seen.insert(*t))
        .collect()
}

/// Entry count per resource type, in order of first appearance
pub fn count_by_type(entries: &[Entry]) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let resource_type = entry.resource.resource_type();
        match index.get(resource_type) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(resource_type, counts.len());
                counts.push((resource_type, 1));
            }
        }
    }

    counts
}

/// Entries whose resource has the given type, in entry order
pub fn entries_of_type<'a>(entries: &'a [Entry], resource_type: &str) -> Vec<&'a Entry> {
    entries
        .iter()
        .filter(|e| e.resource.resource_type() == resource_type)
        .collect()
}

/// Resources (not entries) with the given type, in entry order
pub fn resources_of_type<'a>(entries: &'a [Entry], resource_type: &str) -> Vec<&'a Resource> {
    entries
        .iter()
        .map(|e| &e.resource)
        .filter(|r| r.resource_type() == resource_type)
        .collect()
}

/// First resource with the given type and id
pub fn find_resource<'a>(
    entries: &'a [Entry],
    resource_type: &str,
    id: &str,
) -> Option<&'a Resource> {
    entries
        .iter()
        .map(|e| &e.resource)
        .find(|r| r.resource_type() == resource_type && r.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(resource_type: &str, id: &str) -> Entry {
        let resource =
            Resource::from_json(json!({"resourceType": resource_type, "id": id})).unwrap();
        Entry::new(format!("urn:uuid:{id}"), resource)
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("Patient", "p1"),
            entry("Observation", "o1"),
            entry("Observation", "o2"),
        ]
    }

    #[test]
    fn test_resource_types_first_occurrence_order() {
        let entries = sample();
        assert_eq!(resource_types(&entries), vec!["Patient", "Observation"]);

        let entries = vec![
            entry("Observation", "o1"),
            entry("Patient", "p1"),
            entry("Observation", "o2"),
            entry("Condition", "c1"),
            entry("Patient", "p2"),
        ];
        assert_eq!(
            resource_types(&entries),
            vec!["Observation", "Patient", "Condition"]
        );
    }

    #[test]
    fn test_resources_of_type_preserves_order() {
        let entries = sample();
        let observations = resources_of_type(&entries, "Observation");
        let ids: Vec<&str> = observations.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
    }

    #[test]
    fn test_missing_type_yields_empty() {
        let entries = sample();
        assert!(resources_of_type(&entries, "Condition").is_empty());
        assert!(resources_of_type(&entries, "SomethingNew").is_empty());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let entries = sample();
        assert!(resources_of_type(&entries, "patient").is_empty());
        assert!(resources_of_type(&entries, "Patient ").is_empty());
        assert_eq!(resources_of_type(&entries, "Patient").len(), 1);
    }

    #[test]
    fn test_empty_entries() {
        let entries: Vec<Entry> = Vec::new();
        assert!(resource_types(&entries).is_empty());
        assert!(count_by_type(&entries).is_empty());
        assert!(resources_of_type(&entries, "Patient").is_empty());
        assert!(find_resource(&entries, "Patient", "p1").is_none());
    }

    #[test]
    fn test_count_by_type() {
        let mut entries = sample();
        entries.push(entry("Patient", "p2"));
        entries.push(entry("Procedure", "x1"));
        assert_eq!(
            count_by_type(&entries),
            vec![("Patient", 2), ("Observation", 2), ("Procedure", 1)]
        );
    }

    #[test]
    fn test_entries_of_type_keeps_full_url() {
        let entries = sample();
        let urls: Vec<&str> = entries_of_type(&entries, "Observation")
            .iter()
            .map(|e| e.full_url.as_str())
            .collect();
        assert_eq!(urls, vec!["urn:uuid:o1", "urn:uuid:o2"]);
    }

    #[test]
    fn test_find_resource() {
        let entries = sample();
        assert_eq!(
            find_resource(&entries, "Observation", "o2").map(|r| r.id()),
            Some("o2")
        );
        assert!(find_resource(&entries, "Patient", "o2").is_none());
    }
}
