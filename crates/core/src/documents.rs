//! Plain-text documents for downstream indexers
//!
//! Each selected resource becomes one [`TextDocument`] whose `text` is the
//! resource's compact JSON. What an indexer does with the text is outside
//! this crate.

use serde::Serialize;

use crate::bundle::Bundle;

/// Resource types handed to an indexer when the caller does not choose
pub const INDEXED_RESOURCE_TYPES: [&str; 4] = ["Patient", "Observation", "Condition", "Encounter"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocument {
    /// Sequential id starting at "1"
    pub id: String,
    pub resource_type: String,
    pub resource_id: String,
    pub summary: String,
    pub text: String,
}

/// Collect resources of the requested types, grouped by type in the order
/// given and by entry order within a type, and render each as a document.
pub fn index_documents<S: AsRef<str>>(
    bundle: &Bundle,
    resource_types: &[S],
) -> serde_json::Result<Vec<TextDocument>> {
    let mut documents = Vec::new();

    for resource_type in resource_types {
        for resource in bundle.resources_of_type(resource_type.as_ref()) {
            documents.push(TextDocument {
                id: (documents.len() + 1).to_string(),
                resource_type: resource.resource_type().to_string(),
                resource_id: resource.id().to_string(),
                summary: resource.summary_line(),
                text: serde_json::to_string(resource)?,
            });
        }
    }

    tracing::debug!(documents = documents.len(), "Rendered index documents");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadOptions, parse_bundle};
    use serde_json::json;

    fn bundle() -> Bundle {
        let document = json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [
                {"fullUrl": "urn:uuid:e1", "resource": {"resourceType": "Encounter", "id": "e1"}},
                {"fullUrl": "urn:uuid:o1", "resource": {"resourceType": "Observation", "id": "o1"}},
                {"fullUrl": "urn:uuid:p1", "resource": {"resourceType": "Patient", "id": "p1", "gender": "male"}},
                {"fullUrl": "urn:uuid:x1", "resource": {"resourceType": "Claim", "id": "x1"}},
                {"fullUrl": "urn:uuid:o2", "resource": {"resourceType": "Observation", "id": "o2"}}
            ]
        });
        parse_bundle(&document.to_string(), &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_documents_follow_requested_type_order() {
        let documents = index_documents(&bundle(), &INDEXED_RESOURCE_TYPES).unwrap();

        let order: Vec<(&str, &str)> = documents
            .iter()
            .map(|d| (d.id.as_str(), d.resource_id.as_str()))
            .collect();
        assert_eq!(order, vec![("1", "p1"), ("2", "o1"), ("3", "o2"), ("4", "e1")]);
    }

    #[test]
    fn test_document_text_is_resource_json() {
        let documents = index_documents(&bundle(), &["Patient"]).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(
            documents[0].text,
            r#"{"resourceType":"Patient","id":"p1","gender":"male"}"#
        );
        assert_eq!(documents[0].summary, "Patient/p1 (male)");
    }

    #[test]
    fn test_unselected_and_unknown_types() {
        let bundle = bundle();
        assert!(index_documents(&bundle, &["Immunization"]).unwrap().is_empty());

        let claims = index_documents(&bundle, &["Claim".to_string()]).unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].resource_type, "Claim");

        let none: [&str; 0] = [];
        assert!(index_documents(&bundle, &none).unwrap().is_empty());
    }
}
