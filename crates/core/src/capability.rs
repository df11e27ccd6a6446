use serde::{Deserialize, Serialize};

use crate::bundle::Bundle;

/// FHIR CapabilityStatement resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    pub resource_type: String,
    pub status: String,
    pub date: String,
    pub kind: String,
    pub fhir_version: String,
    pub format: Vec<String>,
    pub rest: Vec<CapabilityRest>,
}

impl CapabilityStatement {
    /// Describe read-only access to the resource types present in `bundle`
    pub fn for_bundle(bundle: &Bundle) -> Self {
        let resource = bundle
            .resource_types()
            .into_iter()
            .map(CapabilityResource::read_only)
            .collect();

        Self {
            resource_type: "CapabilityStatement".to_string(),
            status: "active".to_string(),
            date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            kind: "instance".to_string(),
            fhir_version: "4.0.1".to_string(), // R4
            format: vec!["json".to_string()],
            rest: vec![CapabilityRest {
                mode: "server".to_string(),
                resource,
            }],
        }
    }
}

/// REST capability declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRest {
    pub mode: String,
    pub resource: Vec<CapabilityResource>,
}

/// Per-resource-type capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub interaction: Vec<CapabilityInteraction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityInteraction {
    pub code: String,
}

impl CapabilityResource {
    fn read_only(resource_type: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            interaction: ["read", "search-type"]
                .into_iter()
                .map(|code| CapabilityInteraction {
                    code: code.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadOptions, parse_bundle};
    use serde_json::json;

    #[test]
    fn test_capability_lists_bundle_types() {
        let document = json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [
                {"fullUrl": "urn:uuid:p1", "resource": {"resourceType": "Patient", "id": "p1"}},
                {"fullUrl": "urn:uuid:i1", "resource": {"resourceType": "Immunization", "id": "i1"}},
                {"fullUrl": "urn:uuid:p2", "resource": {"resourceType": "Patient", "id": "p2"}}
            ]
        });
        let bundle = parse_bundle(&document.to_string(), &LoadOptions::default()).unwrap();

        let json = serde_json::to_value(CapabilityStatement::for_bundle(&bundle)).unwrap();
        assert_eq!(json["resourceType"], "CapabilityStatement");
        assert_eq!(json["fhirVersion"], "4.0.1");

        let resources = json["rest"][0]["resource"].as_array().unwrap();
        let types: Vec<&str> = resources.iter().map(|r| r["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["Patient", "Immunization"]);
        assert_eq!(resources[0]["interaction"][1]["code"], "search-type");
    }
}
