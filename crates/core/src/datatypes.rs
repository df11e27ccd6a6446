//! FHIR complex datatypes shared by the typed resources
//!
//! Unknown properties on these types are ignored; resources keep their own
//! unrecognised properties.

use serde::{Deserialize, Deserializer, Serialize};

use crate::extension::Extension;

/// Coding - a code defined by a terminology system
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Concept with optional text and any number of codings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Best human-readable label: `text`, then the first coding display, then the first code
    pub fn display_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or_else(|| self.coding.iter().find_map(|c| c.display.as_deref()))
            .or_else(|| self.coding.iter().find_map(|c| c.code.as_deref()))
    }

    /// Whether any coding carries `system`/`code`
    pub fn has_code(&self, system: &str, code: &str) -> bool {
        self.coding
            .iter()
            .any(|c| c.system.as_deref() == Some(system) && c.code.as_deref() == Some(code))
    }
}

/// A status that older bundles write as a bare code and newer ones as a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodedValue {
    Code(String),
    Concept(CodeableConcept),
}

impl CodedValue {
    pub fn code(&self) -> Option<&str> {
        match self {
            CodedValue::Code(code) => Some(code),
            CodedValue::Concept(concept) => concept.coding.iter().find_map(|c| c.code.as_deref()),
        }
    }
}

/// Business identifier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Contact point (phone, email, etc.)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>, // phone | fax | email | pager | url | sms | other

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>, // home | work | temp | old | mobile

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

/// Human name
///
/// `given`, `prefix` and `suffix` accept either a single string or a list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanName {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub given: Vec<String>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub prefix: Vec<String>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub suffix: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl HumanName {
    /// `text` when present, otherwise given names followed by the family name
    pub fn display(&self) -> Option<String> {
        if let Some(text) = &self.text {
            return Some(text.clone());
        }

        let parts: Vec<&str> = self
            .given
            .iter()
            .map(String::as_str)
            .chain(self.family.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Postal address
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Human-readable narrative
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub div: Option<String>,
}

/// Reference to another resource, usually `urn:uuid:...` inside a bundle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Measured amount
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Quantity {
    pub fn display(&self) -> Option<String> {
        let value = self.value?;
        let comparator = self.comparator.as_deref().unwrap_or("");
        Some(match self.unit.as_deref().or(self.code.as_deref()) {
            Some(unit) => format!("{comparator}{value} {unit}"),
            None => format!("{comparator}{value}"),
        })
    }
}

/// Patient contact party (guardian, emergency contact, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContact {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationship: Vec<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<HumanName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Language the patient can communicate in
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Communication {
    pub language: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_human_name_accepts_string_or_list() {
        let single: HumanName =
            serde_json::from_value(json!({"family": "Doe", "given": "Jane", "prefix": "Mrs."}))
                .unwrap();
        assert_eq!(single.given, vec!["Jane"]);
        assert_eq!(single.prefix, vec!["Mrs."]);

        let many: HumanName =
            serde_json::from_value(json!({"family": "Doe", "given": ["Jane", "Q"]})).unwrap();
        assert_eq!(many.given, vec!["Jane", "Q"]);
        assert!(many.prefix.is_empty());
    }

    #[test]
    fn test_human_name_display() {
        let name: HumanName =
            serde_json::from_value(json!({"family": "Doe", "given": ["Jane", "Q"]})).unwrap();
        assert_eq!(name.display().as_deref(), Some("Jane Q Doe"));

        let text: HumanName =
            serde_json::from_value(json!({"text": "Dr. J. Doe", "family": "Doe"})).unwrap();
        assert_eq!(text.display().as_deref(), Some("Dr. J. Doe"));

        assert_eq!(HumanName::default().display(), None);
    }

    #[test]
    fn test_codeable_concept_display_text() {
        let concept: CodeableConcept = serde_json::from_value(json!({
            "coding": [{"system": "http://loinc.org", "code": "8302-2", "display": "Body Height"}]
        }))
        .unwrap();
        assert_eq!(concept.display_text(), Some("Body Height"));
        assert!(concept.has_code("http://loinc.org", "8302-2"));
        assert!(!concept.has_code("http://snomed.info/sct", "8302-2"));

        let code_only: CodeableConcept =
            serde_json::from_value(json!({"coding": [{"code": "M"}]})).unwrap();
        assert_eq!(code_only.display_text(), Some("M"));
    }

    #[test]
    fn test_coded_value_accepts_code_or_concept() {
        let code: CodedValue = serde_json::from_value(json!("active")).unwrap();
        assert_eq!(code.code(), Some("active"));

        let concept: CodedValue = serde_json::from_value(json!({
            "coding": [{"system": "http://terminology.hl7.org/CodeSystem/condition-clinical", "code": "resolved"}]
        }))
        .unwrap();
        assert_eq!(concept.code(), Some("resolved"));
    }

    #[test]
    fn test_quantity_display() {
        let quantity: Quantity =
            serde_json::from_value(json!({"value": 72.5, "unit": "kg", "code": "kg"})).unwrap();
        assert_eq!(quantity.display().as_deref(), Some("72.5 kg"));

        let bare: Quantity = serde_json::from_value(json!({"value": 3})).unwrap();
        assert_eq!(bare.display().as_deref(), Some("3"));

        assert_eq!(Quantity::default().display(), None);
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let address = Address {
            city: Some("Boston".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json, json!({"city": "Boston"}));
    }
}
