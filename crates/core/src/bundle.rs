use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::Result;
use crate::filter;
use crate::loader::{self, LoadOptions};
use crate::resource::{Condition, Encounter, Observation, Patient, Resource};

/// FHIR Bundle: an ordered container of clinical records
///
/// Built once by the loader (or by [`Bundle::searchset`] for query results)
/// and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(rename = "type")]
    bundle_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u32>,

    #[serde(rename = "entry", skip_serializing_if = "Vec::is_empty")]
    entries: Vec<Entry>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Bundle entry wrapping exactly one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub full_url: String,

    pub resource: Resource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Map<String, Value>>,

    /// `search`, `response` and any other entry property
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    pub fn new(full_url: impl Into<String>, resource: Resource) -> Self {
        Self {
            full_url: full_url.into(),
            resource,
            request: None,
            extra: Map::new(),
        }
    }
}

impl Bundle {
    pub(crate) fn from_parts(
        bundle_type: String,
        id: Option<String>,
        timestamp: Option<String>,
        total: Option<u32>,
        entries: Vec<Entry>,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            id,
            bundle_type,
            timestamp,
            total,
            entries,
            extra,
        }
    }

    /// Create a search result bundle
    pub fn searchset(entries: Vec<Entry>) -> Self {
        let total = u32::try_from(entries.len()).ok();
        Self::from_parts("searchset".to_string(), None, None, total, entries, Map::new())
    }

    /// Parse a bundle from JSON text with default [`LoadOptions`]
    pub fn from_json_str(text: &str) -> Result<Self> {
        loader::parse_bundle(text, &LoadOptions::default())
    }

    /// Read and parse a bundle file with default [`LoadOptions`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        loader::load_bundle_file(path, &LoadOptions::default())
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The `type` tag, e.g. `collection`
    pub fn bundle_type(&self) -> &str {
        &self.bundle_type
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn total(&self) -> Option<u32> {
        self.total
    }

    /// Entries in source order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Top-level properties without a dedicated field
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct resource types in first-occurrence order
    pub fn resource_types(&self) -> Vec<&str> {
        filter::resource_types(&self.entries)
    }

    /// Entry count per resource type, in first-occurrence order
    pub fn count_by_type(&self) -> Vec<(&str, usize)> {
        filter::count_by_type(&self.entries)
    }

    /// Resources whose `resourceType` equals `resource_type` exactly
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&Resource> {
        filter::resources_of_type(&self.entries, resource_type)
    }

    pub fn entries_of_type(&self, resource_type: &str) -> Vec<&Entry> {
        filter::entries_of_type(&self.entries, resource_type)
    }

    pub fn find_resource(&self, resource_type: &str, id: &str) -> Option<&Resource> {
        filter::find_resource(&self.entries, resource_type, id)
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.entries.iter().filter_map(|e| e.resource.as_patient())
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.entries.iter().filter_map(|e| e.resource.as_observation())
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.entries.iter().filter_map(|e| e.resource.as_condition())
    }

    pub fn encounters(&self) -> impl Iterator<Item = &Encounter> {
        self.entries.iter().filter_map(|e| e.resource.as_encounter())
    }
}
