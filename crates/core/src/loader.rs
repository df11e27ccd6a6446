//! Document loader: JSON text to a validated [`Bundle`]
//!
//! Loading runs in two phases. The text is first parsed into a generic
//! `serde_json::Value` (syntax errors become [`BundleError::MalformedInput`]);
//! the value is then checked to be a Bundle and its entries decoded one by
//! one (shape errors become [`BundleError::SchemaMismatch`]).

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::bundle::{Bundle, Entry};
use crate::error::{BundleError, Result};
use crate::extension::Extension;
use crate::resource::Resource;

/// What to do with an extension or `value[x]` that populates several value slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValuePolicy {
    /// Reject the document
    #[default]
    Strict,
    /// Keep the first slot in document order
    FirstPopulated,
}

/// What to do with an entry whose resource lacks `resourceType` or `id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPolicy {
    /// Fail the whole load
    #[default]
    Reject,
    /// Drop the entry and log a warning
    Skip,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind} policy '{value}'")]
pub struct PolicyParseError {
    kind: &'static str,
    value: String,
}

impl FromStr for ValuePolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ValuePolicy::Strict),
            "first-populated" | "first" => Ok(ValuePolicy::FirstPopulated),
            _ => Err(PolicyParseError {
                kind: "extension value",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePolicy::Strict => f.write_str("strict"),
            ValuePolicy::FirstPopulated => f.write_str("first-populated"),
        }
    }
}

impl FromStr for EntryPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(EntryPolicy::Reject),
            "skip" => Ok(EntryPolicy::Skip),
            _ => Err(PolicyParseError {
                kind: "invalid entry",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EntryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPolicy::Reject => f.write_str("reject"),
            EntryPolicy::Skip => f.write_str("skip"),
        }
    }
}

/// Validation choices for a load call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    pub extension_values: ValuePolicy,
    pub invalid_entries: EntryPolicy,
}

/// Top-level Bundle properties; entries stay raw so each one can be
/// decoded and reported with its index.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleShell {
    #[serde(rename = "type")]
    bundle_type: String,

    id: Option<String>,

    timestamp: Option<String>,

    total: Option<u32>,

    #[serde(default)]
    entry: Vec<Value>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Read a bundle file and decode it
///
/// The file is read in one call; the handle is closed before parsing starts.
pub fn load_bundle_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Bundle> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read bundle file");

    let value: Value = serde_json::from_slice(&bytes).map_err(BundleError::MalformedInput)?;
    decode_bundle(value, options)
}

/// Parse JSON text and decode it as a bundle
pub fn parse_bundle(text: &str, options: &LoadOptions) -> Result<Bundle> {
    let value: Value = serde_json::from_str(text).map_err(BundleError::MalformedInput)?;
    decode_bundle(value, options)
}

/// Decode an already-parsed JSON document as a bundle
pub fn decode_bundle(value: Value, options: &LoadOptions) -> Result<Bundle> {
    let Value::Object(mut document) = value else {
        return Err(BundleError::schema("top-level JSON value is not an object"));
    };

    match document.shift_remove("resourceType") {
        Some(Value::String(t)) if t == "Bundle" => {}
        Some(Value::String(t)) => {
            return Err(BundleError::schema(format!(
                "expected resourceType 'Bundle', found '{t}'"
            )));
        }
        Some(_) => return Err(BundleError::schema("resourceType must be a string")),
        None => return Err(BundleError::schema("missing resourceType")),
    }

    let shell: BundleShell = serde_json::from_value(Value::Object(document))
        .map_err(|e| BundleError::schema(format!("invalid Bundle: {e}")))?;

    let mut entries = Vec::with_capacity(shell.entry.len());
    for (index, raw) in shell.entry.into_iter().enumerate() {
        if let Some(problem) = identity_problem(&raw) {
            match options.invalid_entries {
                EntryPolicy::Reject => {
                    return Err(BundleError::schema(format!("entry[{index}]: {problem}")));
                }
                EntryPolicy::Skip => {
                    tracing::warn!(index, problem = %problem, "Skipping bundle entry");
                    continue;
                }
            }
        }

        let entry: Entry = serde_json::from_value(raw)
            .map_err(|e| BundleError::schema(format!("entry[{index}]: {e}")))?;

        if options.extension_values == ValuePolicy::Strict {
            if let Some(problem) = ambiguous_value(&entry.resource) {
                return Err(BundleError::schema(format!(
                    "entry[{index}] {}/{}: {problem}",
                    entry.resource.resource_type(),
                    entry.resource.id()
                )));
            }
        }

        entries.push(entry);
    }

    let bundle = Bundle::from_parts(
        shell.bundle_type,
        shell.id,
        shell.timestamp,
        shell.total,
        entries,
        shell.extra,
    );

    tracing::info!(
        bundle_type = bundle.bundle_type(),
        entries = bundle.len(),
        resource_types = ?bundle.resource_types(),
        "Loaded bundle"
    );

    Ok(bundle)
}

/// Why an entry's resource lacks the identity every resource must carry
///
/// A missing or non-object `resource` is left to entry decoding, which
/// always rejects it.
fn identity_problem(raw: &Value) -> Option<String> {
    let resource = raw.get("resource").filter(|r| r.is_object())?;

    match resource.get("resourceType") {
        Some(Value::String(t)) if !t.is_empty() => {}
        _ => return Some("resource is missing a non-empty resourceType".to_string()),
    }

    match resource.get("id") {
        Some(Value::String(_)) => None,
        _ => Some("resource is missing a string id".to_string()),
    }
}

/// First place where a typed resource populates more than one value slot
fn ambiguous_value(resource: &Resource) -> Option<String> {
    if let Resource::Observation(o) = resource {
        if o.max_value_slots() > 1 {
            return Some("more than one value[x] populated".to_string());
        }
    }

    resource
        .extensions()
        .into_iter()
        .find_map(Extension::find_ambiguous)
        .map(|ext| {
            let slots: Vec<String> = ext
                .value
                .iter()
                .map(|v| v.slot_name())
                .chain(ext.ambiguous_slots().into_iter().map(str::to_string))
                .collect();
            format!(
                "extension '{}' populates several value slots ({})",
                ext.url,
                slots.join(", ")
            )
        })
}
