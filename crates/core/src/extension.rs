//! FHIR extensions and choice-typed `value[x]` slots

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datatypes::{Address, Coding};

const VALUE_PREFIX: &str = "value";

/// Whether `key` names a choice-typed value slot such as `valueString`
pub(crate) fn is_value_slot(key: &str) -> bool {
    key.strip_prefix(VALUE_PREFIX)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Value slots of an object, in document order
pub(crate) fn value_slots(map: &Map<String, Value>) -> impl Iterator<Item = (&str, &Value)> {
    map.iter()
        .filter(|(key, _)| is_value_slot(key))
        .map(|(key, value)| (&key[VALUE_PREFIX.len()..], value))
}

/// FHIR Extension
///
/// Holds at most one typed value. When the source populates several `value*`
/// slots the first one in document order becomes `value` and the others are
/// kept untouched in `extra`; strict loading rejects such extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub url: String,
    pub value: Option<ExtensionValue>,
    pub extension: Vec<Extension>,
    pub extra: Map<String, Value>,
}

/// Typed payload of an extension
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionValue {
    Coding(Coding),
    String(String),
    Code(String),
    Address(Address),
    Decimal(f64),
    /// Any other `value*` slot, e.g. `valueBoolean`
    Other { type_name: String, value: Value },
}

impl ExtensionValue {
    fn from_slot(type_name: &str, value: Value) -> serde_json::Result<Self> {
        Ok(match type_name {
            "Coding" => ExtensionValue::Coding(serde_json::from_value(value)?),
            "String" => ExtensionValue::String(serde_json::from_value(value)?),
            "Code" => ExtensionValue::Code(serde_json::from_value(value)?),
            "Address" => ExtensionValue::Address(serde_json::from_value(value)?),
            "Decimal" => ExtensionValue::Decimal(serde_json::from_value(value)?),
            other => ExtensionValue::Other {
                type_name: other.to_string(),
                value,
            },
        })
    }

    /// FHIR type name of the populated slot (`Coding`, `String`, ...)
    pub fn type_name(&self) -> &str {
        match self {
            ExtensionValue::Coding(_) => "Coding",
            ExtensionValue::String(_) => "String",
            ExtensionValue::Code(_) => "Code",
            ExtensionValue::Address(_) => "Address",
            ExtensionValue::Decimal(_) => "Decimal",
            ExtensionValue::Other { type_name, .. } => type_name,
        }
    }

    /// JSON property name of the populated slot
    pub fn slot_name(&self) -> String {
        format!("{VALUE_PREFIX}{}", self.type_name())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExtensionValue::String(s) | ExtensionValue::Code(s) => Some(s),
            _ => None,
        }
    }

    /// Extensions carried inside the value itself, e.g. on a `valueAddress`
    pub fn extensions(&self) -> &[Extension] {
        match self {
            ExtensionValue::Address(address) => &address.extension,
            _ => &[],
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            ExtensionValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl Extension {
    pub fn new(url: impl Into<String>, value: Option<ExtensionValue>) -> Self {
        Self {
            url: url.into(),
            value,
            extension: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Nested extension with the given url
    pub fn nested(&self, url: &str) -> Option<&Extension> {
        self.extension.iter().find(|e| e.url == url)
    }

    /// `value*` slots that were populated in addition to `value`
    pub fn ambiguous_slots(&self) -> Vec<&str> {
        self.extra
            .keys()
            .map(String::as_str)
            .filter(|key| is_value_slot(key))
            .collect()
    }

    /// First extension in this tree (self included) with more than one value slot
    pub fn find_ambiguous(&self) -> Option<&Extension> {
        if !self.ambiguous_slots().is_empty() {
            return Some(self);
        }
        self.extension
            .iter()
            .chain(self.value.iter().flat_map(ExtensionValue::extensions))
            .find_map(Extension::find_ambiguous)
    }
}

/// Find an extension by url in a list
pub fn find_extension<'a>(extensions: &'a [Extension], url: &str) -> Option<&'a Extension> {
    extensions.iter().find(|e| e.url == url)
}

impl<'de> Deserialize<'de> for Extension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;

        // Pick the slot before removing anything so document order decides.
        let slot = map.keys().find(|key| is_value_slot(key)).cloned();

        let url = match map.shift_remove("url") {
            Some(Value::String(url)) => url,
            Some(_) => return Err(de::Error::custom("extension url must be a string")),
            None => return Err(de::Error::missing_field("url")),
        };

        let extension = match map.shift_remove("extension") {
            Some(nested) => Vec::<Extension>::deserialize(nested).map_err(de::Error::custom)?,
            None => Vec::new(),
        };

        let value = match slot {
            Some(key) => {
                let raw = map.shift_remove(&key).unwrap_or(Value::Null);
                let value = ExtensionValue::from_slot(&key[VALUE_PREFIX.len()..], raw)
                    .map_err(|e| de::Error::custom(format!("extension {url}: {key}: {e}")))?;
                Some(value)
            }
            None => None,
        };

        Ok(Extension {
            url,
            value,
            extension,
            extra: map,
        })
    }
}

impl Serialize for Extension {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("url", &self.url)?;

        if let Some(value) = &self.value {
            let slot = value.slot_name();
            match value {
                ExtensionValue::Coding(coding) => map.serialize_entry(&slot, coding)?,
                ExtensionValue::String(s) | ExtensionValue::Code(s) => {
                    map.serialize_entry(&slot, s)?
                }
                ExtensionValue::Address(address) => map.serialize_entry(&slot, address)?,
                ExtensionValue::Decimal(d) => map.serialize_entry(&slot, d)?,
                ExtensionValue::Other { value, .. } => map.serialize_entry(&slot, value)?,
            }
        }

        if !self.extension.is_empty() {
            map.serialize_entry("extension", &self.extension)?;
        }

        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}
