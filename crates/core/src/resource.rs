//! Clinical resources carried by bundle entries
//!
//! The resource-type set is open. Patient, Observation, Condition and
//! Encounter are decoded into typed structs; every other type is kept as
//! [`UnknownResource`] with its raw properties. Typed structs keep the
//! properties they do not model in `extra`.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::de::{self, Deserializer, Error as _};
use serde::ser::{self, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datatypes::{
    Address, CodeableConcept, CodedValue, Coding, Communication, ContactPoint, HumanName,
    Identifier, Narrative, PatientContact, Period, Quantity, Reference,
};
use crate::extension::{self, Extension};

/// A clinical record discriminated by `resourceType`
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Patient(Patient),
    Observation(Observation),
    Condition(Condition),
    Encounter(Encounter),
    Other(UnknownResource),
}

/// Items of an optional list property; absent and empty both read as `[]`
pub(crate) fn listed<T>(items: &Option<Vec<T>>) -> &[T] {
    items.as_deref().unwrap_or_default()
}

/// Patient demographics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<HumanName>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<Address>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_birth_boolean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<PatientContact>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication: Option<Vec<Communication>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Patient {
    /// Display form of the official name, or of the first name when none is official
    pub fn display_name(&self) -> Option<String> {
        let names = listed(&self.name);
        names
            .iter()
            .find(|n| n.use_.as_deref() == Some("official"))
            .or_else(|| names.first())
            .and_then(HumanName::display)
    }

    /// `birthDate` as a calendar date; partial dates (`1990`, `1990-05`) yield `None`
    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// Age in whole years on `date`
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        date.years_since(self.birth_date()?)
    }

    /// Extensions on the patient, its addresses and its contacts' addresses
    pub(crate) fn extensions(&self) -> impl Iterator<Item = &Extension> {
        let addresses = listed(&self.address)
            .iter()
            .chain(listed(&self.contact).iter().filter_map(|c| c.address.as_ref()));

        listed(&self.extension)
            .iter()
            .chain(addresses.flat_map(|a| a.extension.iter()))
    }
}

/// Measurement or assertion about a patient
///
/// `value[x]` stays in `extra` under its original property name and is
/// decoded on demand by [`Observation::value`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<CodeableConcept>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Vec<ObservationComponent>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One component of a multi-part observation (e.g. blood pressure)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservationComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded `value[x]` of an observation or component
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationValue {
    Quantity(Quantity),
    CodeableConcept(CodeableConcept),
    String(String),
    Boolean(bool),
    Integer(i64),
    DateTime(String),
    Other { type_name: String, value: Value },
}

impl ObservationValue {
    fn from_slot(type_name: &str, value: &Value) -> Self {
        let decoded = match type_name {
            "Quantity" => serde_json::from_value(value.clone()).map(ObservationValue::Quantity),
            "CodeableConcept" => {
                serde_json::from_value(value.clone()).map(ObservationValue::CodeableConcept)
            }
            "String" => serde_json::from_value(value.clone()).map(ObservationValue::String),
            "Boolean" => serde_json::from_value(value.clone()).map(ObservationValue::Boolean),
            "Integer" => serde_json::from_value(value.clone()).map(ObservationValue::Integer),
            "DateTime" => serde_json::from_value(value.clone()).map(ObservationValue::DateTime),
            _ => Err(serde_json::Error::custom("unmodelled value type")),
        };

        decoded.unwrap_or_else(|_| ObservationValue::Other {
            type_name: type_name.to_string(),
            value: value.clone(),
        })
    }

    pub fn display(&self) -> String {
        match self {
            ObservationValue::Quantity(q) => q.display().unwrap_or_default(),
            ObservationValue::CodeableConcept(c) => {
                c.display_text().unwrap_or_default().to_string()
            }
            ObservationValue::String(s) | ObservationValue::DateTime(s) => s.clone(),
            ObservationValue::Boolean(b) => b.to_string(),
            ObservationValue::Integer(i) => i.to_string(),
            ObservationValue::Other { value, .. } => value.to_string(),
        }
    }
}

fn first_value(extra: &Map<String, Value>) -> Option<ObservationValue> {
    extension::value_slots(extra)
        .next()
        .map(|(type_name, value)| ObservationValue::from_slot(type_name, value))
}

impl Observation {
    /// First populated `value[x]` in document order
    pub fn value(&self) -> Option<ObservationValue> {
        first_value(&self.extra)
    }

    /// Number of populated `value[x]` slots on the observation and each component
    pub(crate) fn max_value_slots(&self) -> usize {
        listed(&self.component)
            .iter()
            .map(|c| extension::value_slots(&c.extra).count())
            .chain(std::iter::once(extension::value_slots(&self.extra).count()))
            .max()
            .unwrap_or(0)
    }

    /// `effectiveDateTime` as a timestamp; dates without a time yield `None`
    pub fn effective_at(&self) -> Option<DateTime<FixedOffset>> {
        self.effective_date_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    }
}

impl ObservationComponent {
    pub fn value(&self) -> Option<ObservationValue> {
        first_value(&self.extra)
    }
}

/// Problem, diagnosis or health concern
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodedValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodedValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<CodeableConcept>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub abatement_date_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Condition {
    pub fn is_active(&self) -> bool {
        self.clinical_status.as_ref().and_then(CodedValue::code) == Some("active")
    }
}

/// Interaction between a patient and a provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<Coding>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<Vec<CodeableConcept>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<Vec<EncounterParticipant>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EncounterParticipant {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<Vec<CodeableConcept>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual: Option<Reference>,
}

/// Any resource type without a typed model
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownResource {
    pub resource_type: String,
    pub id: String,
    /// Every property except `resourceType` and `id`, in document order
    pub fields: Map<String, Value>,
}

impl UnknownResource {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Resource {
    pub fn resource_type(&self) -> &str {
        match self {
            Resource::Patient(_) => "Patient",
            Resource::Observation(_) => "Observation",
            Resource::Condition(_) => "Condition",
            Resource::Encounter(_) => "Encounter",
            Resource::Other(r) => &r.resource_type,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Resource::Patient(r) => &r.id,
            Resource::Observation(r) => &r.id,
            Resource::Condition(r) => &r.id,
            Resource::Encounter(r) => &r.id,
            Resource::Other(r) => &r.id,
        }
    }

    pub fn as_patient(&self) -> Option<&Patient> {
        match self {
            Resource::Patient(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_observation(&self) -> Option<&Observation> {
        match self {
            Resource::Observation(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            Resource::Condition(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_encounter(&self) -> Option<&Encounter> {
        match self {
            Resource::Encounter(e) => Some(e),
            _ => None,
        }
    }

    /// Decode a resource from a JSON object
    ///
    /// Fails when `resourceType` is missing or empty, when `id` is not a
    /// string, or when a typed resource has a property of the wrong shape.
    pub fn from_json(value: Value) -> serde_json::Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Err(serde_json::Error::custom("resource must be a JSON object")),
        }
    }

    fn from_map(mut map: Map<String, Value>) -> serde_json::Result<Self> {
        let resource_type = match map.get("resourceType") {
            Some(Value::String(t)) if !t.is_empty() => t.clone(),
            _ => {
                return Err(serde_json::Error::custom(
                    "resource is missing a non-empty resourceType",
                ));
            }
        };
        let id = match map.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => {
                return Err(serde_json::Error::custom(format!(
                    "{resource_type} resource is missing a string id"
                )));
            }
        };

        map.shift_remove("resourceType");

        let resource = match resource_type.as_str() {
            "Patient" => Resource::Patient(serde_json::from_value(Value::Object(map))?),
            "Observation" => Resource::Observation(serde_json::from_value(Value::Object(map))?),
            "Condition" => Resource::Condition(serde_json::from_value(Value::Object(map))?),
            "Encounter" => Resource::Encounter(serde_json::from_value(Value::Object(map))?),
            _ => {
                map.shift_remove("id");
                Resource::Other(UnknownResource {
                    resource_type,
                    id,
                    fields: map,
                })
            }
        };

        Ok(resource)
    }

    /// Every decoded extension reachable from a typed resource
    ///
    /// Unmodelled resources keep their extensions as raw JSON and yield none.
    pub(crate) fn extensions(&self) -> Vec<&Extension> {
        match self {
            Resource::Patient(p) => p.extensions().collect(),
            Resource::Observation(o) => listed(&o.extension).iter().collect(),
            Resource::Condition(c) => listed(&c.extension).iter().collect(),
            Resource::Encounter(e) => listed(&e.extension).iter().collect(),
            Resource::Other(_) => Vec::new(),
        }
    }

    /// JSON form with `resourceType` as the first property
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// One-line human description, e.g. `Patient/123 Jane Doe (female, 1990-01-01)`
    pub fn summary_line(&self) -> String {
        let mut line = format!("{}/{}", self.resource_type(), self.id());

        let (label, detail) = match self {
            Resource::Patient(p) => {
                let detail: Vec<&str> = [p.gender.as_deref(), p.birth_date.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                let detail = (!detail.is_empty()).then(|| format!("({})", detail.join(", ")));
                (p.display_name(), detail)
            }
            Resource::Observation(o) => {
                let label = o.code.as_ref().and_then(|c| c.display_text()).map(str::to_string);
                let detail = o
                    .value()
                    .map(|v| v.display())
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("= {v}"));
                (label, detail)
            }
            Resource::Condition(c) => {
                let label = c.code.as_ref().and_then(|c| c.display_text()).map(str::to_string);
                let detail = c
                    .clinical_status
                    .as_ref()
                    .and_then(CodedValue::code)
                    .map(|s| format!("[{s}]"));
                (label, detail)
            }
            Resource::Encounter(e) => {
                let label = listed(&e.type_)
                    .iter()
                    .find_map(|t| t.display_text())
                    .map(str::to_string);
                let detail = e.period.as_ref().and_then(|p| p.start.clone());
                (label, detail)
            }
            Resource::Other(r) => {
                let label = r
                    .get("code")
                    .and_then(|c| serde_json::from_value::<CodeableConcept>(c.clone()).ok())
                    .and_then(|c| c.display_text().map(str::to_string))
                    .or_else(|| r.get("name").and_then(Value::as_str).map(str::to_string));
                (label, None)
            }
        };

        for part in [label, detail].into_iter().flatten() {
            line.push(' ');
            line.push_str(&part);
        }
        line
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Resource::from_map(map).map_err(de::Error::custom)
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let body = match self {
            Resource::Patient(r) => serde_json::to_value(r),
            Resource::Observation(r) => serde_json::to_value(r),
            Resource::Condition(r) => serde_json::to_value(r),
            Resource::Encounter(r) => serde_json::to_value(r),
            Resource::Other(r) => Ok(Value::Object(r.fields.clone())),
        }
        .map_err(ser::Error::custom)?;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("resourceType", self.resource_type())?;
        if let Resource::Other(r) = self {
            map.serialize_entry("id", &r.id)?;
        }
        if let Value::Object(fields) = body {
            for (key, value) in &fields {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
