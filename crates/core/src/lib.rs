//! fhir-bundle: FHIR Bundle loading and read-only queries
//!
//! Loads a FHIR Bundle from JSON text, decodes its entries into a typed
//! record model and answers queries over them: which resource types are
//! present, and which resources have a given type.

pub mod bundle;
pub mod capability;
pub mod datatypes;
pub mod documents;
pub mod error;
pub mod extension;
pub mod filter;
pub mod loader;
pub mod outcome;
pub mod resource;

pub use bundle::{Bundle, Entry};
pub use capability::CapabilityStatement;
pub use documents::{INDEXED_RESOURCE_TYPES, TextDocument, index_documents};
pub use error::{BundleError, Result};
pub use extension::{Extension, ExtensionValue};
pub use filter::{count_by_type, find_resource, resource_types, resources_of_type};
pub use loader::{
    EntryPolicy, LoadOptions, PolicyParseError, ValuePolicy, decode_bundle, load_bundle_file,
    parse_bundle,
};
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use resource::{
    Condition, Encounter, Observation, ObservationValue, Patient, Resource, UnknownResource,
};
