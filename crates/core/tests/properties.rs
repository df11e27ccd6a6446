//! Property tests for the resource type extractor and the resource filter.

use std::collections::HashSet;

use fhir_bundle::{Bundle, LoadOptions, Resource, parse_bundle, resource_types, resources_of_type};
use proptest::prelude::*;
use serde_json::{Value, json};

fn resource_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Patient"),
        Just("Observation"),
        Just("Condition"),
        Just("Encounter"),
        Just("Organization"),
        Just("Procedure"),
        Just("Immunization"),
        Just("Claim"),
    ]
}

fn bundle_strategy() -> impl Strategy<Value = Bundle> {
    prop::collection::vec(resource_type(), 0..40).prop_map(|types| {
        let entries: Vec<Value> = types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                json!({
                    "fullUrl": format!("urn:uuid:{i}"),
                    "resource": {"resourceType": t, "id": format!("{t}-{i}")}
                })
            })
            .collect();
        let document = json!({"resourceType": "Bundle", "type": "collection", "entry": entries});
        parse_bundle(&document.to_string(), &LoadOptions::default()).expect("generated bundle")
    })
}

/// Quadratic reference for first-occurrence ordering
fn naive_types(bundle: &Bundle) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in bundle.entries() {
        let t = entry.resource.resource_type();
        if !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_types_are_exactly_the_present_types(bundle in bundle_strategy()) {
        let types = resource_types(bundle.entries());
        let unique: HashSet<&str> = types.iter().copied().collect();
        prop_assert_eq!(unique.len(), types.len());

        let present: HashSet<&str> = bundle
            .entries()
            .iter()
            .map(|e| e.resource.resource_type())
            .collect();
        prop_assert_eq!(unique, present);
    }

    #[test]
    fn prop_types_in_first_occurrence_order(bundle in bundle_strategy()) {
        let types: Vec<String> = resource_types(bundle.entries())
            .into_iter()
            .map(str::to_string)
            .collect();
        prop_assert_eq!(types, naive_types(&bundle));
    }

    #[test]
    fn prop_queries_are_idempotent(bundle in bundle_strategy(), wanted in resource_type()) {
        prop_assert_eq!(resource_types(bundle.entries()), resource_types(bundle.entries()));
        prop_assert_eq!(
            resources_of_type(bundle.entries(), wanted),
            resources_of_type(bundle.entries(), wanted)
        );
    }

    #[test]
    fn prop_filter_is_complete_and_ordered(bundle in bundle_strategy(), wanted in resource_type()) {
        let filtered = resources_of_type(bundle.entries(), wanted);
        prop_assert!(filtered.iter().all(|r| r.resource_type() == wanted));

        let expected: Vec<&Resource> = bundle
            .entries()
            .iter()
            .map(|e| &e.resource)
            .filter(|r| r.resource_type() == wanted)
            .collect();
        prop_assert_eq!(filtered.len(), expected.len());
        for (got, want) in filtered.iter().zip(&expected) {
            prop_assert!(std::ptr::eq(*got, *want));
        }
    }

    #[test]
    fn prop_filters_partition_the_bundle(bundle in bundle_strategy()) {
        let total: usize = resource_types(bundle.entries())
            .into_iter()
            .map(|t| resources_of_type(bundle.entries(), t).len())
            .sum();
        prop_assert_eq!(total, bundle.len());
    }
}
