//! Per-item mapping execution: replays the declarative configuration held in
//! a [`Mapping`] against concrete source values.

use serde_json::{Map, Value};
use tracing::trace;

use crate::conventions::split_property_name;
use crate::convert::ResolutionContext;
use crate::errors::{MapperError, Result};
use crate::profile::Profile;
use crate::registry::{Mapping, MemberOptions, MemberValue};

/// Map a source value (or array of values) through a mapping.
pub(crate) fn map_value(mapping: &Mapping, source: &Value) -> Result<Value> {
    if mapping.is_async {
        return Err(MapperError::async_mapping_misuse(
            &mapping.source_key,
            &mapping.destination_key,
        ));
    }

    match source {
        Value::Array(items) => {
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                let mapped = map_item(mapping, item);
                if is_falsy(&mapped) {
                    trace!("dropping falsy item result for '{}'", mapping.label());
                    continue;
                }
                results.push(mapped);
            }
            Ok(Value::Array(results))
        }
        _ => Ok(map_item(mapping, source)),
    }
}

fn map_item(mapping: &Mapping, source: &Value) -> Value {
    let destination = create_destination(mapping);

    if let Some(converter) = &mapping.type_converter {
        return converter(ResolutionContext {
            source_value: source,
            destination_value: Value::Object(destination),
        });
    }

    let mut destination = destination;
    if let Some(properties) = source.as_object() {
        for (source_property_name, value) in properties {
            map_property(mapping, source, source_property_name, value, &mut destination);
        }
    }
    Value::Object(destination)
}

/// Create the destination object, keeping any default fields supplied by the
/// destination type's instantiation function.
fn create_destination(mapping: &Mapping) -> Map<String, Value> {
    match &mapping.destination_type {
        Some(destination_type) => match destination_type.instantiate() {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        None => Map::new(),
    }
}

fn map_property(
    mapping: &Mapping,
    source_object: &Value,
    source_property_name: &str,
    source_value: &Value,
    destination: &mut Map<String, Value>,
) {
    let Some(member) = mapping.for_member_mappings.get(source_property_name) else {
        // No explicit rule: auto-copy under the derived destination name,
        // unless the mapping opted out of auto-copying.
        if mapping.ignore_all_non_existing {
            return;
        }
        let destination_property_name = match &mapping.profile {
            Some(profile) => derive_destination_name(profile.as_ref(), source_property_name),
            None => source_property_name.to_string(),
        };
        set_value(
            mapping,
            destination,
            &destination_property_name,
            source_value.clone(),
        );
        return;
    };

    if member.ignore {
        return;
    }
    if let Some(condition) = &member.condition {
        if !condition(source_object) {
            trace!("condition rejected property '{}'", source_property_name);
            return;
        }
    }

    let mut running = source_value.clone();
    for entry in &member.values {
        match entry {
            MemberValue::Literal(value) => running = value.clone(),
            MemberValue::Transform(func) => {
                let options = MemberOptions {
                    source_object,
                    source_property_name,
                    destination_property_value: &running,
                };
                if let Some(value) = func(&options) {
                    running = value;
                }
            }
            // Async entries never execute here: async mappings are rejected
            // before per-item mapping starts.
            MemberValue::Async(_) => {}
        }
    }
    set_value(mapping, destination, &member.destination_property, running);
}

/// Assign a resolved value, either directly or through the registered
/// catch-all functions (which then own the assignment).
fn set_value(
    mapping: &Mapping,
    destination: &mut Map<String, Value>,
    destination_property_name: &str,
    value: Value,
) {
    if mapping.for_all_member_mappings.is_empty() {
        destination.insert(destination_property_name.to_string(), value);
        return;
    }
    for func in &mapping.for_all_member_mappings {
        func(destination, destination_property_name, &value);
    }
}

/// Derive the destination property name from the assigned profile's naming
/// conventions, falling back to the unmodified source name when either
/// convention is missing or the name does not split.
fn derive_destination_name(profile: &dyn Profile, source_property_name: &str) -> String {
    let (Some(source), Some(destination)) = (
        profile.source_member_naming_convention(),
        profile.destination_member_naming_convention(),
    ) else {
        return source_property_name.to_string();
    };

    let parts = split_property_name(source, source_property_name);
    if parts.is_empty() {
        trace!(
            "property '{}' did not split under the source convention; keeping its name",
            source_property_name
        );
        return source_property_name.to_string();
    }
    destination.transform_property_name(&parts)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ForMember, SourceMember};
    use crate::convert::TypeConverterSpec;
    use crate::mapper::Mapper;
    use crate::registry::TypeSpec;
    use serde_json::json;

    #[test]
    fn test_auto_copy_preserves_property_order() {
        let mut mapper = Mapper::new();
        mapper.create_map("A", "B").unwrap();

        let result = mapper
            .map("A", "B", &json!({ "z": 1, "a": 2, "m": 3 }))
            .unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_literal_then_transform_folds_left_to_right() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .for_member("score", ForMember::value(json!(10)))
            .for_member(
                "score",
                ForMember::transform(|opts| {
                    opts.destination_property_value
                        .as_i64()
                        .map(|score| json!(score * 2))
                }),
            );

        let result = mapper.map("A", "B", &json!({ "score": 1 })).unwrap();
        assert_eq!(result, json!({ "score": 20 }));
    }

    #[test]
    fn test_transform_none_keeps_running_value() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .for_member("name", ForMember::transform(|_| None));

        let result = mapper.map("A", "B", &json!({ "name": "ada" })).unwrap();
        assert_eq!(result, json!({ "name": "ada" }));
    }

    #[test]
    fn test_condition_gates_member_per_instance() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .for_member(
                "adult",
                ForMember::condition(|source| {
                    source
                        .get("age")
                        .and_then(Value::as_i64)
                        .is_some_and(|age| age >= 18)
                }),
            )
            .for_member("adult", ForMember::map_from("age"))
            .for_member("adult", ForMember::transform(|_| Some(json!(true))));

        let minor = mapper.map("A", "B", &json!({ "age": 17 })).unwrap();
        assert!(minor.get("adult").is_none());

        let adult = mapper.map("A", "B", &json!({ "age": 18 })).unwrap();
        assert_eq!(adult["adult"], json!(true));
    }

    #[test]
    fn test_ignore_all_non_existing_drops_unconfigured_properties() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .for_member("kept", ForMember::transform(|_| None))
            .ignore_all_non_existing();

        let result = mapper
            .map("A", "B", &json!({ "kept": 1, "dropped": 2 }))
            .unwrap();
        assert_eq!(result, json!({ "kept": 1 }));
    }

    #[test]
    fn test_for_all_members_owns_assignment() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .for_all_members(|destination, name, value| {
                destination.insert(format!("mapped_{name}"), value.clone());
            });

        let result = mapper.map("A", "B", &json!({ "a": 1, "b": 2 })).unwrap();
        assert_eq!(result, json!({ "mapped_a": 1, "mapped_b": 2 }));
    }

    #[test]
    fn test_source_member_transform_runs_per_instance() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .for_source_member(
                "name",
                SourceMember::transform(|opts| {
                    opts.destination_property_value
                        .as_str()
                        .map(|name| json!(name.trim()))
                }),
            );

        let result = mapper.map("A", "B", &json!({ "name": "  ada  " })).unwrap();
        assert_eq!(result, json!({ "name": "ada" }));
    }

    #[test]
    fn test_destination_type_defaults_are_kept() {
        let mut mapper = Mapper::new();
        let person = TypeSpec::new("Person", || json!({ "id": 0, "name": "" }));
        mapper.create_map("PersonDto", &person).unwrap();

        let result = mapper
            .map("PersonDto", "Person", &json!({ "name": "ada" }))
            .unwrap();
        assert_eq!(result, json!({ "id": 0, "name": "ada" }));
    }

    #[test]
    fn test_converter_path_bypasses_member_resolution() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .for_member("name", ForMember::value(json!("unused")))
            .convert_using(TypeConverterSpec::function(|context| {
                json!({ "wrapped": context.source_value.clone() })
            }))
            .unwrap();

        let result = mapper.map("A", "B", &json!({ "name": "ada" })).unwrap();
        assert_eq!(result, json!({ "wrapped": { "name": "ada" } }));
    }

    #[test]
    fn test_array_input_maps_in_order_and_skips_falsy_results() {
        let mut mapper = Mapper::new();
        mapper
            .create_map("A", "B")
            .unwrap()
            .convert_using(TypeConverterSpec::function(|context| {
                if context.source_value["keep"] == json!(true) {
                    context.source_value.clone()
                } else {
                    Value::Null
                }
            }))
            .unwrap();

        let result = mapper
            .map(
                "A",
                "B",
                &json!([
                    { "keep": true, "id": 1 },
                    { "keep": false, "id": 2 },
                    { "keep": true, "id": 3 },
                ]),
            )
            .unwrap();
        assert_eq!(result, json!([{ "keep": true, "id": 1 }, { "keep": true, "id": 3 }]));
    }

    #[test]
    fn test_non_object_source_yields_destination_defaults() {
        let mut mapper = Mapper::new();
        mapper.create_map("A", "B").unwrap();

        let result = mapper.map("A", "B", &json!(42)).unwrap();
        assert_eq!(result, json!({}));
    }

    #[test]
    fn test_is_falsy() {
        assert!(is_falsy(&Value::Null));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(0.0)));
        assert!(is_falsy(&json!("")));
        assert!(!is_falsy(&json!("x")));
        assert!(!is_falsy(&json!(1)));
        assert!(!is_falsy(&json!({})));
        assert!(!is_falsy(&json!([])));
    }
}
