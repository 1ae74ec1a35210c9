//! Configuration validation: dry-runs every registered mapping's member
//! rules against empty instances of the declared source and destination
//! types and reports property mismatches. Only runs when asked for; never
//! part of normal map execution.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::errors::{MapperError, Result};
use crate::mapper::Mapper;
use crate::registry::{Mapping, MemberMapping};

/// Which configuration surface a member rule was declared through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberDirection {
    SourceDeclared,
    DestinationDeclared,
}

impl fmt::Display for MemberDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceDeclared => f.write_str("source-declared"),
            Self::DestinationDeclared => f.write_str("destination-declared"),
        }
    }
}

/// One configuration mismatch found by the validator.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Label of the offending mapping.
    pub mapping: String,

    /// The offending member, when the issue concerns a single member.
    pub member: Option<String>,

    /// Declaration direction of the offending member rule.
    pub direction: Option<MemberDirection>,

    pub message: String,
}

impl ValidationIssue {
    fn mapping_level(mapping: &Mapping, message: impl Into<String>) -> Self {
        Self {
            mapping: mapping.label(),
            member: None,
            direction: None,
            message: message.into(),
        }
    }

    fn member_level(
        mapping: &Mapping,
        member: impl Into<String>,
        direction: MemberDirection,
        message: impl Into<String>,
    ) -> Self {
        Self {
            mapping: mapping.label(),
            member: Some(member.into()),
            direction: Some(direction),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mapping '{}' is invalid: {}", self.mapping, self.message)?;
        if let Some(direction) = self.direction {
            write!(f, " ({direction})")?;
        }
        Ok(())
    }
}

pub(crate) fn assert_configuration_is_valid(mapper: &Mapper, strict_mode: bool) -> Result<()> {
    match configuration_issues(mapper, strict_mode).into_iter().next() {
        Some(issue) => Err(MapperError::validation(issue.to_string())),
        None => Ok(()),
    }
}

pub(crate) fn configuration_issues(mapper: &Mapper, strict_mode: bool) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for mapping in mapper.mappings() {
        validate_mapping(mapping, strict_mode, &mut issues);
    }
    issues
}

fn validate_mapping(mapping: &Mapping, strict_mode: bool, issues: &mut Vec<ValidationIssue>) {
    let (Some(source_type), Some(destination_type)) =
        (&mapping.source_type, &mapping.destination_type)
    else {
        if strict_mode {
            issues.push(ValidationIssue::mapping_level(
                mapping,
                "cannot be validated, since the source or destination type is unspecified",
            ));
        }
        return;
    };

    let source_properties = property_names(&source_type.instantiate());
    let destination_properties = property_names(&destination_type.instantiate());

    // Source properties already covered by an explicit member rule, plus the
    // destination properties those rules produce.
    let mut accounted: HashSet<String> = HashSet::new();

    for member in mapping.member_mappings() {
        validate_member(
            mapping,
            member,
            &source_properties,
            &destination_properties,
            issues,
        );
        accounted.insert(member.source_property().to_string());
        accounted.insert(member.destination_property().to_string());
    }

    // A mapping that opted out of auto-copying makes no completeness
    // promises about unconfigured properties.
    if mapping.ignore_all_non_existing {
        return;
    }

    for property in &source_properties {
        if !accounted.insert(property.clone()) {
            continue;
        }
        if !destination_properties.contains(property) {
            issues.push(ValidationIssue::mapping_level(
                mapping,
                format!(
                    "Source member '{property}' is configured to be mapped, but does not exist on the destination type"
                ),
            ));
        }
    }

    for property in &destination_properties {
        if accounted.contains(property) {
            continue;
        }
        issues.push(ValidationIssue::mapping_level(
            mapping,
            format!("Destination member '{property}' does not exist on the source type"),
        ));
    }
}

fn validate_member(
    mapping: &Mapping,
    member: &MemberMapping,
    source_properties: &HashSet<String>,
    destination_properties: &HashSet<String>,
    issues: &mut Vec<ValidationIssue>,
) {
    if member.is_source_declared() {
        let name = member.source_property();
        if !source_properties.contains(name) {
            issues.push(ValidationIssue::member_level(
                mapping,
                name,
                MemberDirection::SourceDeclared,
                format!("Source member '{name}' is configured, but does not exist on the source type"),
            ));
        } else if member.is_ignored() {
            if destination_properties.contains(name) {
                issues.push(ValidationIssue::member_level(
                    mapping,
                    name,
                    MemberDirection::SourceDeclared,
                    format!(
                        "Source member '{name}' is ignored, but does exist on the destination type"
                    ),
                ));
            }
        } else if !destination_properties.contains(member.destination_property()) {
            issues.push(ValidationIssue::member_level(
                mapping,
                name,
                MemberDirection::SourceDeclared,
                format!(
                    "Source member '{name}' is configured to be mapped, but does not exist on the destination type"
                ),
            ));
        }
        return;
    }

    let name = member.destination_property();
    if !destination_properties.contains(name) {
        issues.push(ValidationIssue::member_level(
            mapping,
            name,
            MemberDirection::DestinationDeclared,
            format!(
                "Destination member '{name}' is configured, but does not exist on the destination type"
            ),
        ));
    } else if member.is_ignored() {
        if source_properties.contains(name) {
            issues.push(ValidationIssue::member_level(
                mapping,
                name,
                MemberDirection::DestinationDeclared,
                format!("Destination member '{name}' is ignored, but does exist on the source type"),
            ));
        }
    } else if !source_properties.contains(member.source_property()) {
        issues.push(ValidationIssue::member_level(
            mapping,
            name,
            MemberDirection::DestinationDeclared,
            format!(
                "Destination member '{name}' is configured to be mapped, but source member '{}' does not exist on the source type",
                member.source_property()
            ),
        ));
    }
}

fn property_names(instance: &Value) -> HashSet<String> {
    match instance.as_object() {
        Some(properties) => properties.keys().cloned().collect(),
        None => HashSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ForMember, SourceMember};
    use crate::registry::TypeSpec;
    use serde_json::json;

    fn customer_types() -> (TypeSpec, TypeSpec) {
        (
            TypeSpec::new("CustomerDto", || json!({ "name": "", "email": "" })),
            TypeSpec::new("Customer", || json!({ "name": "", "email": "" })),
        )
    }

    #[test]
    fn test_matching_shapes_are_valid() {
        let mut mapper = Mapper::new();
        let (dto, customer) = customer_types();
        mapper.create_map(dto, customer).unwrap();

        assert!(mapper.assert_configuration_is_valid(true).is_ok());
        assert!(mapper.configuration_issues(true).is_empty());
    }

    #[test]
    fn test_unconfigured_source_member_missing_on_destination() {
        let mut mapper = Mapper::new();
        let dto = TypeSpec::new("CustomerDto", || json!({ "name": "", "phone": "" }));
        let customer = TypeSpec::new("Customer", || json!({ "name": "" }));
        mapper.create_map(dto, customer).unwrap();

        let issues = mapper.configuration_issues(true);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Source member 'phone'"));
        assert!(mapper.assert_configuration_is_valid(true).is_err());
    }

    #[test]
    fn test_destination_declared_rule_missing_on_destination() {
        let mut mapper = Mapper::new();
        let (dto, customer) = customer_types();
        mapper
            .create_map(dto, customer)
            .unwrap()
            .for_member("phone", ForMember::value(json!("n/a")));

        let issues = mapper.configuration_issues(true);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].member.as_deref(), Some("phone"));
        assert_eq!(
            issues[0].direction,
            Some(MemberDirection::DestinationDeclared)
        );
        assert!(issues[0]
            .message
            .contains("does not exist on the destination type"));
    }

    #[test]
    fn test_source_declared_rule_missing_on_source() {
        let mut mapper = Mapper::new();
        let (dto, customer) = customer_types();
        mapper
            .create_map(dto, customer)
            .unwrap()
            .for_source_member("internal", SourceMember::ignore());

        let issues = mapper.configuration_issues(true);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].direction, Some(MemberDirection::SourceDeclared));
        assert!(issues[0]
            .message
            .contains("Source member 'internal' is configured, but does not exist on the source type"));
    }

    #[test]
    fn test_ignored_destination_member_present_on_source() {
        let mut mapper = Mapper::new();
        let (dto, customer) = customer_types();
        mapper
            .create_map(dto, customer)
            .unwrap()
            .for_member("email", ForMember::ignore());

        let issues = mapper.configuration_issues(true);
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .message
            .contains("Destination member 'email' is ignored, but does exist on the source type"));
    }

    #[test]
    fn test_destination_only_member_is_reported() {
        let mut mapper = Mapper::new();
        let dto = TypeSpec::new("CustomerDto", || json!({ "name": "" }));
        let customer = TypeSpec::new("Customer", || json!({ "name": "", "verified": false }));
        mapper.create_map(dto, customer).unwrap();

        let issues = mapper.configuration_issues(true);
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .message
            .contains("Destination member 'verified' does not exist on the source type"));
    }

    #[test]
    fn test_map_from_covers_both_property_names() {
        let mut mapper = Mapper::new();
        let dto = TypeSpec::new("PersonDto", || json!({ "name": "" }));
        let person = TypeSpec::new("Person", || json!({ "fullName": "" }));
        mapper
            .create_map(dto, person)
            .unwrap()
            .for_member("fullName", ForMember::map_from("name"));

        assert!(mapper.configuration_issues(true).is_empty());
    }

    #[test]
    fn test_ignore_all_non_existing_skips_completeness_checks() {
        let mut mapper = Mapper::new();
        let dto = TypeSpec::new("WideDto", || json!({ "a": "", "b": "" }));
        let narrow = TypeSpec::new("Narrow", || json!({ "c": "" }));
        mapper
            .create_map(dto, narrow)
            .unwrap()
            .ignore_all_non_existing();

        assert!(mapper.configuration_issues(true).is_empty());
    }

    #[test]
    fn test_strict_mode_flags_untyped_mappings() {
        let mut mapper = Mapper::new();
        mapper.create_map("A", "B").unwrap();

        let strict = mapper.configuration_issues(true);
        assert_eq!(strict.len(), 1);
        assert!(strict[0].message.contains("cannot be validated"));

        assert!(mapper.configuration_issues(false).is_empty());
        assert!(mapper.assert_configuration_is_valid(false).is_ok());
    }
}
