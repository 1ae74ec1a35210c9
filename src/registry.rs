use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::convert::ConvertFn;
use crate::errors::{MapperError, Result};
use crate::profile::Profile;

/// Explicit type descriptor: a stable name plus an instantiation function
/// producing an empty instance of the shape.
///
/// Descriptors stand in for classes: the name identifies the shape in the
/// registry and the instantiation function supplies default fields for
/// freshly constructed destinations and for configuration validation.
#[derive(Clone)]
pub struct TypeSpec {
    name: String,
    instantiate: Arc<dyn Fn() -> Value + Send + Sync>,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>, instantiate: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            instantiate: Arc::new(instantiate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produce an empty instance of the described shape.
    pub fn instantiate(&self) -> Value {
        (self.instantiate)()
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A map key argument: either a plain string key or a type descriptor.
#[derive(Debug)]
pub enum TypeKey {
    Name(String),
    Type(TypeSpec),
}

impl TypeKey {
    /// Resolve to the registry key string and the optional type handle.
    pub(crate) fn resolve(self) -> Result<(String, Option<TypeSpec>)> {
        match self {
            Self::Name(name) => Ok((name, None)),
            Self::Type(spec) => {
                if spec.name().trim().is_empty() {
                    return Err(MapperError::unresolved_type_name(spec.name()));
                }
                Ok((spec.name().to_string(), Some(spec)))
            }
        }
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<TypeSpec> for TypeKey {
    fn from(spec: TypeSpec) -> Self {
        Self::Type(spec)
    }
}

impl From<&TypeSpec> for TypeKey {
    fn from(spec: &TypeSpec) -> Self {
        Self::Type(spec.clone())
    }
}

/// Options handed to a per-member transform function at map time.
#[derive(Debug)]
pub struct MemberOptions<'a> {
    /// The complete source object being mapped.
    pub source_object: &'a Value,

    /// The source property the rule is keyed under.
    pub source_property_name: &'a str,

    /// The running destination value produced by earlier entries in the
    /// rule's value chain; starts as the raw source property value.
    pub destination_property_value: &'a Value,
}

/// Per-member transform; returning `None` keeps the running value unchanged.
pub type MemberFn = Arc<dyn Fn(&MemberOptions<'_>) -> Option<Value> + Send + Sync>;

/// Per-member asynchronous transform, callback style. Stored but never
/// executed: asynchronous mapping is rejected at the map entry points.
pub type AsyncMemberFn = Arc<dyn Fn(&MemberOptions<'_>, &mut dyn FnMut(Value)) + Send + Sync>;

/// Predicate on the source object gating a member rule per instance.
pub type ConditionFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Catch-all assignment function receiving every resolved property.
pub type ForAllFn = Arc<dyn Fn(&mut Map<String, Value>, &str, &Value) + Send + Sync>;

#[derive(Clone)]
pub(crate) enum MemberValue {
    Literal(Value),
    Transform(MemberFn),
    Async(AsyncMemberFn),
}

impl fmt::Debug for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Transform(_) => f.write_str("Transform"),
            Self::Async(_) => f.write_str("Async"),
        }
    }
}

/// Configuration for a single property within a mapping.
#[derive(Clone)]
pub struct MemberMapping {
    pub(crate) source_property: String,
    pub(crate) destination_property: String,
    pub(crate) source_mapping: bool,
    pub(crate) values: Vec<MemberValue>,
    pub(crate) ignore: bool,
    pub(crate) condition: Option<ConditionFn>,
    pub(crate) is_async: bool,
}

impl MemberMapping {
    pub(crate) fn for_destination(destination_property: &str) -> Self {
        Self {
            source_property: destination_property.to_string(),
            destination_property: destination_property.to_string(),
            source_mapping: false,
            values: Vec::new(),
            ignore: false,
            condition: None,
            is_async: false,
        }
    }

    pub(crate) fn for_source(source_property: &str, func: MemberFn) -> Self {
        Self {
            source_property: source_property.to_string(),
            destination_property: source_property.to_string(),
            source_mapping: true,
            values: vec![MemberValue::Transform(func)],
            ignore: false,
            condition: None,
            is_async: false,
        }
    }

    pub(crate) fn for_source_ignored(source_property: &str) -> Self {
        Self {
            source_property: source_property.to_string(),
            destination_property: source_property.to_string(),
            source_mapping: true,
            values: Vec::new(),
            ignore: true,
            condition: None,
            is_async: false,
        }
    }

    pub(crate) fn for_source_async(source_property: &str, func: AsyncMemberFn) -> Self {
        Self {
            source_property: source_property.to_string(),
            destination_property: source_property.to_string(),
            source_mapping: true,
            values: vec![MemberValue::Async(func)],
            ignore: false,
            condition: None,
            is_async: true,
        }
    }

    pub fn source_property(&self) -> &str {
        &self.source_property
    }

    pub fn destination_property(&self) -> &str {
        &self.destination_property
    }

    /// True when the rule was declared through the source-side surface.
    pub fn is_source_declared(&self) -> bool {
        self.source_mapping
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }
}

impl fmt::Debug for MemberMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMapping")
            .field("source_property", &self.source_property)
            .field("destination_property", &self.destination_property)
            .field("source_mapping", &self.source_mapping)
            .field("values", &self.values)
            .field("ignore", &self.ignore)
            .field("has_condition", &self.condition.is_some())
            .field("is_async", &self.is_async)
            .finish()
    }
}

/// The configuration record for one source-shape-to-destination-shape pair.
///
/// Created at configuration time, mutated only through the fluent builder,
/// and read-only once mapping starts.
pub struct Mapping {
    pub(crate) source_key: String,
    pub(crate) destination_key: String,
    pub(crate) profile_scope: Option<String>,
    pub(crate) source_type: Option<TypeSpec>,
    pub(crate) destination_type: Option<TypeSpec>,
    /// Keyed by source property name, even for destination-declared rules.
    pub(crate) for_member_mappings: HashMap<String, MemberMapping>,
    pub(crate) for_all_member_mappings: Vec<ForAllFn>,
    pub(crate) ignore_all_non_existing: bool,
    pub(crate) type_converter: Option<ConvertFn>,
    pub(crate) profile: Option<Arc<dyn Profile>>,
    pub(crate) is_async: bool,
}

impl Mapping {
    pub(crate) fn new(
        source_key: String,
        destination_key: String,
        profile_scope: Option<String>,
        source_type: Option<TypeSpec>,
        destination_type: Option<TypeSpec>,
    ) -> Self {
        Self {
            source_key,
            destination_key,
            profile_scope,
            source_type,
            destination_type,
            for_member_mappings: HashMap::new(),
            for_all_member_mappings: Vec::new(),
            ignore_all_non_existing: false,
            type_converter: None,
            profile: None,
            is_async: false,
        }
    }

    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    pub fn destination_key(&self) -> &str {
        &self.destination_key
    }

    pub fn profile_scope(&self) -> Option<&str> {
        self.profile_scope.as_deref()
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn ignores_all_non_existing(&self) -> bool {
        self.ignore_all_non_existing
    }

    /// Read-only iteration over the configured member rules.
    pub fn member_mappings(&self) -> impl Iterator<Item = &MemberMapping> {
        self.for_member_mappings.values()
    }

    /// Look up the member rule keyed under a source property name.
    pub fn member_mapping(&self, source_property: &str) -> Option<&MemberMapping> {
        self.for_member_mappings.get(source_property)
    }

    pub(crate) fn label(&self) -> String {
        match &self.profile_scope {
            Some(scope) => format!(
                "{} => {} (profile '{}')",
                self.source_key, self.destination_key, scope
            ),
            None => format!("{} => {}", self.source_key, self.destination_key),
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("source_key", &self.source_key)
            .field("destination_key", &self.destination_key)
            .field("profile_scope", &self.profile_scope)
            .field("members", &self.for_member_mappings.len())
            .field("for_all_members", &self.for_all_member_mappings.len())
            .field("ignore_all_non_existing", &self.ignore_all_non_existing)
            .field("has_type_converter", &self.type_converter.is_some())
            .field("is_async", &self.is_async)
            .finish()
    }
}

/// Composite registry key: optional profile scope plus the two shape keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MappingKey {
    pub(crate) profile: Option<String>,
    pub(crate) source: String,
    pub(crate) destination: String,
}

impl MappingKey {
    pub(crate) fn root(source: &str, destination: &str) -> Self {
        Self {
            profile: None,
            source: source.to_string(),
            destination: destination.to_string(),
        }
    }

    pub(crate) fn scoped(profile: &str, source: &str, destination: &str) -> Self {
        Self {
            profile: Some(profile.to_string()),
            source: source.to_string(),
            destination: destination.to_string(),
        }
    }
}

/// Owns the mapping table and the profile table.
pub(crate) struct MappingRegistry {
    mappings: HashMap<MappingKey, Mapping>,
    profiles: HashMap<String, Arc<dyn Profile>>,
}

impl MappingRegistry {
    pub(crate) fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            profiles: HashMap::new(),
        }
    }

    /// Insert a mapping, overwriting any prior entry under the same key.
    pub(crate) fn insert_mapping(&mut self, key: MappingKey, mapping: Mapping) {
        self.mappings.insert(key, mapping);
    }

    pub(crate) fn mapping(&self, key: &MappingKey) -> Option<&Mapping> {
        self.mappings.get(key)
    }

    pub(crate) fn mapping_mut(&mut self, key: &MappingKey) -> Option<&mut Mapping> {
        self.mappings.get_mut(key)
    }

    pub(crate) fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.values()
    }

    pub(crate) fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    pub(crate) fn insert_profile(&mut self, profile: Arc<dyn Profile>) {
        self.profiles
            .insert(profile.profile_name().to_string(), profile);
    }

    pub(crate) fn profile(&self, name: &str) -> Option<&Arc<dyn Profile>> {
        self.profiles.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_type_key_resolution() {
        let (key, spec) = TypeKey::from("CustomerDto").resolve().unwrap();
        assert_eq!(key, "CustomerDto");
        assert!(spec.is_none());
    }

    #[test]
    fn test_type_spec_key_resolution() {
        let spec = TypeSpec::new("Customer", || json!({ "name": "" }));
        let (key, spec) = TypeKey::from(spec).resolve().unwrap();
        assert_eq!(key, "Customer");
        assert_eq!(spec.unwrap().instantiate(), json!({ "name": "" }));
    }

    #[test]
    fn test_blank_type_name_is_rejected() {
        let spec = TypeSpec::new("  ", || json!({}));
        let err = TypeKey::from(spec).resolve().unwrap_err();
        assert!(matches!(err, MapperError::UnresolvedTypeName { .. }));
    }

    #[test]
    fn test_insert_overwrites_same_key() {
        let mut registry = MappingRegistry::new();
        let key = MappingKey::root("A", "B");

        let mut first = Mapping::new("A".into(), "B".into(), None, None, None);
        first.ignore_all_non_existing = true;
        registry.insert_mapping(key.clone(), first);

        let second = Mapping::new("A".into(), "B".into(), None, None, None);
        registry.insert_mapping(key.clone(), second);

        assert_eq!(registry.mapping_count(), 1);
        assert!(!registry.mapping(&key).unwrap().ignore_all_non_existing);
    }

    #[test]
    fn test_scoped_and_root_keys_are_distinct() {
        let mut registry = MappingRegistry::new();
        registry.insert_mapping(
            MappingKey::root("A", "B"),
            Mapping::new("A".into(), "B".into(), None, None, None),
        );
        registry.insert_mapping(
            MappingKey::scoped("p", "A", "B"),
            Mapping::new("A".into(), "B".into(), Some("p".into()), None, None),
        );
        assert_eq!(registry.mapping_count(), 2);
    }

    #[test]
    fn test_mapping_label() {
        let mapping = Mapping::new("A".into(), "B".into(), None, None, None);
        assert_eq!(mapping.label(), "A => B");

        let scoped = Mapping::new("A".into(), "B".into(), Some("p".into()), None, None);
        assert_eq!(scoped.label(), "A => B (profile 'p')");
    }
}
