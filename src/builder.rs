use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::convert::TypeConverterSpec;
use crate::errors::{MapperError, Result};
use crate::mapper::Mapper;
use crate::registry::{
    AsyncMemberFn, ConditionFn, Mapping, MappingKey, MemberFn, MemberMapping, MemberOptions,
    MemberValue, TypeSpec,
};

/// Configuration intent for a destination-side member rule.
///
/// Multiple `for_member` calls for the same destination property accumulate:
/// values and transforms queue up in call order, while `Ignore`, `MapFrom`
/// and `Condition` adjust the rule itself.
pub enum ForMember {
    /// Replace the running value with a literal.
    Value(Value),
    /// Replace the running value per instance; `None` keeps it unchanged.
    Transform(MemberFn),
    /// Drop the property entirely. Wins over every later intent.
    Ignore,
    /// Rewire the rule to read from another source property.
    MapFrom(String),
    /// Skip the property for source instances rejected by the predicate.
    Condition(ConditionFn),
}

impl ForMember {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn transform(
        func: impl Fn(&MemberOptions<'_>) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::Transform(Arc::new(func))
    }

    pub fn ignore() -> Self {
        Self::Ignore
    }

    pub fn map_from(source_property: impl Into<String>) -> Self {
        Self::MapFrom(source_property.into())
    }

    pub fn condition(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self::Condition(Arc::new(predicate))
    }
}

/// Configuration intent for a source-side member rule.
///
/// Deliberately narrower than [`ForMember`]: the source-side surface offers
/// no map-from and no condition.
pub enum SourceMember {
    /// Drop the property entirely.
    Ignore,
    /// Replace the running value per instance; `None` keeps it unchanged.
    Transform(MemberFn),
}

impl SourceMember {
    pub fn ignore() -> Self {
        Self::Ignore
    }

    pub fn transform(
        func: impl Fn(&MemberOptions<'_>) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::Transform(Arc::new(func))
    }
}

/// Fluent configuration surface returned by
/// [`create_map`](crate::Mapper::create_map).
///
/// Chaining methods consume and return the builder; `convert_using` and
/// `with_profile` are terminal. Every call mutates the mapping stored in the
/// registry immediately.
pub struct MapBuilder<'m> {
    mapper: &'m mut Mapper,
    key: MappingKey,
}

impl std::fmt::Debug for MapBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapBuilder").field("key", &self.key).finish()
    }
}

impl<'m> MapBuilder<'m> {
    pub(crate) fn new(mapper: &'m mut Mapper, key: MappingKey) -> Self {
        Self { mapper, key }
    }

    fn mapping_mut(&mut self) -> &mut Mapping {
        self.mapper
            .registry
            .mapping_mut(&self.key)
            .expect("mapping registered when the builder was created")
    }

    /// Customize configuration for an individual destination member.
    pub fn for_member(mut self, destination_property: impl Into<String>, spec: ForMember) -> Self {
        let destination_property = destination_property.into();
        apply_for_member(self.mapping_mut(), destination_property, spec);
        self
    }

    /// Queue an asynchronous rule for a destination member and flag the
    /// mapping as async. Async mappings are rejected by the synchronous map
    /// entry points.
    pub fn for_member_async(
        mut self,
        destination_property: impl Into<String>,
        func: impl Fn(&MemberOptions<'_>, &mut dyn FnMut(Value)) + Send + Sync + 'static,
    ) -> Self {
        let destination_property = destination_property.into();
        apply_for_member_async(self.mapping_mut(), destination_property, Arc::new(func));
        self
    }

    /// Customize configuration for an individual source member.
    pub fn for_source_member(
        mut self,
        source_property: impl Into<String>,
        spec: SourceMember,
    ) -> Self {
        let source_property = source_property.into();
        apply_for_source_member(self.mapping_mut(), source_property, spec);
        self
    }

    /// Queue an asynchronous source-side rule and flag the mapping as async.
    pub fn for_source_member_async(
        mut self,
        source_property: impl Into<String>,
        func: impl Fn(&MemberOptions<'_>, &mut dyn FnMut(Value)) + Send + Sync + 'static,
    ) -> Self {
        let source_property = source_property.into();
        apply_for_source_member_async(self.mapping_mut(), source_property, Arc::new(func));
        self
    }

    /// Route every resolved (name, value) pair through `func` instead of
    /// assigning it directly. Multiple registrations all run, in order.
    pub fn for_all_members(
        mut self,
        func: impl Fn(&mut Map<String, Value>, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.mapping_mut()
            .for_all_member_mappings
            .push(Arc::new(func));
        self
    }

    /// Drop source properties that have no explicit member rule instead of
    /// auto-copying them.
    pub fn ignore_all_non_existing(mut self) -> Self {
        self.mapping_mut().ignore_all_non_existing = true;
        self
    }

    /// Set the destination type. Destinations are then instantiated from the
    /// descriptor instead of starting from an empty object.
    ///
    /// Idempotent for a type of the same name; a differently-named type is a
    /// configuration error.
    pub fn convert_to_type(mut self, destination_type: TypeSpec) -> Result<Self> {
        {
            let mapping = self.mapping_mut();
            if let Some(existing) = &mapping.destination_type {
                if existing.name() != destination_type.name() {
                    return Err(MapperError::ConflictingDestinationType {
                        existing: existing.name().to_string(),
                        requested: destination_type.name().to_string(),
                    });
                }
            } else {
                mapping.destination_type = Some(destination_type);
            }
        }
        Ok(self)
    }

    /// Skip normal member mapping and convert whole objects using a custom
    /// type converter. Terminal: replaces per-property resolution entirely.
    pub fn convert_using(mut self, spec: TypeConverterSpec) -> Result<()> {
        let converter = spec.resolve()?;
        let mapping = self.mapping_mut();
        mapping.type_converter = Some(converter);
        debug!("installed type converter on mapping '{}'", mapping.label());
        Ok(())
    }

    /// Assign a registered profile to this mapping and merge the profile's
    /// own mapping for the same key pair into it. Terminal.
    ///
    /// Merge rules: catch-all functions are appended; the profile's type
    /// converter and destination type overwrite the root's when present; a
    /// profile member rule overwrites a root rule targeting the same
    /// destination property (profile rules without a root counterpart are
    /// not added).
    pub fn with_profile(mut self, profile_name: &str) -> Result<()> {
        let Some(profile) = self.mapper.registry.profile(profile_name) else {
            return Err(MapperError::unknown_profile(profile_name));
        };
        let profile = Arc::clone(profile);

        let profile_key = MappingKey::scoped(profile_name, &self.key.source, &self.key.destination);
        let merged = self.mapper.registry.mapping(&profile_key).map(|scoped| {
            (
                scoped.for_all_member_mappings.clone(),
                scoped.type_converter.clone(),
                scoped.destination_type.clone(),
                scoped
                    .for_member_mappings
                    .values()
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        });

        let mapping = self.mapping_mut();
        mapping.profile = Some(profile);

        let Some((for_all, converter, destination_type, members)) = merged else {
            debug!(
                "profile '{}' has no mapping for '{}'; assigned without merge",
                profile_name,
                mapping.label()
            );
            return Ok(());
        };

        mapping.for_all_member_mappings.extend(for_all);
        if converter.is_some() {
            mapping.type_converter = converter;
        }
        if destination_type.is_some() {
            mapping.destination_type = destination_type;
        }
        for member in members {
            let existing = mapping
                .for_member_mappings
                .iter()
                .find(|(_, root)| root.destination_property == member.destination_property)
                .map(|(key, _)| key.clone());
            if let Some(key) = existing {
                mapping.for_member_mappings.remove(&key);
                mapping
                    .for_member_mappings
                    .insert(member.source_property.clone(), member);
            }
        }
        Ok(())
    }
}

fn apply_for_member(mapping: &mut Mapping, destination_property: String, spec: ForMember) {
    let Some(mut member) = take_member_for_destination(mapping, &destination_property) else {
        return;
    };

    match spec {
        ForMember::Value(value) => member.values.push(MemberValue::Literal(value)),
        ForMember::Transform(func) => member.values.push(MemberValue::Transform(func)),
        ForMember::Ignore => {
            member.ignore = true;
            member.source_property = member.destination_property.clone();
            member.values.clear();
        }
        ForMember::MapFrom(source_property) => member.source_property = source_property,
        ForMember::Condition(predicate) => member.condition = Some(predicate),
    }

    mapping
        .for_member_mappings
        .insert(member.source_property.clone(), member);
}

fn apply_for_member_async(mapping: &mut Mapping, destination_property: String, func: AsyncMemberFn) {
    let Some(mut member) = take_member_for_destination(mapping, &destination_property) else {
        return;
    };

    member.is_async = true;
    member.values.push(MemberValue::Async(func));
    mapping.is_async = true;

    mapping
        .for_member_mappings
        .insert(member.source_property.clone(), member);
}

/// Remove the member rule targeting `destination_property` so the caller can
/// modify and re-key it, creating a default rule when none exists. Returns
/// `None` for already-ignored members: those cannot be re-activated.
fn take_member_for_destination(
    mapping: &mut Mapping,
    destination_property: &str,
) -> Option<MemberMapping> {
    let existing_key = mapping
        .for_member_mappings
        .iter()
        .find(|(_, member)| member.destination_property == destination_property)
        .map(|(key, _)| key.clone());

    match existing_key {
        Some(key) => {
            let member = mapping.for_member_mappings.remove(&key)?;
            if member.ignore {
                trace!(
                    "member '{}' is ignored; dropping additional configuration",
                    destination_property
                );
                mapping.for_member_mappings.insert(key, member);
                return None;
            }
            Some(member)
        }
        None => Some(MemberMapping::for_destination(destination_property)),
    }
}

fn apply_for_source_member(mapping: &mut Mapping, source_property: String, spec: SourceMember) {
    match mapping.for_member_mappings.get_mut(&source_property) {
        Some(member) => match spec {
            SourceMember::Ignore => {
                member.ignore = true;
                member.is_async = false;
                member.values.clear();
            }
            SourceMember::Transform(func) => {
                member.is_async = false;
                member.values.push(MemberValue::Transform(func));
            }
        },
        None => {
            let member = match spec {
                SourceMember::Ignore => MemberMapping::for_source_ignored(&source_property),
                SourceMember::Transform(func) => MemberMapping::for_source(&source_property, func),
            };
            mapping.for_member_mappings.insert(source_property, member);
        }
    }
}

fn apply_for_source_member_async(
    mapping: &mut Mapping,
    source_property: String,
    func: AsyncMemberFn,
) {
    match mapping.for_member_mappings.get_mut(&source_property) {
        Some(member) => {
            member.is_async = true;
            member.values.push(MemberValue::Async(func));
        }
        None => {
            let member = MemberMapping::for_source_async(&source_property, func);
            mapping.for_member_mappings.insert(source_property, member);
        }
    }
    mapping.is_async = true;
}
