use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use crate::builder::MapBuilder;
use crate::engine;
use crate::errors::{MapperError, Result};
use crate::profile::{Profile, ProfileConfig};
use crate::registry::{Mapping, MappingKey, MappingRegistry, TypeKey};
use crate::validator::{self, ValidationIssue};

static GLOBAL: Lazy<Mutex<Mapper>> = Lazy::new(|| Mutex::new(Mapper::new()));

/// The mapping context: owns the registry of mappings and profiles and
/// exposes configuration and execution.
///
/// A `Mapper` is plain owned data intended to be passed around explicitly;
/// configuration requires `&mut self`, mapping only `&self`. For call sites
/// that want a single shared instance, [`Mapper::global`] provides a
/// process-wide default behind a mutex.
pub struct Mapper {
    pub(crate) registry: MappingRegistry,
}

impl Mapper {
    pub fn new() -> Self {
        Self {
            registry: MappingRegistry::new(),
        }
    }

    /// The process-wide default instance, constructed on first use.
    pub fn global() -> &'static Mutex<Mapper> {
        &GLOBAL
    }

    /// Create (or overwrite) a mapping between two shapes and return the
    /// fluent builder for it.
    ///
    /// Arguments are either plain string keys or [`TypeSpec`] descriptors;
    /// descriptors additionally provide instantiation for destinations and
    /// validation. A descriptor with a blank name is rejected.
    ///
    /// [`TypeSpec`]: crate::TypeSpec
    pub fn create_map(
        &mut self,
        source: impl Into<TypeKey>,
        destination: impl Into<TypeKey>,
    ) -> Result<MapBuilder<'_>> {
        self.create_map_scoped(None, source, destination)
    }

    pub(crate) fn create_map_scoped(
        &mut self,
        profile_scope: Option<String>,
        source: impl Into<TypeKey>,
        destination: impl Into<TypeKey>,
    ) -> Result<MapBuilder<'_>> {
        let (source_key, source_type) = source.into().resolve()?;
        let (destination_key, destination_type) = destination.into().resolve()?;

        let key = match &profile_scope {
            Some(profile) => MappingKey::scoped(profile, &source_key, &destination_key),
            None => MappingKey::root(&source_key, &destination_key),
        };
        let mapping = Mapping::new(
            source_key,
            destination_key,
            profile_scope,
            source_type,
            destination_type,
        );
        debug!("registering mapping '{}'", mapping.label());
        self.registry.insert_mapping(key.clone(), mapping);
        Ok(MapBuilder::new(self, key))
    }

    /// Execute a mapping from the source value to a new destination value.
    ///
    /// Array sources map element-wise, in order, dropping falsy per-item
    /// results. Fails for unregistered key pairs and for mappings carrying
    /// asynchronous member configuration.
    pub fn map(&self, source_key: &str, destination_key: &str, value: &Value) -> Result<Value> {
        let mapping = self.lookup(source_key, destination_key)?;
        engine::map_value(mapping, value)
    }

    /// Resolve a mapping once and return a handle that executes it
    /// repeatedly without further registry lookups.
    ///
    /// Resolution failures surface here rather than at call time; the async
    /// rejection still happens per call.
    pub fn prepare(&self, source_key: &str, destination_key: &str) -> Result<PreparedMap<'_>> {
        let mapping = self.lookup(source_key, destination_key)?;
        Ok(PreparedMap { mapping })
    }

    /// Asynchronous mapping entry point.
    ///
    /// Present so that async-configured mappings have an explicit
    /// destination, but not implemented: after resolving the mapping this
    /// always fails with [`MapperError::AsyncMappingUnimplemented`].
    pub fn map_async(
        &self,
        source_key: &str,
        destination_key: &str,
        _value: &Value,
    ) -> Result<Value> {
        let _mapping = self.lookup(source_key, destination_key)?;
        Err(MapperError::AsyncMappingUnimplemented)
    }

    /// Register a profile, running its `configure` hook immediately.
    /// Re-registering a profile name overwrites the prior entry.
    pub fn add_profile(&mut self, profile: impl Profile + 'static) {
        let profile: Arc<dyn Profile> = Arc::new(profile);
        debug!("registering profile '{}'", profile.profile_name());
        let mut config = ProfileConfig::new(self, profile.profile_name());
        profile.configure(&mut config);
        self.registry.insert_profile(profile);
    }

    /// Validate the whole configuration by dry-running it against empty
    /// instances, failing on the first mismatch found.
    ///
    /// With `strict_mode`, mappings lacking type descriptors on either side
    /// are themselves reported; without it they are skipped.
    pub fn assert_configuration_is_valid(&self, strict_mode: bool) -> Result<()> {
        validator::assert_configuration_is_valid(self, strict_mode)
    }

    /// Collect every configuration mismatch instead of failing on the first.
    pub fn configuration_issues(&self, strict_mode: bool) -> Vec<ValidationIssue> {
        validator::configuration_issues(self, strict_mode)
    }

    /// Read-only iteration over all registered mappings, including
    /// profile-scoped ones.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.registry.mappings()
    }

    fn lookup(&self, source_key: &str, destination_key: &str) -> Result<&Mapping> {
        self.registry
            .mapping(&MappingKey::root(source_key, destination_key))
            .ok_or_else(|| MapperError::mapping_not_found(source_key, destination_key))
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

/// A resolved mapping handle returned by [`Mapper::prepare`].
///
/// Borrows the registry immutably, so further configuration requires
/// dropping the handle first.
#[derive(Debug)]
pub struct PreparedMap<'m> {
    mapping: &'m Mapping,
}

impl PreparedMap<'_> {
    pub fn source_key(&self) -> &str {
        self.mapping.source_key()
    }

    pub fn destination_key(&self) -> &str {
        self.mapping.destination_key()
    }

    /// Execute the mapping for one source value (or array of values).
    pub fn map(&self, value: &Value) -> Result<Value> {
        engine::map_value(self.mapping, value)
    }
}
