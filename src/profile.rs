use crate::builder::MapBuilder;
use crate::conventions::NamingConvention;
use crate::errors::Result;
use crate::mapper::Mapper;
use crate::registry::TypeKey;

/// A named, reusable bundle of mappings.
///
/// Registering a profile with [`Mapper::add_profile`] immediately runs its
/// `configure` hook against a profile-scoped registry view; the mappings it
/// creates are later merged into a root mapping via
/// [`with_profile`](crate::MapBuilder::with_profile). A profile may also
/// carry naming conventions, consulted when auto-copied properties need
/// their destination name derived.
pub trait Profile: Send + Sync {
    /// Unique name scoping this profile's mappings and conventions.
    fn profile_name(&self) -> &str;

    /// Register this profile's mappings. Invoked once, synchronously, at
    /// registration time.
    fn configure(&self, config: &mut ProfileConfig<'_>);

    fn source_member_naming_convention(&self) -> Option<&dyn NamingConvention> {
        None
    }

    fn destination_member_naming_convention(&self) -> Option<&dyn NamingConvention> {
        None
    }
}

/// Registry view handed to [`Profile::configure`]; every mapping created
/// through it is keyed under the profile's scope.
pub struct ProfileConfig<'m> {
    mapper: &'m mut Mapper,
    profile_name: String,
}

impl<'m> ProfileConfig<'m> {
    pub(crate) fn new(mapper: &'m mut Mapper, profile_name: impl Into<String>) -> Self {
        Self {
            mapper,
            profile_name: profile_name.into(),
        }
    }

    /// Create a profile-scoped mapping. Accepts the same key arguments as
    /// [`Mapper::create_map`].
    pub fn create_map(
        &mut self,
        source: impl Into<TypeKey>,
        destination: impl Into<TypeKey>,
    ) -> Result<MapBuilder<'_>> {
        self.mapper
            .create_map_scoped(Some(self.profile_name.clone()), source, destination)
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }
}
