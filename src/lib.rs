//! Transmap - object-to-object mapping without hand-written copy code
//!
//! This crate provides a mapping engine: register a correspondence between a
//! "source" shape and a "destination" shape once, then produce destination
//! values from arbitrary source values. Values are dynamic JSON documents
//! (`serde_json::Value`); shapes are identified by string keys or by named
//! type descriptors.
//!
//! # Features
//!
//! - Fluent per-member configuration (overrides, conditions, ignores,
//!   source rewiring)
//! - Whole-object type converters
//! - Reusable mapping profiles with naming-convention translation
//! - Configuration validation by dry-running against empty instances
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use transmap::{ForMember, Mapper};
//!
//! fn main() -> transmap::Result<()> {
//!     let mut mapper = Mapper::new();
//!     mapper
//!         .create_map("PersonDto", "Person")?
//!         .for_member("fullName", ForMember::map_from("name"))
//!         .for_member(
//!             "fullName",
//!             ForMember::transform(|opts| {
//!                 opts.destination_property_value
//!                     .as_str()
//!                     .map(|name| json!(name.to_uppercase()))
//!             }),
//!         );
//!
//!     let person = mapper.map("PersonDto", "Person", &json!({ "name": "ada", "age": 36 }))?;
//!     assert_eq!(person, json!({ "fullName": "ADA", "age": 36 }));
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod conventions;
pub mod convert;
pub mod errors;
pub mod mapper;
pub mod profile;
pub mod registry;
pub mod validator;

mod engine;

// Re-export main types for convenience
pub use builder::{ForMember, MapBuilder, SourceMember};
pub use conventions::{CamelCaseNamingConvention, NamingConvention, PascalCaseNamingConvention};
pub use convert::{ConvertFn, ResolutionContext, TypeConverter, TypeConverterSpec};
pub use errors::{ErrorCategory, MapperError, Result};
pub use mapper::{Mapper, PreparedMap};
pub use profile::{Profile, ProfileConfig};
pub use registry::{
    AsyncMemberFn, ConditionFn, ForAllFn, Mapping, MemberFn, MemberMapping, MemberOptions,
    TypeKey, TypeSpec,
};
pub use validator::{MemberDirection, ValidationIssue};

/// Current version of Transmap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
