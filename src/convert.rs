use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{MapperError, Result};

/// Context handed to a whole-object converter.
#[derive(Debug)]
pub struct ResolutionContext<'a> {
    /// The source value being mapped.
    pub source_value: &'a Value,

    /// The freshly constructed destination value, carrying any default
    /// fields supplied by the mapping's destination type.
    pub destination_value: Value,
}

/// Whole-object conversion capability.
///
/// A converter installed on a mapping replaces per-property resolution
/// entirely; its return value is handed back to the caller verbatim.
pub trait TypeConverter: Send + Sync {
    fn convert(&self, context: ResolutionContext<'_>) -> Value;
}

/// Conversion function stored on a mapping.
pub type ConvertFn = Arc<dyn Fn(ResolutionContext<'_>) -> Value + Send + Sync>;

/// The accepted shapes for [`convert_using`](crate::MapBuilder::convert_using).
///
/// Resolution happens at registration time, in declaration order: a ready
/// instance is used as-is, a plain function is installed directly, and a
/// factory is invoked once with its failure reported as
/// [`MapperError::InvalidTypeConverter`].
pub enum TypeConverterSpec {
    /// A ready converter instance.
    Instance(Box<dyn TypeConverter>),

    /// A plain conversion function.
    Function(ConvertFn),

    /// A fallible factory producing a converter instance.
    Factory(Box<dyn Fn() -> Result<Box<dyn TypeConverter>> + Send + Sync>),
}

impl TypeConverterSpec {
    pub fn instance(converter: impl TypeConverter + 'static) -> Self {
        Self::Instance(Box::new(converter))
    }

    pub fn function(func: impl Fn(ResolutionContext<'_>) -> Value + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(func))
    }

    pub fn factory(
        factory: impl Fn() -> Result<Box<dyn TypeConverter>> + Send + Sync + 'static,
    ) -> Self {
        Self::Factory(Box::new(factory))
    }

    /// Resolve to the conversion function stored on the mapping.
    pub(crate) fn resolve(self) -> Result<ConvertFn> {
        match self {
            Self::Instance(converter) => {
                let converter: Arc<dyn TypeConverter> = Arc::from(converter);
                Ok(Arc::new(move |context| converter.convert(context)))
            }
            Self::Function(func) => Ok(func),
            Self::Factory(factory) => {
                let converter = factory()
                    .map_err(|err| MapperError::invalid_type_converter(err.to_string()))?;
                let converter: Arc<dyn TypeConverter> = Arc::from(converter);
                Ok(Arc::new(move |context| converter.convert(context)))
            }
        }
    }
}

impl fmt::Debug for TypeConverterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("TypeConverterSpec::Instance"),
            Self::Function(_) => f.write_str("TypeConverterSpec::Function"),
            Self::Factory(_) => f.write_str("TypeConverterSpec::Factory"),
        }
    }
}
