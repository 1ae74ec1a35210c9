use thiserror::Error;

/// Main error type for transmap.
///
/// Every failure is a synchronous, non-recoverable fault signaling a
/// configuration or usage defect; there are no retries and no partial
/// results anywhere in the crate.
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Could not resolve a type name: the supplied type descriptor name '{supplied}' is blank")]
    UnresolvedTypeName { supplied: String },

    #[error("Could not find a mapping with a source of '{source_key}' and a destination of '{destination_key}'")]
    MappingNotFound {
        source_key: String,
        destination_key: String,
    },

    #[error("Mapping '{source_key}' => '{destination_key}' contains asynchronous member configuration and cannot be executed by the synchronous map call")]
    AsyncMappingMisuse {
        source_key: String,
        destination_key: String,
    },

    #[error("Asynchronous mapping is not implemented")]
    AsyncMappingUnimplemented,

    #[error("Destination type can only be set once: already '{existing}', requested '{requested}'")]
    ConflictingDestinationType {
        existing: String,
        requested: String,
    },

    #[error("The supplied type converter is invalid: {reason}")]
    InvalidTypeConverter { reason: String },

    #[error("Could not find a profile with name '{profile_name}'")]
    UnknownProfile { profile_name: String },

    #[error("{message}")]
    Validation { message: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MapperError>;

impl MapperError {
    pub fn unresolved_type_name(supplied: impl Into<String>) -> Self {
        Self::UnresolvedTypeName {
            supplied: supplied.into(),
        }
    }

    pub fn mapping_not_found(
        source_key: impl Into<String>,
        destination_key: impl Into<String>,
    ) -> Self {
        Self::MappingNotFound {
            source_key: source_key.into(),
            destination_key: destination_key.into(),
        }
    }

    pub fn async_mapping_misuse(
        source_key: impl Into<String>,
        destination_key: impl Into<String>,
    ) -> Self {
        Self::AsyncMappingMisuse {
            source_key: source_key.into(),
            destination_key: destination_key.into(),
        }
    }

    pub fn invalid_type_converter(reason: impl Into<String>) -> Self {
        Self::InvalidTypeConverter {
            reason: reason.into(),
        }
    }

    pub fn unknown_profile(profile_name: impl Into<String>) -> Self {
        Self::UnknownProfile {
            profile_name: profile_name.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get error category for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnresolvedTypeName { .. }
            | Self::ConflictingDestinationType { .. }
            | Self::InvalidTypeConverter { .. }
            | Self::UnknownProfile { .. } => ErrorCategory::Configuration,

            Self::MappingNotFound { .. }
            | Self::AsyncMappingMisuse { .. }
            | Self::AsyncMappingUnimplemented => ErrorCategory::Execution,

            Self::Validation { .. } => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Defects recorded while building mapping configuration.
    Configuration,
    /// Defects detected when a map call is executed.
    Execution,
    /// Mismatches reported by the configuration validator.
    Validation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MapperError::mapping_not_found("CustomerDto", "Customer");
        assert!(matches!(err, MapperError::MappingNotFound { .. }));
        assert_eq!(
            err.to_string(),
            "Could not find a mapping with a source of 'CustomerDto' and a destination of 'Customer'"
        );
    }

    #[test]
    fn test_error_categories() {
        let err = MapperError::unknown_profile("missing");
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err = MapperError::async_mapping_misuse("A", "B");
        assert_eq!(err.category(), ErrorCategory::Execution);

        let err = MapperError::validation("mismatch");
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_validation_message_passthrough() {
        let err = MapperError::validation("Mapping 'A => B' is invalid: member missing");
        assert_eq!(
            err.to_string(),
            "Mapping 'A => B' is invalid: member missing"
        );
    }

    #[test]
    fn test_conflicting_destination_type_display() {
        let err = MapperError::ConflictingDestinationType {
            existing: "Customer".to_string(),
            requested: "Order".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Destination type can only be set once: already 'Customer', requested 'Order'"
        );
    }
}
