//! Error types for form coordination

use crate::form::FieldId;
use thiserror::Error;

/// Contract violations raised by the form registry.
///
/// These are integration bugs (a form with nothing in it, a field torn down
/// twice), not user input problems. Per-field validation failures are never
/// reported through this type; see [`crate::form::ValidationError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// `is_valid` was asked about a form with no registered fields
    #[error("cannot validate a form with no registered fields")]
    EmptyRegistry,

    /// `unregister` was called for a field that is not currently registered
    #[error("field {field} is not registered with this form")]
    UnpairedUnregister { field: FieldId },

    /// A per-field operation named a field that is not registered
    #[error("field {field} is not registered with this form")]
    NotRegistered { field: FieldId },
}

/// Result alias for registry operations
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_message() {
        assert_eq!(
            FormError::EmptyRegistry.to_string(),
            "cannot validate a form with no registered fields"
        );
    }

    #[test]
    fn test_unpaired_unregister_names_field() {
        let field = FieldId::new();
        let err = FormError::UnpairedUnregister { field };
        assert!(err.to_string().contains(&field.to_string()));
    }

    #[test]
    fn test_not_registered_is_distinct_from_unpaired_unregister() {
        let field = FieldId::new();
        assert_ne!(
            FormError::NotRegistered { field },
            FormError::UnpairedUnregister { field }
        );
    }
}
