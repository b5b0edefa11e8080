use crate::identity::IndexNameError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// IndexError
///
/// Runtime failure raised synchronously by an index mutation.
/// Every variant names the index that rejected the operation.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IndexError {
    #[error("duplicate key in index '{index}': {key}")]
    DuplicateKey { index: String, key: String },

    #[error("key not found in index '{index}': {key}")]
    KeyNotFound { index: String, key: String },

    #[error("constraint violation in index '{index}': key {key} is still referenced")]
    ConstraintViolation { index: String, key: String },
}

impl IndexError {
    pub(crate) fn duplicate_key(index: &str, key: &impl fmt::Debug) -> Self {
        Self::DuplicateKey {
            index: index.to_string(),
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn key_not_found(index: &str, key: &impl fmt::Debug) -> Self {
        Self::KeyNotFound {
            index: index.to_string(),
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn constraint_violation(index: &str, key: &impl fmt::Debug) -> Self {
        Self::ConstraintViolation {
            index: index.to_string(),
            key: format!("{key:?}"),
        }
    }

    /// Name of the index that raised the error.
    #[must_use]
    pub fn index(&self) -> &str {
        match self {
            Self::DuplicateKey { index, .. }
            | Self::KeyNotFound { index, .. }
            | Self::ConstraintViolation { index, .. } => index,
        }
    }

    /// Rendered key the error refers to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::DuplicateKey { key, .. }
            | Self::KeyNotFound { key, .. }
            | Self::ConstraintViolation { key, .. } => key,
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateKey { .. } => ErrorClass::Conflict,
            Self::KeyNotFound { .. } => ErrorClass::NotFound,
            Self::ConstraintViolation { .. } => ErrorClass::Constraint,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// IndexConfigError
///
/// Build-time failure while configuring an index.
///

#[derive(Debug, ThisError)]
pub enum IndexConfigError {
    #[error("invalid index name: {0}")]
    Name(#[from] IndexNameError),

    #[error("index '{index}' has no key function")]
    MissingKeyFunction { index: String },
}

///
/// ErrorClass
/// Error taxonomy for orchestrators deciding how to react.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    NotFound,
    Constraint,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Constraint => "constraint",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_reports_class_and_index() {
        let err = IndexError::constraint_violation("order_customer_fk", &"A1");

        assert_eq!(err.class(), ErrorClass::Constraint);
        assert_eq!(err.index(), "order_customer_fk");
        assert_eq!(err.key(), "\"A1\"");
        assert_eq!(
            err.display_with_class(),
            "constraint: constraint violation in index 'order_customer_fk': key \"A1\" is still referenced"
        );
    }

    #[test]
    fn composite_keys_render_as_tuples() {
        let err = IndexError::duplicate_key("pk", &(7u32, "east"));

        assert_eq!(err.key(), "(7, \"east\")");
        assert_eq!(err.class(), ErrorClass::Conflict);
    }
}
