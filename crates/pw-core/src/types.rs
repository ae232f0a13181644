//! Identifier types with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty or whitespace.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation. Surrounding whitespace is trimmed.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if trimmed.len() == id.len() {
                    Ok(Self(id))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated viewer identifier.
    ///
    /// Media servers usually hand out numeric ids; they are kept as strings so
    /// ordering is lexicographic and independent of the source's numbering.
    UserId, "user ID"
);

define_string_id!(
    /// A validated media item identifier (a movie, episode, show or track).
    ItemId, "item ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_blank_values() {
        assert_eq!(
            UserId::new("  ").unwrap_err(),
            ValidationError::Empty { field: "user ID" }
        );
        assert!(ItemId::new("").is_err());
    }

    #[test]
    fn ids_trim_whitespace() {
        assert_eq!(UserId::new(" 42 ").unwrap().as_str(), "42");
        assert_eq!(ItemId::new("1001").unwrap().to_string(), "1001");
    }

    #[test]
    fn ids_deserialize_through_validation() {
        let id: UserId = serde_json::from_str(r#""7""#).unwrap();
        assert_eq!(id.as_str(), "7");

        let result: Result<ItemId, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }
}
