//! Record identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

/// An opaque record identifier assigned by the store on creation.
///
/// Identifiers are 1-128 characters of `[A-Za-z0-9._~-]` and may not be
/// `.` or `..`, which keeps them safe to use as file names.
///
/// # Example
///
/// ```
/// use leadflow_core::RecordId;
///
/// let id = RecordId::new("7f3c2a9d").unwrap();
/// assert_eq!(id.as_str(), "7f3c2a9d");
/// assert!(RecordId::new("../etc").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create a new record id from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let reject = |reason: &str| -> Error {
            ValidationError::RecordId {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if s.is_empty() {
            return Err(reject("cannot be empty"));
        }

        if s.len() > 128 {
            return Err(reject("exceeds maximum length of 128 characters"));
        }

        if s == "." || s == ".." {
            return Err(reject("cannot be '.' or '..'"));
        }

        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_' | '~'))
        {
            return Err(reject(&format!("contains invalid character '{}'", c)));
        }

        Ok(())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_style_ids() {
        assert!(RecordId::new("0a1b2c3d4e5f").is_ok());
        assert!(RecordId::new("lead-2024_01.a~b").is_ok());
    }

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert!(RecordId::new(a.as_str()).is_ok());
    }

    #[test]
    fn rejects_path_components() {
        assert!(RecordId::new("").is_err());
        assert!(RecordId::new(".").is_err());
        assert!(RecordId::new("..").is_err());
        assert!(RecordId::new("a/b").is_err());
        assert!(RecordId::new("a b").is_err());
        assert!(RecordId::new("x".repeat(129)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<RecordId, _> = serde_json::from_str("\"abc\"");
        assert!(ok.is_ok());
        let bad: Result<RecordId, _> = serde_json::from_str("\"a/b\"");
        assert!(bad.is_err());
    }
}
