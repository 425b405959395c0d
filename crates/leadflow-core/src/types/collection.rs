//! Collection name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

/// The name of a shared collection (e.g. `leads`, `hackathon_registrations`).
///
/// Names are 1-64 characters, start with a lowercase ASCII letter and
/// otherwise contain only lowercase letters, digits, `-` and `_`.
///
/// # Example
///
/// ```
/// use leadflow_core::CollectionName;
///
/// let leads = CollectionName::new("leads").unwrap();
/// assert_eq!(leads.as_str(), "leads");
/// assert!(CollectionName::new("Leads").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Create a new collection name, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the collection name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let reject = |reason: String| -> Error {
            ValidationError::Collection {
                value: s.to_string(),
                reason,
            }
            .into()
        };

        let Some(first) = s.chars().next() else {
            return Err(reject("cannot be empty".to_string()));
        };

        if s.len() > 64 {
            return Err(reject("exceeds maximum length of 64 characters".to_string()));
        }

        if !first.is_ascii_lowercase() {
            return Err(reject("must start with a lowercase letter".to_string()));
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(reject(format!("contains invalid character '{}'", c)));
        }

        Ok(())
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
