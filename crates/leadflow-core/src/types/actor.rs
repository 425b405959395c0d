//! Actor identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

/// Identifies the person acting on a record, usually an email address.
///
/// Actor ids are plain strings and are not checked against any directory.
/// They must be non-empty and contain no whitespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorId(String);

impl ActorId {
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        if s.is_empty() {
            return Err(ValidationError::Actor {
                value: s,
                reason: "cannot be empty".to_string(),
            }
            .into());
        }
        if s.chars().any(char::is_whitespace) {
            return Err(ValidationError::Actor {
                value: s,
                reason: "cannot contain whitespace".to_string(),
            }
            .into());
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ActorId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ActorId> for String {
    fn from(actor: ActorId) -> Self {
        actor.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_valid_actors() {
        let actor = ActorId::new("priya@example.com").unwrap();
        assert_eq!(actor.as_str(), "priya@example.com");
    }

    #[test]
    fn rejects_blank_actor() {
        assert!(ActorId::new("").is_err());
        assert!(ActorId::new("a b").is_err());
    }
}
