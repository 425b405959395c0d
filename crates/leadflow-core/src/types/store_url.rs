//! Store location type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, ValidationError};

/// Where a document store lives.
///
/// Two schemes are understood:
///
/// - `file:///path/to/store` selects the filesystem-backed store.
/// - `memory://` selects an in-process store, useful for demos and tests.
///
/// # Example
///
/// ```
/// use leadflow_core::StoreUrl;
///
/// let local = StoreUrl::new("file:///tmp/leadflow").unwrap();
/// assert!(local.is_file());
///
/// let mem = StoreUrl::new("memory://").unwrap();
/// assert!(mem.is_memory());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreUrl(Url);

impl StoreUrl {
    /// Create a new store URL from a string, validating the format.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| ValidationError::StoreUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Build a `file://` URL from an absolute directory path.
    pub fn from_directory(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let url = Url::from_directory_path(path).map_err(|_| ValidationError::StoreUrl {
            value: path.display().to_string(),
            reason: "path must be absolute".to_string(),
        })?;
        Ok(Self(url))
    }

    /// Returns the URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the URL scheme.
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Returns true for `file://` stores.
    pub fn is_file(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// Returns true for `memory://` stores.
    pub fn is_memory(&self) -> bool {
        self.0.scheme() == "memory"
    }

    /// Returns the filesystem path for `file://` URLs.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.is_file() {
            self.0.to_file_path().ok()
        } else {
            None
        }
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        match url.scheme() {
            "memory" => Ok(()),
            "file" => {
                if url.path().is_empty() || url.path() == "/" {
                    return Err(ValidationError::StoreUrl {
                        value: original.to_string(),
                        reason: "file:// URL must name a directory".to_string(),
                    }
                    .into());
                }
                Ok(())
            }
            other => Err(ValidationError::StoreUrl {
                value: original.to_string(),
                reason: format!("unsupported scheme '{}' (expected file or memory)", other),
            }
            .into()),
        }
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoreUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for StoreUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for StoreUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StoreUrl::new(&s).map_err(serde::de::Error::custom)
    }
}
