//! Domain identifier types with validation
//!
//! Newtype wrappers keep a user identifier from being passed where a data
//! source identifier is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a data source identifier
pub const MAX_SOURCE_LEN: usize = 100;

/// Data source identifier newtype wrapper
///
/// Names the health backend (or manual entry) that produced a day's data,
/// e.g. `"healthkit"` or `"health_connect"`.
///
/// # Examples
///
/// ```
/// use stepsync::domain::ids::SourceId;
/// use std::str::FromStr;
///
/// let source = SourceId::from_str("healthkit").unwrap();
/// assert_eq!(source.as_str(), "healthkit");
/// assert!(SourceId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Creates a new SourceId, trimming surrounding whitespace
    ///
    /// # Returns
    ///
    /// Returns `Err` if the identifier is empty or longer than 100 characters
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err("Source ID cannot be empty".to_string());
        }
        if id.chars().count() > MAX_SOURCE_LEN {
            return Err(format!(
                "Source ID must be at most {MAX_SOURCE_LEN} characters, got {}",
                id.chars().count()
            ));
        }
        Ok(Self(id))
    }

    /// Returns the source ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SourceId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// User identifier newtype wrapper
///
/// Scopes the remote upsert key `(user, date, source)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("User ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the user ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
