//! Gateway API key handling
//!
//! The key is held in a `secrecy::Secret`, so it is zeroized on drop and
//! redacted from `Debug` output. The only place it is exposed is the
//! `Authorization` header built by the HTTP gateway.
//!
//! ```rust
//! use stepsync::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let api_key = secret_string("stk_live_123".to_string());
//! assert_eq!(api_key.expose_secret().as_str(), "stk_live_123");
//! assert!(!format!("{api_key:?}").contains("stk_live_123"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Key material behind a [`SecretString`]
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl SecretValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An unset `${STEPSYNC_API_KEY}` substituted as `""` ends up here
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Bearer key for the remote step store
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string read from config or the environment
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
