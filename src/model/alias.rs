use std::fmt;
use thiserror::Error;

/// Identifier of the key inside the hardware key store
///
/// Immutable once created. Restricted to a conservative character set so it
/// can be passed unchanged to any platform key store.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyAlias(String);

impl KeyAlias {
    pub const DEFAULT: &'static str = "bioseal_hardware_key";

    pub const MAX_LENGTH: usize = 64;

    pub fn new(alias: impl Into<String>) -> Result<Self, KeyAliasError> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(KeyAliasError::Empty);
        }
        if alias.len() > Self::MAX_LENGTH {
            return Err(KeyAliasError::TooLong);
        }
        if let Some(c) = alias
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(KeyAliasError::InvalidCharacter(c));
        }
        Ok(Self(alias))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for KeyAlias {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl TryFrom<&str> for KeyAlias {
    type Error = KeyAliasError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for KeyAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for KeyAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyAlias({})", self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAliasError {
    #[error("alias must not be empty")]
    Empty,

    #[error("alias must be at most {max} characters", max = KeyAlias::MAX_LENGTH)]
    TooLong,

    #[error("alias contains invalid character {0:?}")]
    InvalidCharacter(char),
}
