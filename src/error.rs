//! Error types for bioseal
//!
//! This module defines the error hierarchy for all bioseal operations.
//! Port-level errors (`KeyStoreError`, `SensorError`) describe what the
//! hardware collaborators report; `KeyError` is what the custodian hands to
//! its callers. Errors are organized hierarchically and use thiserror.

use thiserror::Error;

use crate::model::{KeyAliasError, SecurityTier};

/// Result type alias for bioseal operations
///
/// This is a convenience alias for `Result<T, BiosealError>`.
pub type BiosealResult<T> = Result<T, BiosealError>;

/// Top-level error type for all bioseal operations
#[derive(Error, Debug)]
pub enum BiosealError {
    /// Key custody errors
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Why an authenticate flow did not verify the user
///
/// The display text is what the presentation layer shows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("User canceled")]
    Canceled,

    #[error("Too many attempts - locked out")]
    LockedOut,

    #[error("Permanently locked out")]
    PermanentlyLockedOut,

    /// Prompt could not run; carries the machine-readable reason
    #[error("{0}")]
    Unavailable(String),

    #[error("Authentication ended without a result")]
    Interrupted,
}

/// Errors surfaced by the key custodian
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Neither the hardware security module nor the trusted execution
    /// environment could produce a key
    #[error("No hardware-backed key storage available on this device")]
    NoHardwareSupport,

    /// Handle requested before the key was created
    #[error("No key found for alias: {alias}")]
    NotFound { alias: String },

    /// Key already present, caller must delete before recreating
    #[error("A key already exists for alias: {alias}")]
    AlreadyExists { alias: String },

    /// Authorized context reused or its authentication session ended
    #[error("Authorization expired - authenticate again")]
    ContextExpired,

    /// Biometric enrollment changed and the key is permanently unusable
    #[error("Key {alias} was invalidated by a biometric enrollment change")]
    KeyInvalidated { alias: String },

    /// Key generation failed for a reason unrelated to the security tier
    #[error("Key generation failed: {reason}")]
    GenerationFailed { reason: String },

    /// Low-level hardware fault during signing
    #[error("Signing failed: {reason}")]
    SigningFailed { reason: String },

    /// Key store could not complete a lookup or deletion
    #[error("Key store failure: {reason}")]
    StoreFailed { reason: String },
}

/// Errors reported by a hardware key store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyStoreError {
    /// The requested security tier is not available on this device
    #[error("Security tier unavailable: {tier}")]
    TierUnavailable { tier: SecurityTier },

    #[error("Alias already in use: {alias}")]
    AliasExists { alias: String },

    #[error("Alias not found: {alias}")]
    NotFound { alias: String },

    #[error("Key permanently invalidated: {alias}")]
    KeyInvalidated { alias: String },

    /// No pending operation matches the given id (used, aborted or never begun)
    #[error("Unknown or finished key operation")]
    OperationUnknown,

    /// The presented auth token does not satisfy the key's policy
    #[error("Authentication token rejected: {reason}")]
    TokenRejected { reason: String },

    #[error("Hardware failure: {reason}")]
    Hardware { reason: String },
}

/// Errors reported by a biometric sensor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The prompt could not be shown
    #[error("Failed to show biometric prompt: {reason}")]
    PromptFailed { reason: String },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid key alias: {0}")]
    Alias(#[from] KeyAliasError),

    #[error("Probe payload must not be empty")]
    EmptyProbePayload,
}

/// Convert model errors to BiosealError (via ConfigError)
impl From<KeyAliasError> for BiosealError {
    fn from(err: KeyAliasError) -> Self {
        BiosealError::Config(ConfigError::Alias(err))
    }
}
