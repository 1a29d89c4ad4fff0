//! KeyStore trait - capability to create, look up and delete keys

use crate::error::KeyStoreError;
use crate::model::{Algorithm, AuthPolicy, KeyAlias, SecurityTier};

/// Parameters for one key generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGenSpec {
    /// Alias to store the key under
    pub alias: KeyAlias,
    /// Security tier to generate at; no silent downgrade
    pub tier: SecurityTier,
    /// Algorithm to use
    pub algorithm: Algorithm,
    /// Authentication policy for every use of the private key
    pub auth_policy: AuthPolicy,
}

impl KeyGenSpec {
    pub fn new(alias: KeyAlias, tier: SecurityTier) -> Self {
        Self {
            alias,
            tier,
            algorithm: Algorithm::default(),
            auth_policy: AuthPolicy::per_use_biometric(),
        }
    }
}

/// Public description of a key held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredKey {
    pub alias: KeyAlias,
    /// Tier the key actually lives in, as attested by the store
    pub tier: SecurityTier,
    pub algorithm: Algorithm,
    /// SEC1 encoded public key
    pub public_key: Vec<u8>,
}

/// Capability to manage keys inside a hardware security boundary
///
/// Calls may block on hardware; callers run them off latency-sensitive
/// threads. Implementations must enforce `KeyGenSpec::auth_policy` for every
/// private-key operation.
pub trait KeyStore: Send + Sync + 'static {
    /// Whether a key exists under `alias`. Must not require authentication.
    fn contains(&self, alias: &KeyAlias) -> bool;

    /// Generate a new keypair
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// - The requested tier is unavailable (`TierUnavailable`)
    /// - The alias is already in use (`AliasExists`)
    /// - Key generation fails in hardware
    fn generate(&self, spec: &KeyGenSpec) -> Result<StoredKey, KeyStoreError>;

    /// Look up the public description of a key
    fn load(&self, alias: &KeyAlias) -> Result<Option<StoredKey>, KeyStoreError>;

    /// Delete a key, returning whether one was present
    fn delete(&self, alias: &KeyAlias) -> Result<bool, KeyStoreError>;
}
