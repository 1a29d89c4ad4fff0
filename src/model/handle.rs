use sha2::{Digest, Sha256};

use super::{Algorithm, KeyAlias, SecurityTier};

/// Reference to a private key living inside the hardware security boundary
///
/// Carries no key material. The public key is kept so callers can verify
/// signatures produced through the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareKeyHandle {
    alias: KeyAlias,
    tier: SecurityTier,
    algorithm: Algorithm,
    public_key: Vec<u8>,
}

impl HardwareKeyHandle {
    pub fn new(
        alias: KeyAlias,
        tier: SecurityTier,
        algorithm: Algorithm,
        public_key: Vec<u8>,
    ) -> Self {
        Self {
            alias,
            tier,
            algorithm,
            public_key,
        }
    }

    pub fn alias(&self) -> &KeyAlias {
        &self.alias
    }

    pub fn tier(&self) -> SecurityTier {
        self.tier
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// SEC1 encoded public key
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// First 8 bytes of SHA-256 over the public key, hex encoded
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.public_key);
        hex::encode(&digest[..8])
    }
}
