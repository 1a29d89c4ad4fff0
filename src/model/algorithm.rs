//! Signature algorithm of the custodian's key

use std::fmt;

/// Signature algorithm used by the hardware key
///
/// The custodian manages a single keypair type. The enum exists so the
/// algorithm travels with the handle and can be checked by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// ECDSA over NIST P-256 (secp256r1) with SHA-256, DER-encoded signatures
    #[default]
    EcdsaP256Sha256,
}

impl Algorithm {
    /// Upper bound on the DER signature size in bytes
    pub fn max_signature_len(self) -> usize {
        match self {
            Algorithm::EcdsaP256Sha256 => 72,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::EcdsaP256Sha256 => f.write_str("SHA256withECDSA"),
        }
    }
}
