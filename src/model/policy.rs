/// Class of authenticator accepted for key use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authenticator {
    /// Class 3 biometric (fingerprint, face) with hardware-backed matching
    BiometricStrong,
    /// PIN, pattern or password
    DeviceCredential,
}

/// How long one successful authentication unlocks the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthValidity {
    /// Every private-key operation needs its own authentication
    PerUse,
    /// Authentication unlocks the key for a number of seconds
    TimeWindow { seconds: u32 },
}

/// Key-use policy requested from the hardware boundary at creation
///
/// The store enforces it; the core only configures it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthPolicy {
    pub authenticator: Authenticator,
    pub validity: AuthValidity,
    /// Destroy the key when the set of enrolled biometrics changes
    pub invalidated_by_enrollment: bool,
}

impl AuthPolicy {
    /// The only policy the custodian ever requests
    pub const fn per_use_biometric() -> Self {
        Self {
            authenticator: Authenticator::BiometricStrong,
            validity: AuthValidity::PerUse,
            invalidated_by_enrollment: true,
        }
    }

    pub fn requires_fresh_auth(&self) -> bool {
        self.validity == AuthValidity::PerUse
    }
}
