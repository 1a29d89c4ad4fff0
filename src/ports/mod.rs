//! Ports (traits) for the hardware collaborators
//!
//! The core depends on these abstractions, not on any platform key store or
//! biometric API. Adapters implement them.

mod biometric_sensor;
pub mod contract_tests;
mod key_store;
mod signer;

pub use biometric_sensor::BiometricSensor;
pub use key_store::{KeyGenSpec, KeyStore, StoredKey};
pub use signer::OperationSigner;

/// Combined capability of a hardware key store
///
/// A platform key store typically implements both halves.
pub trait HardwareKeyStore: KeyStore + OperationSigner {}

// Blanket implementation for types that implement both traits
impl<T> HardwareKeyStore for T where T: KeyStore + OperationSigner {}
