//! In-memory implementation of the hardware key store ports
//!
//! Behaves like a platform key store with configurable security tiers:
//! keys are real P-256 keys, every signature needs a per-use auth token bound
//! to a single-use operation, and a biometric enrollment change destroys
//! enrollment-bound keys. Used by the CLI and by tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use tracing::{debug, info, warn};

use crate::error::KeyStoreError;
use crate::model::{AuthPolicy, AuthToken, KeyAlias, OperationId, SecurityTier};
use crate::ports::{KeyGenSpec, KeyStore, OperationSigner, StoredKey};

struct SimulatedKey {
    stored: StoredKey,
    signing_key: SigningKey,
    policy: AuthPolicy,
}

#[derive(Default)]
struct Inner {
    supported_tiers: Vec<SecurityTier>,
    generation_fault: Option<String>,
    signing_fault: Option<String>,
    keys: HashMap<KeyAlias, SimulatedKey>,
    invalidated: HashSet<KeyAlias>,
    operations: HashMap<OperationId, KeyAlias>,
    generation_requests: Vec<KeyGenSpec>,
    signatures: Vec<SignatureRecord>,
}

/// A signature the store produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub alias: KeyAlias,
    pub payload: Vec<u8>,
    /// DER-encoded ECDSA signature
    pub signature: Vec<u8>,
}

/// Software stand-in for a device key store
pub struct SimulatedKeyStore {
    inner: Mutex<Inner>,
}

impl SimulatedKeyStore {
    /// Store supporting every security tier
    pub fn new() -> Self {
        Self::with_tiers(&[
            SecurityTier::HardwareSecurityModule,
            SecurityTier::TrustedExecutionEnvironment,
            SecurityTier::SoftwareFallback,
        ])
    }

    /// Store supporting only `tiers`
    pub fn with_tiers(tiers: &[SecurityTier]) -> Self {
        Self {
            inner: Mutex::new(Inner {
                supported_tiers: tiers.to_vec(),
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent generation fail with a hardware fault
    pub fn fail_generation(&self, reason: impl Into<String>) {
        self.lock().generation_fault = Some(reason.into());
    }

    /// Make every subsequent signature fail with a hardware fault
    pub fn fail_signing(&self, reason: impl Into<String>) {
        self.lock().signing_fault = Some(reason.into());
    }

    /// Simulate the user enrolling or removing a biometric
    ///
    /// Destroys every key created with `invalidated_by_enrollment` and
    /// retires their pending operations. Returns how many keys were destroyed.
    pub fn change_biometric_enrollment(&self) -> usize {
        let mut inner = self.lock();
        let doomed: Vec<KeyAlias> = inner
            .keys
            .iter()
            .filter(|(_, key)| key.policy.invalidated_by_enrollment)
            .map(|(alias, _)| alias.clone())
            .collect();

        for alias in &doomed {
            inner.keys.remove(alias);
            inner.invalidated.insert(alias.clone());
        }
        inner.operations.retain(|_, alias| !doomed.contains(alias));

        warn!("Biometric enrollment changed, {} key(s) invalidated", doomed.len());
        doomed.len()
    }

    /// Every `KeyGenSpec` passed to `generate`, in order
    pub fn generation_requests(&self) -> Vec<KeyGenSpec> {
        self.lock().generation_requests.clone()
    }

    /// Every signature produced, oldest first
    pub fn signatures(&self) -> Vec<SignatureRecord> {
        self.lock().signatures.clone()
    }

    /// Number of prepared operations not yet signed or aborted
    pub fn pending_operations(&self) -> usize {
        self.lock().operations.len()
    }
}

impl Default for SimulatedKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for SimulatedKeyStore {
    fn contains(&self, alias: &KeyAlias) -> bool {
        self.lock().keys.contains_key(alias)
    }

    fn generate(&self, spec: &KeyGenSpec) -> Result<StoredKey, KeyStoreError> {
        let mut inner = self.lock();
        inner.generation_requests.push(spec.clone());

        if inner.keys.contains_key(&spec.alias) {
            return Err(KeyStoreError::AliasExists {
                alias: spec.alias.to_string(),
            });
        }

        if !inner.supported_tiers.contains(&spec.tier) {
            debug!("Tier {} not supported by simulated store", spec.tier);
            return Err(KeyStoreError::TierUnavailable { tier: spec.tier });
        }

        if let Some(reason) = &inner.generation_fault {
            return Err(KeyStoreError::Hardware {
                reason: reason.clone(),
            });
        }

        let signing_key = SigningKey::random(&mut OsRng);
        let public_key = VerifyingKey::from(&signing_key)
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();

        let stored = StoredKey {
            alias: spec.alias.clone(),
            tier: spec.tier,
            algorithm: spec.algorithm,
            public_key,
        };

        inner.invalidated.remove(&spec.alias);
        inner.keys.insert(
            spec.alias.clone(),
            SimulatedKey {
                stored: stored.clone(),
                signing_key,
                policy: spec.auth_policy,
            },
        );

        info!("Simulated key generated for {} at {}", spec.alias, spec.tier);
        Ok(stored)
    }

    fn load(&self, alias: &KeyAlias) -> Result<Option<StoredKey>, KeyStoreError> {
        Ok(self.lock().keys.get(alias).map(|key| key.stored.clone()))
    }

    fn delete(&self, alias: &KeyAlias) -> Result<bool, KeyStoreError> {
        let mut inner = self.lock();
        inner.invalidated.remove(alias);
        inner.operations.retain(|_, op_alias| op_alias != alias);
        Ok(inner.keys.remove(alias).is_some())
    }
}

impl OperationSigner for SimulatedKeyStore {
    fn begin_operation(&self, alias: &KeyAlias) -> Result<OperationId, KeyStoreError> {
        let mut inner = self.lock();

        if inner.invalidated.contains(alias) {
            return Err(KeyStoreError::KeyInvalidated {
                alias: alias.to_string(),
            });
        }
        if !inner.keys.contains_key(alias) {
            return Err(KeyStoreError::NotFound {
                alias: alias.to_string(),
            });
        }

        let mut operation = OperationId(rand::random());
        while inner.operations.contains_key(&operation) {
            operation = OperationId(rand::random());
        }
        inner.operations.insert(operation, alias.clone());

        debug!("Operation {:?} prepared for {}", operation, alias);
        Ok(operation)
    }

    fn sign(
        &self,
        operation: OperationId,
        token: &AuthToken,
        payload: &[u8],
    ) -> Result<Vec<u8>, KeyStoreError> {
        let mut inner = self.lock();

        let alias = inner
            .operations
            .remove(&operation)
            .ok_or(KeyStoreError::OperationUnknown)?;

        let key = inner.keys.get(&alias).ok_or(KeyStoreError::OperationUnknown)?;

        if key.policy.requires_fresh_auth() && token.challenge != operation {
            return Err(KeyStoreError::TokenRejected {
                reason: "token bound to a different operation".to_string(),
            });
        }

        if token.authenticator != key.policy.authenticator {
            return Err(KeyStoreError::TokenRejected {
                reason: format!("{:?} does not satisfy key policy", token.authenticator),
            });
        }

        if let Some(reason) = &inner.signing_fault {
            return Err(KeyStoreError::Hardware {
                reason: reason.clone(),
            });
        }

        let signature: Signature = key.signing_key.sign(payload);
        let signature = signature.to_der().as_bytes().to_vec();
        inner.signatures.push(SignatureRecord {
            alias,
            payload: payload.to_vec(),
            signature: signature.clone(),
        });
        Ok(signature)
    }

    fn abort_operation(&self, operation: OperationId) {
        if self.lock().operations.remove(&operation).is_some() {
            debug!("Operation {:?} aborted", operation);
        }
    }
}
