//! Custody of the installation's hardware-protected signing key
//!
//! The custodian is the single owner of the key store. It decides which
//! security tiers to try, always requests a per-use strong-biometric policy
//! with enrollment invalidation, and refuses to overwrite an existing key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task;
use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::error::{KeyError, KeyStoreError};
use crate::model::{
    AuthorizedSigningContext, HardwareKeyHandle, KeyAlias, OperationId, SecurityTier,
};
use crate::ports::{HardwareKeyStore, KeyGenSpec, KeyStore, StoredKey};

/// Owns the lifecycle of the signing key
pub struct KeyCustodian<K> {
    store: Arc<K>,
    tiers: Vec<SecurityTier>,
    alias_locks: Mutex<HashMap<KeyAlias, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K: HardwareKeyStore> KeyCustodian<K> {
    pub fn new(store: Arc<K>, config: &CoreConfig) -> Self {
        Self {
            store,
            tiers: config.tier_preference(),
            alias_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a key exists under `alias`. No side effects, no authentication.
    pub fn exists(&self, alias: &KeyAlias) -> bool {
        self.store.contains(alias)
    }

    /// Create the key, strongest available tier first
    ///
    /// Only a tier-specific failure moves on to the next tier. Creating an
    /// alias that already exists fails; delete it first to recreate.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if a key is present under `alias`
    /// - `NoHardwareSupport` if every tier reported itself unavailable
    /// - `GenerationFailed` on any other store failure
    pub async fn create(&self, alias: &KeyAlias) -> Result<HardwareKeyHandle, KeyError> {
        // Held until the blocking call returns, even if this future is dropped
        let guard = self.alias_lock(alias).lock_owned().await;

        let store = self.store.clone();
        let alias = alias.clone();
        let tiers = self.tiers.clone();

        task::spawn_blocking(move || {
            let _guard = guard;
            if store.contains(&alias) {
                return Err(KeyError::AlreadyExists {
                    alias: alias.to_string(),
                });
            }
            generate_with_fallback(&*store, &alias, &tiers)
        })
        .await
        .map_err(|e| KeyError::GenerationFailed {
            reason: format!("generation task failed: {e}"),
        })?
    }

    /// Handle to an existing key
    pub fn handle(&self, alias: &KeyAlias) -> Result<HardwareKeyHandle, KeyError> {
        match self.store.load(alias) {
            Ok(Some(stored)) => Ok(handle_from(stored)),
            Ok(None) => Err(KeyError::NotFound {
                alias: alias.to_string(),
            }),
            Err(e) => Err(KeyError::StoreFailed {
                reason: e.to_string(),
            }),
        }
    }

    /// Sign `payload` with the key `ctx` authorizes, consuming `ctx`
    ///
    /// # Errors
    ///
    /// - `ContextExpired` if `ctx` was already used or its operation ended
    /// - `KeyInvalidated` if the key was destroyed by an enrollment change
    /// - `SigningFailed` on hardware faults
    pub async fn sign_with(
        &self,
        ctx: &mut AuthorizedSigningContext,
        payload: &[u8],
    ) -> Result<Vec<u8>, KeyError> {
        let (operation, token) = ctx.consume().ok_or(KeyError::ContextExpired)?;

        let store = self.store.clone();
        let payload = payload.to_vec();
        let result = task::spawn_blocking(move || store.sign(operation, &token, &payload))
            .await
            .map_err(|e| KeyError::SigningFailed {
                reason: format!("signing task failed: {e}"),
            })?;

        match result {
            Ok(signature) => {
                info!(
                    "Signed with {} ({} bytes)",
                    ctx.handle().alias(),
                    signature.len()
                );
                Ok(signature)
            }
            Err(KeyStoreError::OperationUnknown) => Err(KeyError::ContextExpired),
            Err(KeyStoreError::TokenRejected { reason }) => {
                warn!("Auth token rejected by key store: {}", reason);
                Err(KeyError::ContextExpired)
            }
            Err(KeyStoreError::KeyInvalidated { alias }) => Err(KeyError::KeyInvalidated { alias }),
            Err(e) => Err(KeyError::SigningFailed {
                reason: e.to_string(),
            }),
        }
    }

    /// Delete the key under `alias`, returning whether one existed
    pub async fn delete(&self, alias: &KeyAlias) -> Result<bool, KeyError> {
        let guard = self.alias_lock(alias).lock_owned().await;

        let store = self.store.clone();
        let alias = alias.clone();
        task::spawn_blocking(move || {
            let _guard = guard;
            let removed = store.delete(&alias).map_err(|e| KeyError::StoreFailed {
                reason: e.to_string(),
            })?;
            if removed {
                info!("Key {} deleted", alias);
            }
            Ok(removed)
        })
        .await
        .map_err(|e| KeyError::StoreFailed {
            reason: format!("delete task failed: {e}"),
        })?
    }

    /// Prepare a hardware signing operation for `handle`
    pub(crate) fn begin_signing(&self, handle: &HardwareKeyHandle) -> Result<OperationId, KeyError> {
        self.store
            .begin_operation(handle.alias())
            .map_err(|e| match e {
                KeyStoreError::NotFound { alias } => KeyError::NotFound { alias },
                KeyStoreError::KeyInvalidated { alias } => KeyError::KeyInvalidated { alias },
                other => KeyError::StoreFailed {
                    reason: other.to_string(),
                },
            })
    }

    /// Closure discarding a prepared operation; usable after the custodian
    /// is borrowed elsewhere
    pub(crate) fn operation_release(&self) -> Box<dyn FnOnce(OperationId) + Send> {
        let store = self.store.clone();
        Box::new(move |operation| store.abort_operation(operation))
    }

    fn alias_lock(&self, alias: &KeyAlias) -> Arc<tokio::sync::Mutex<()>> {
        self.alias_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(alias.clone())
            .or_default()
            .clone()
    }
}

fn handle_from(stored: StoredKey) -> HardwareKeyHandle {
    HardwareKeyHandle::new(stored.alias, stored.tier, stored.algorithm, stored.public_key)
}

fn generate_with_fallback<K: KeyStore + ?Sized>(
    store: &K,
    alias: &KeyAlias,
    tiers: &[SecurityTier],
) -> Result<HardwareKeyHandle, KeyError> {
    for &tier in tiers {
        let spec = KeyGenSpec::new(alias.clone(), tier);
        debug!("Generating {} at {}", alias, tier);

        match store.generate(&spec) {
            Ok(stored) => {
                if stored.tier.is_hardware() {
                    info!("Key {} generated at {}", alias, stored.tier);
                } else {
                    warn!("Key {} generated without hardware isolation", alias);
                }
                return Ok(handle_from(stored));
            }
            Err(KeyStoreError::TierUnavailable { tier }) => {
                warn!("{} unavailable, trying next tier", tier);
            }
            Err(KeyStoreError::AliasExists { alias }) => {
                return Err(KeyError::AlreadyExists { alias });
            }
            Err(e) => {
                return Err(KeyError::GenerationFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(KeyError::NoHardwareSupport)
}
