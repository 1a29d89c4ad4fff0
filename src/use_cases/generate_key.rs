//! Generate key use case
//!
//! Makes sure the installation's key exists, creating it at the strongest
//! available tier when it does not.

use tracing::{debug, info};

use crate::custodian::KeyCustodian;
use crate::error::KeyError;
use crate::model::{KeyAlias, SecurityTier};
use crate::ports::HardwareKeyStore;

/// What [`ensure_key`] found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyProvisioning {
    AlreadyPresent,
    Created(SecurityTier),
}

impl KeyProvisioning {
    /// Text reported to the presentation layer
    pub fn message(&self) -> String {
        match self {
            KeyProvisioning::AlreadyPresent => "already present".to_string(),
            KeyProvisioning::Created(tier) => format!("created at tier {tier}"),
        }
    }
}

/// Ensure a key exists under `alias`
///
/// A creation that loses a race against a concurrent one counts as present.
///
/// # Errors
///
/// Returns errors if:
/// - No hardware tier could hold the key (`NoHardwareSupport`)
/// - Generation fails for any other reason
pub async fn ensure_key<K: HardwareKeyStore>(
    custodian: &KeyCustodian<K>,
    alias: &KeyAlias,
) -> Result<KeyProvisioning, KeyError> {
    if custodian.exists(alias) {
        debug!("Key {} already present", alias);
        return Ok(KeyProvisioning::AlreadyPresent);
    }

    match custodian.create(alias).await {
        Ok(handle) => {
            info!("Provisioned {} ({})", alias, handle.fingerprint());
            Ok(KeyProvisioning::Created(handle.tier()))
        }
        Err(KeyError::AlreadyExists { .. }) => Ok(KeyProvisioning::AlreadyPresent),
        Err(e) => Err(e),
    }
}
