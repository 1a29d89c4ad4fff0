//! OperationSigner trait - capability to sign with an authorization-bound key

use crate::error::KeyStoreError;
use crate::model::{AuthToken, KeyAlias, OperationId};

/// Capability to sign data with a key whose use requires authentication
///
/// Signing is split in two steps. `begin_operation` prepares a single-use
/// operation and returns its challenge, which the biometric prompt binds its
/// auth token to. `sign` consumes the operation.
pub trait OperationSigner: Send + Sync + 'static {
    /// Prepare a signing operation with the key under `alias`
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// - No key exists under `alias`
    /// - The key was invalidated by an enrollment change
    fn begin_operation(&self, alias: &KeyAlias) -> Result<OperationId, KeyStoreError>;

    /// Sign `payload` within a prepared operation
    ///
    /// The operation is retired whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// - The operation is unknown, already used or aborted (`OperationUnknown`)
    /// - The token does not match the operation or the key's policy
    /// - The hardware fails
    fn sign(
        &self,
        operation: OperationId,
        token: &AuthToken,
        payload: &[u8],
    ) -> Result<Vec<u8>, KeyStoreError>;

    /// Discard a prepared operation. Unknown ids are ignored.
    fn abort_operation(&self, operation: OperationId);
}
