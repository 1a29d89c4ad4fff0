use std::fmt;

use super::{AuthToken, HardwareKeyHandle, OperationId};

type Release = Box<dyn FnOnce(OperationId) + Send>;

/// Capability proving a successful, recent authentication
///
/// Authorizes at most one signature. Only the authentication gate creates
/// one; once consumed (or dropped) a fresh authentication is required.
pub struct AuthorizedSigningContext {
    handle: HardwareKeyHandle,
    operation: OperationId,
    token: AuthToken,
    used: bool,
    release: Option<Release>,
}

impl AuthorizedSigningContext {
    /// `release` runs if the context is dropped without being consumed, so
    /// the store can discard the prepared operation.
    pub(crate) fn new(
        handle: HardwareKeyHandle,
        operation: OperationId,
        token: AuthToken,
        release: Release,
    ) -> Self {
        Self {
            handle,
            operation,
            token,
            used: false,
            release: Some(release),
        }
    }

    pub fn handle(&self) -> &HardwareKeyHandle {
        &self.handle
    }

    /// Mark the context used and hand out what the store needs to sign.
    /// Returns `None` on every call after the first.
    pub(crate) fn consume(&mut self) -> Option<(OperationId, AuthToken)> {
        if self.used {
            return None;
        }
        self.used = true;
        // The store retires the operation when it signs
        self.release = None;
        Some((self.operation, self.token.clone()))
    }
}

impl Drop for AuthorizedSigningContext {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.operation);
        }
    }
}

impl fmt::Debug for AuthorizedSigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedSigningContext")
            .field("alias", self.handle.alias())
            .field("operation", &self.operation)
            .field("used", &self.used)
            .finish()
    }
}
