use super::AuthorizedSigningContext;

/// One step of an authorization request
///
/// A request yields any number of `Retryable` events followed by exactly one
/// terminal event.
#[derive(Debug)]
pub enum AuthEvent {
    /// A biometric was presented but not recognized; the prompt stays open
    Retryable(String),
    Authorized(AuthorizedSigningContext),
    Canceled,
    /// Too many failed attempts. `permanent` lockouts need the device
    /// credential to clear.
    LockedOut { permanent: bool },
    /// Preconditions for prompting are not met (`no_hardware`,
    /// `hw_unavailable`, `none_enrolled`, ...)
    Unavailable(String),
}

impl AuthEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthEvent::Retryable(_))
    }
}
