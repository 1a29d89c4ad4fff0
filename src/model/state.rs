use std::fmt;

/// What the presentation layer renders
///
/// Exactly one is current at any time. `Verified` and `Error` carry a
/// human-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SecurityState {
    /// No key check has run yet
    #[default]
    Idle,
    /// A coordinator flow is in progress
    Loading,
    /// Key exists, user not yet authenticated this session
    Locked,
    /// Authentication succeeded this session
    Verified(String),
    /// Last operation failed; the user may retry
    Error(String),
}

impl fmt::Display for SecurityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityState::Idle => f.write_str("idle"),
            SecurityState::Loading => f.write_str("loading"),
            SecurityState::Locked => f.write_str("locked"),
            SecurityState::Verified(detail) => write!(f, "verified: {detail}"),
            SecurityState::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

/// Which coordinator flow produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// Key check run once at startup
    Bootstrap,
    Generate,
    Authenticate,
}

/// Emission of a coordinator flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    Loading,
    /// The key was provisioned as the first step of an authenticate flow
    Provisioned(String),
    Success(String),
    Error(String),
}
