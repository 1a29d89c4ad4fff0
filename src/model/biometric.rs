//! Values exchanged with the biometric sensor and the key store's
//! authorization machinery

use super::Authenticator;

/// Challenge identifying one prepared private-key operation
///
/// The key store issues it, the sensor binds its auth token to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(pub u64);

/// Proof from the sensor that a user authenticated for a given challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub challenge: OperationId,
    pub authenticator: Authenticator,
}

/// Text shown on the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInfo {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub negative_button: String,
}

impl Default for PromptInfo {
    fn default() -> Self {
        Self {
            title: "Bioseal Authentication".to_string(),
            subtitle: "Verify your identity".to_string(),
            description: "Hardware-backed biometric authentication required".to_string(),
            negative_button: "Cancel".to_string(),
        }
    }
}

/// Whether strong biometric authentication can run right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorAvailability {
    Ready,
    NoHardware,
    HardwareUnavailable,
    NoneEnrolled,
}

impl SensorAvailability {
    /// Reason string reported when the sensor cannot be used
    pub fn unavailable_reason(self) -> Option<&'static str> {
        match self {
            SensorAvailability::Ready => None,
            SensorAvailability::NoHardware => Some("no_hardware"),
            SensorAvailability::HardwareUnavailable => Some("hw_unavailable"),
            SensorAvailability::NoneEnrolled => Some("none_enrolled"),
        }
    }
}

/// Error codes a prompt can close with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// Dismissed by the system (another app, screen off)
    Canceled,
    UserCanceled,
    NegativeButton,
    Lockout,
    LockoutPermanent,
    NoBiometrics,
    HardwareUnavailable,
    Other { code: i32, message: String },
}

/// One result reported by an open prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// A biometric matched; the token authorizes the bound operation
    Succeeded(Option<AuthToken>),
    /// A biometric was presented but did not match; the prompt stays open
    Failed,
    /// The prompt closed with an error
    Error(PromptError),
}
