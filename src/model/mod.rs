mod algorithm;
mod alias;
mod auth_event;
mod biometric;
mod context;
mod handle;
mod policy;
mod state;
mod tier;

pub use algorithm::Algorithm;
pub use alias::{KeyAlias, KeyAliasError};
pub use auth_event::AuthEvent;
pub use biometric::{
    AuthToken, OperationId, PromptError, PromptInfo, PromptOutcome, SensorAvailability,
};
pub use context::AuthorizedSigningContext;
pub use handle::HardwareKeyHandle;
pub use policy::{AuthPolicy, AuthValidity, Authenticator};
pub use state::{FlowEvent, FlowKind, SecurityState};
pub use tier::SecurityTier;
