//! Hardware-backed, biometric-gated signing key custody
//!
//! A [`SigningCoordinator`] provisions one P-256 signing key per installation
//! in the strongest hardware tier available and only lets it sign after a
//! fresh strong-biometric check. Flow events fold into a [`SecurityState`]
//! through the [`SecurityStateMachine`].
//!
//! Platform key stores and biometric sensors plug in through [`ports`];
//! [`adapters`] provides in-memory simulations of both.

pub mod adapters;
pub mod api;
pub mod config;
pub mod coordinator;
pub mod custodian;
pub mod error;
pub mod flow;
pub mod gate;
pub mod model;
pub mod ports;
pub mod state_machine;
pub mod use_cases;

// Re-export commonly used types
pub use config::CoreConfig;
pub use coordinator::SigningCoordinator;
pub use custodian::KeyCustodian;
pub use error::{AuthError, BiosealError, BiosealResult, ConfigError, KeyError};
pub use flow::FlowStream;
pub use gate::{AuthEvents, AuthenticationGate};
pub use model::{AuthEvent, FlowEvent, FlowKind, SecurityState};
pub use state_machine::SecurityStateMachine;

// Re-export public API
pub use api::{delete_key, key_handle, provision_key, run_flow, simulated_coordinator};
