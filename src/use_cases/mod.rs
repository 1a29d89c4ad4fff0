//! Use cases (orchestration)
//!
//! Each use case drives the custodian and the gate through one user-visible
//! operation. The coordinator wraps them into flow streams.

mod authenticate;
mod generate_key;

pub use authenticate::{authorize_and_sign, probe_message};
pub use generate_key::{ensure_key, KeyProvisioning};
