//! Adapters - concrete implementations of ports (traits)

mod simulated_keystore;
mod simulated_sensor;

pub use simulated_keystore::{SignatureRecord, SimulatedKeyStore};
pub use simulated_sensor::{Presentation, PromptStats, SimulatedSensor};
