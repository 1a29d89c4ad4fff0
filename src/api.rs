use std::sync::Arc;

use crate::adapters::{SimulatedKeyStore, SimulatedSensor};
use crate::config::CoreConfig;
use crate::coordinator::SigningCoordinator;
use crate::error::BiosealResult;
use crate::flow::FlowStream;
use crate::ports::{BiometricSensor, HardwareKeyStore};
use crate::state_machine::SecurityStateMachine;

pub use crate::model::*;

pub type SimulatedCoordinator = SigningCoordinator<SimulatedKeyStore, SimulatedSensor>;

/// Coordinator over the in-memory key store and sensor
///
/// The adapters are returned alongside so callers can inject faults,
/// enrollment changes and presentation scripts.
pub fn simulated_coordinator(
    store: SimulatedKeyStore,
    sensor: SimulatedSensor,
    config: &CoreConfig,
) -> (
    SimulatedCoordinator,
    Arc<SimulatedKeyStore>,
    Arc<SimulatedSensor>,
) {
    let store = Arc::new(store);
    let sensor = Arc::new(sensor);
    let coordinator = SigningCoordinator::new(store.clone(), sensor.clone(), config);
    (coordinator, store, sensor)
}

/// Drive `flow` through `machine`, returning every state from the current one on
pub async fn run_flow(machine: &SecurityStateMachine, flow: FlowStream) -> Vec<SecurityState> {
    machine.drive(flow.kind(), flow).await
}

/// Create the coordinator's key without a flow, failing if it already exists
pub async fn provision_key<K, S>(
    coordinator: &SigningCoordinator<K, S>,
) -> BiosealResult<HardwareKeyHandle>
where
    K: HardwareKeyStore,
    S: BiometricSensor,
{
    Ok(coordinator.custodian().create(coordinator.alias()).await?)
}

/// Handle to the coordinator's key
pub fn key_handle<K, S>(coordinator: &SigningCoordinator<K, S>) -> BiosealResult<HardwareKeyHandle>
where
    K: HardwareKeyStore,
    S: BiometricSensor,
{
    Ok(coordinator.custodian().handle(coordinator.alias())?)
}

/// Delete the coordinator's key, returning whether one existed
pub async fn delete_key<K, S>(coordinator: &SigningCoordinator<K, S>) -> BiosealResult<bool>
where
    K: HardwareKeyStore,
    S: BiometricSensor,
{
    Ok(coordinator.custodian().delete(coordinator.alias()).await?)
}
