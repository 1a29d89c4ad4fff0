//! BiometricSensor trait - capability to run an interactive biometric prompt

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SensorError;
use crate::model::{OperationId, PromptInfo, PromptOutcome, SensorAvailability};

/// Capability to authenticate the user with a strong biometric
#[async_trait]
pub trait BiometricSensor: Send + Sync + 'static {
    /// Current availability of strong biometric authentication
    fn availability(&self) -> SensorAvailability;

    /// Show a prompt bound to `challenge`
    ///
    /// The returned channel carries `PromptOutcome::Failed` for every
    /// unrecognized presentation, then one closing outcome. Successful
    /// outcomes carry a token for `challenge`. Dropping the receiver must
    /// dismiss the prompt.
    async fn open_prompt(
        &self,
        info: &PromptInfo,
        challenge: OperationId,
    ) -> Result<mpsc::Receiver<PromptOutcome>, SensorError>;
}
