//! Scripted implementation of the biometric sensor port
//!
//! Each prompt replays the configured presentation script: a list of what
//! the "user" does, one entry per presentation. Prompt lifecycle counters let
//! callers check that prompts get dismissed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SensorError;
use crate::model::{
    AuthToken, Authenticator, OperationId, PromptError, PromptInfo, PromptOutcome,
    SensorAvailability,
};
use crate::ports::BiometricSensor;

/// What the simulated user does when prompted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// Present a biometric that does not match
    Reject,
    /// Present a matching biometric
    Accept,
    /// Match, but the platform reports no crypto binding
    AcceptUnbound,
    /// Dismiss via the system back gesture
    Cancel,
    /// Press the negative button
    NegativeButton,
    Lockout,
    LockoutPermanent,
    /// Never answer; the prompt stays open until dismissed by the caller
    Hang,
    Error { code: i32, message: String },
}

/// Prompt lifecycle counters
#[derive(Debug, Default)]
pub struct PromptStats {
    opened: AtomicUsize,
    active: AtomicUsize,
    dismissed: AtomicUsize,
}

impl PromptStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Prompts currently on screen
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Prompts torn down by the caller before they closed on their own
    pub fn dismissed(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }
}

struct ActivePrompt(Arc<PromptStats>);

impl Drop for ActivePrompt {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Software stand-in for the device's biometric sensor
pub struct SimulatedSensor {
    availability: Mutex<SensorAvailability>,
    script: Mutex<Vec<Presentation>>,
    stats: Arc<PromptStats>,
}

impl SimulatedSensor {
    /// Ready sensor that accepts the first presentation
    pub fn new() -> Self {
        Self::with_script(vec![Presentation::Accept])
    }

    pub fn with_script(script: Vec<Presentation>) -> Self {
        Self {
            availability: Mutex::new(SensorAvailability::Ready),
            script: Mutex::new(script),
            stats: Arc::new(PromptStats::default()),
        }
    }

    pub fn with_availability(availability: SensorAvailability) -> Self {
        let sensor = Self::new();
        sensor.set_availability(availability);
        sensor
    }

    pub fn set_availability(&self, availability: SensorAvailability) {
        *self
            .availability
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = availability;
    }

    /// Script used by prompts opened from now on
    pub fn set_script(&self, script: Vec<Presentation>) {
        *self.script.lock().unwrap_or_else(PoisonError::into_inner) = script;
    }

    pub fn stats(&self) -> Arc<PromptStats> {
        self.stats.clone()
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

fn outcome_for(presentation: &Presentation, challenge: OperationId) -> Option<PromptOutcome> {
    let outcome = match presentation {
        Presentation::Reject => PromptOutcome::Failed,
        Presentation::Accept => PromptOutcome::Succeeded(Some(AuthToken {
            challenge,
            authenticator: Authenticator::BiometricStrong,
        })),
        Presentation::AcceptUnbound => PromptOutcome::Succeeded(None),
        Presentation::Cancel => PromptOutcome::Error(PromptError::UserCanceled),
        Presentation::NegativeButton => PromptOutcome::Error(PromptError::NegativeButton),
        Presentation::Lockout => PromptOutcome::Error(PromptError::Lockout),
        Presentation::LockoutPermanent => PromptOutcome::Error(PromptError::LockoutPermanent),
        Presentation::Error { code, message } => PromptOutcome::Error(PromptError::Other {
            code: *code,
            message: message.clone(),
        }),
        Presentation::Hang => return None,
    };
    Some(outcome)
}

#[async_trait]
impl BiometricSensor for SimulatedSensor {
    fn availability(&self) -> SensorAvailability {
        *self
            .availability
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn open_prompt(
        &self,
        info: &PromptInfo,
        challenge: OperationId,
    ) -> Result<mpsc::Receiver<PromptOutcome>, SensorError> {
        let availability = self.availability();
        if let Some(reason) = availability.unavailable_reason() {
            return Err(SensorError::PromptFailed {
                reason: reason.to_string(),
            });
        }

        let script = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let (tx, rx) = mpsc::channel(script.len().max(1));

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        self.stats.active.fetch_add(1, Ordering::SeqCst);
        let active = ActivePrompt(self.stats.clone());
        debug!("Prompt shown: {}", info.title);

        tokio::spawn(async move {
            let stats = active.0.clone();
            let _active = active;

            for presentation in &script {
                let Some(outcome) = outcome_for(presentation, challenge) else {
                    break;
                };
                let closing = !matches!(outcome, PromptOutcome::Failed);
                if tx.send(outcome).await.is_err() {
                    stats.dismissed.fetch_add(1, Ordering::SeqCst);
                    return;
                }
                if closing {
                    return;
                }
            }

            // Out of script: the prompt stays up until the caller goes away
            tx.closed().await;
            stats.dismissed.fetch_add(1, Ordering::SeqCst);
            debug!("Prompt dismissed");
        });

        Ok(rx)
    }
}
