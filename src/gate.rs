//! Biometric authorization of private-key operations
//!
//! The gate turns one interactive prompt into a finite stream of
//! [`AuthEvent`]s. Before prompting it checks the sensor, claims the handle's
//! prompt slot and prepares a hardware operation; the prompt is bound to that
//! operation's challenge, so a success authorizes exactly one signature.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::custodian::KeyCustodian;
use crate::error::KeyError;
use crate::model::{
    AuthEvent, AuthToken, AuthorizedSigningContext, HardwareKeyHandle, KeyAlias, OperationId,
    PromptError, PromptInfo, PromptOutcome,
};
use crate::ports::{BiometricSensor, HardwareKeyStore};

/// Lazy stream of authorization events
///
/// Nothing happens until it is first polled. Dropping it dismisses the
/// prompt and emits nothing further.
pub type AuthEvents = BoxStream<'static, AuthEvent>;

type ActivePrompts = Arc<Mutex<HashSet<KeyAlias>>>;

/// Wraps the biometric check guarding every private-key operation
pub struct AuthenticationGate<K, S> {
    custodian: Arc<KeyCustodian<K>>,
    sensor: Arc<S>,
    prompt: PromptInfo,
    active: ActivePrompts,
}

impl<K: HardwareKeyStore, S: BiometricSensor> AuthenticationGate<K, S> {
    pub fn new(custodian: Arc<KeyCustodian<K>>, sensor: Arc<S>, config: &CoreConfig) -> Self {
        Self {
            custodian,
            sensor,
            prompt: config.prompt.clone(),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Ask the user to authorize one signature with `handle`
    ///
    /// Yields zero or more `Retryable` events, then exactly one of
    /// `Authorized`, `Canceled`, `LockedOut` or `Unavailable`, then ends.
    pub fn request_authorization(&self, handle: HardwareKeyHandle) -> AuthEvents {
        let start = Start {
            custodian: self.custodian.clone(),
            sensor: self.sensor.clone(),
            prompt: self.prompt.clone(),
            active: self.active.clone(),
            handle,
        };
        stream::unfold(Phase::Start(start), step).boxed()
    }
}

enum Phase<K, S> {
    Start(Start<K, S>),
    Prompting(Prompting),
    Done,
}

struct Start<K, S> {
    custodian: Arc<KeyCustodian<K>>,
    sensor: Arc<S>,
    prompt: PromptInfo,
    active: ActivePrompts,
    handle: HardwareKeyHandle,
}

struct Prompting {
    outcomes: mpsc::Receiver<PromptOutcome>,
    handle: HardwareKeyHandle,
    operation: PendingOperation,
    _slot: PromptSlot,
}

/// A prepared hardware operation, aborted unless handed to a context
struct PendingOperation {
    id: OperationId,
    release: Option<Box<dyn FnOnce(OperationId) + Send>>,
}

impl PendingOperation {
    fn authorize(mut self, handle: HardwareKeyHandle, token: AuthToken) -> Option<AuthorizedSigningContext> {
        let release = self.release.take()?;
        Some(AuthorizedSigningContext::new(handle, self.id, token, release))
    }
}

impl Drop for PendingOperation {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            debug!("Releasing operation {:?}", self.id);
            release(self.id);
        }
    }
}

/// Marks a handle as having a prompt on screen
struct PromptSlot {
    alias: KeyAlias,
    active: ActivePrompts,
}

impl PromptSlot {
    fn claim(active: &ActivePrompts, alias: &KeyAlias) -> Option<Self> {
        let mut prompts = active.lock().unwrap_or_else(PoisonError::into_inner);
        if !prompts.insert(alias.clone()) {
            return None;
        }
        Some(Self {
            alias: alias.clone(),
            active: active.clone(),
        })
    }
}

impl Drop for PromptSlot {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.alias);
    }
}

impl<K: HardwareKeyStore, S: BiometricSensor> Start<K, S> {
    async fn open(self) -> Result<Prompting, AuthEvent> {
        if let Some(reason) = self.sensor.availability().unavailable_reason() {
            info!("Biometric authentication unavailable: {}", reason);
            return Err(AuthEvent::Unavailable(reason.to_string()));
        }

        let slot = PromptSlot::claim(&self.active, self.handle.alias()).ok_or_else(|| {
            warn!("Prompt already active for {}", self.handle.alias());
            AuthEvent::Unavailable("prompt_active".to_string())
        })?;

        let id = self.custodian.begin_signing(&self.handle).map_err(|e| {
            warn!("Cannot prepare signing operation: {}", e);
            match e {
                KeyError::KeyInvalidated { .. } => AuthEvent::Unavailable("key_invalidated".to_string()),
                _ => AuthEvent::Unavailable("key_unavailable".to_string()),
            }
        })?;
        let operation = PendingOperation {
            id,
            release: Some(self.custodian.operation_release()),
        };

        let outcomes = self
            .sensor
            .open_prompt(&self.prompt, operation.id)
            .await
            .map_err(|e| {
                warn!("{}", e);
                AuthEvent::Unavailable("prompt_failed".to_string())
            })?;

        debug!("Prompt open for {}", self.handle.alias());
        Ok(Prompting {
            outcomes,
            handle: self.handle,
            operation,
            _slot: slot,
        })
    }
}

async fn step<K: HardwareKeyStore, S: BiometricSensor>(
    phase: Phase<K, S>,
) -> Option<(AuthEvent, Phase<K, S>)> {
    match phase {
        Phase::Start(start) => match start.open().await {
            Ok(prompting) => next_outcome(prompting).await,
            Err(event) => Some((event, Phase::Done)),
        },
        Phase::Prompting(prompting) => next_outcome(prompting).await,
        Phase::Done => None,
    }
}

async fn next_outcome<K, S>(mut prompting: Prompting) -> Option<(AuthEvent, Phase<K, S>)> {
    let event = match prompting.outcomes.recv().await {
        Some(PromptOutcome::Failed) => {
            debug!("Biometric not recognized, prompt stays open");
            return Some((
                AuthEvent::Retryable("not_recognized".to_string()),
                Phase::Prompting(prompting),
            ));
        }
        Some(PromptOutcome::Succeeded(Some(token))) => {
            info!("Biometric authentication succeeded");
            let Prompting {
                handle, operation, ..
            } = prompting;
            match operation.authorize(handle, token) {
                Some(ctx) => AuthEvent::Authorized(ctx),
                None => AuthEvent::Unavailable("key_unavailable".to_string()),
            }
        }
        Some(PromptOutcome::Succeeded(None)) => {
            warn!("Prompt succeeded without a bound auth token");
            AuthEvent::Unavailable("missing_auth_token".to_string())
        }
        Some(PromptOutcome::Error(error)) => {
            info!("Prompt closed: {:?}", error);
            event_for(error)
        }
        // Sensor went away without reporting
        None => AuthEvent::Canceled,
    };
    Some((event, Phase::Done))
}

fn event_for(error: PromptError) -> AuthEvent {
    match error {
        PromptError::Canceled | PromptError::UserCanceled | PromptError::NegativeButton => {
            AuthEvent::Canceled
        }
        PromptError::Lockout => AuthEvent::LockedOut { permanent: false },
        PromptError::LockoutPermanent => AuthEvent::LockedOut { permanent: true },
        PromptError::NoBiometrics => AuthEvent::Unavailable("none_enrolled".to_string()),
        PromptError::HardwareUnavailable => AuthEvent::Unavailable("hw_unavailable".to_string()),
        PromptError::Other { code, message } => {
            AuthEvent::Unavailable(format!("error {code}: {message}"))
        }
    }
}
