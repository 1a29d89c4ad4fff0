//! Security state for the presentation layer
//!
//! Folds coordinator flow events into the single [`SecurityState`] a UI
//! renders, and publishes every transition on a `watch` channel.

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tracing::debug;

use crate::model::{FlowEvent, FlowKind, SecurityState};

pub struct SecurityStateMachine {
    state: watch::Sender<SecurityState>,
}

impl SecurityStateMachine {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SecurityState::Idle);
        Self { state }
    }

    pub fn current(&self) -> SecurityState {
        self.state.borrow().clone()
    }

    /// Receiver observing every published state
    pub fn subscribe(&self) -> watch::Receiver<SecurityState> {
        self.state.subscribe()
    }

    /// Apply one flow event, returning the new state if it caused a transition
    ///
    /// `Provisioned` never transitions: provisioning is part of the ongoing
    /// `Loading`.
    pub fn apply(&self, kind: FlowKind, event: &FlowEvent) -> Option<SecurityState> {
        let next = match (kind, event) {
            (_, FlowEvent::Loading) => SecurityState::Loading,
            (_, FlowEvent::Provisioned(_)) => return None,
            (FlowKind::Bootstrap | FlowKind::Generate, FlowEvent::Success(_)) => {
                SecurityState::Locked
            }
            (FlowKind::Authenticate, FlowEvent::Success(detail)) => {
                SecurityState::Verified(detail.clone())
            }
            (_, FlowEvent::Error(detail)) => SecurityState::Error(detail.clone()),
        };

        debug!("{:?} {:?} -> {}", kind, event, next);
        self.state.send_replace(next.clone());
        Some(next)
    }

    /// Run a flow to completion, returning the starting state followed by
    /// every state it produced
    pub async fn drive<St>(&self, kind: FlowKind, mut flow: St) -> Vec<SecurityState>
    where
        St: Stream<Item = FlowEvent> + Unpin,
    {
        let mut states = vec![self.current()];
        while let Some(event) = flow.next().await {
            if let Some(state) = self.apply(kind, &event) {
                states.push(state);
            }
        }
        states
    }

    /// Back to `Idle`, as at the start of a new user session
    pub fn reset(&self) {
        self.state.send_replace(SecurityState::Idle);
    }
}

impl Default for SecurityStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
