//! Flow orchestration for the presentation layer
//!
//! The coordinator exposes the user-visible operations as [`FlowStream`]s:
//! startup key check, key generation and authentication. At most one
//! generate-or-bootstrap flow and one authenticate flow run at a time; a
//! request made while its kind is in flight is answered with `Error("busy")`.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::custodian::KeyCustodian;
use crate::flow::{FlowEmitter, FlowGuard, FlowStream};
use crate::gate::AuthenticationGate;
use crate::model::{FlowEvent, FlowKind, KeyAlias};
use crate::ports::{BiometricSensor, HardwareKeyStore};
use crate::use_cases::{authorize_and_sign, ensure_key, probe_message, KeyProvisioning};

/// Message of the event answering a request made while busy
pub const BUSY: &str = "busy";

pub struct SigningCoordinator<K, S> {
    custodian: Arc<KeyCustodian<K>>,
    gate: Arc<AuthenticationGate<K, S>>,
    alias: KeyAlias,
    probe_payload: Arc<[u8]>,
    generating: Arc<AtomicBool>,
    authenticating: Arc<AtomicBool>,
}

impl<K: HardwareKeyStore, S: BiometricSensor> SigningCoordinator<K, S> {
    pub fn new(store: Arc<K>, sensor: Arc<S>, config: &CoreConfig) -> Self {
        let custodian = Arc::new(KeyCustodian::new(store, config));
        let gate = Arc::new(AuthenticationGate::new(custodian.clone(), sensor, config));
        Self {
            custodian,
            gate,
            alias: config.alias.clone(),
            probe_payload: config.probe_payload.clone().into(),
            generating: Arc::new(AtomicBool::new(false)),
            authenticating: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn custodian(&self) -> &KeyCustodian<K> {
        &self.custodian
    }

    pub fn alias(&self) -> &KeyAlias {
        &self.alias
    }

    pub fn has_key(&self) -> bool {
        self.custodian.exists(&self.alias)
    }

    /// Startup key check: creates the key if it is missing
    pub fn bootstrap(&self) -> FlowStream {
        self.key_flow(FlowKind::Bootstrap)
    }

    /// `Loading`, then `Success` or `Error`
    pub fn generate(&self) -> FlowStream {
        self.key_flow(FlowKind::Generate)
    }

    /// Verify the user by signing the probe payload
    ///
    /// Provisions the key first when it is missing, reporting that step as
    /// `Loading` followed by `Provisioned`. Then `Loading`, and finally
    /// `Success("authenticated, signature length = N")` or a single `Error`.
    /// There is no automatic retry after a terminal failure.
    pub fn authenticate(&self) -> FlowStream {
        let kind = FlowKind::Authenticate;
        let Some(guard) = FlowGuard::acquire(&self.authenticating) else {
            warn!("Authenticate requested while one is in flight");
            return FlowStream::single(kind, FlowEvent::Error(BUSY.to_string()));
        };

        let custodian = self.custodian.clone();
        let gate = self.gate.clone();
        let alias = self.alias.clone();
        let payload = self.probe_payload.clone();

        FlowStream::new(kind, move |out| async move {
            let _guard = guard;

            if !custodian.exists(&alias) {
                out.emit(FlowEvent::Loading);
                match ensure_key(&custodian, &alias).await {
                    Ok(provisioning @ KeyProvisioning::Created(_)) => {
                        out.emit(FlowEvent::Provisioned(provisioning.message()))
                    }
                    // A concurrent flow created it first
                    Ok(KeyProvisioning::AlreadyPresent) => {
                        debug!("Key {} appeared while provisioning", alias)
                    }
                    Err(e) => {
                        warn!("Provisioning before authentication failed: {}", e);
                        out.emit(FlowEvent::Error(e.to_string()));
                        return;
                    }
                }
            }

            out.emit(FlowEvent::Loading);
            match authorize_and_sign(&custodian, &gate, &alias, &payload).await {
                Ok(signature) => {
                    info!("User verified");
                    out.emit(FlowEvent::Success(probe_message(&signature)));
                }
                Err(e) => {
                    warn!("Authentication failed: {}", e);
                    out.emit(FlowEvent::Error(e.to_string()));
                }
            }
        })
    }

    fn key_flow(&self, kind: FlowKind) -> FlowStream {
        let Some(guard) = FlowGuard::acquire(&self.generating) else {
            warn!("{:?} requested while key generation is in flight", kind);
            return FlowStream::single(kind, FlowEvent::Error(BUSY.to_string()));
        };

        let custodian = self.custodian.clone();
        let alias = self.alias.clone();

        FlowStream::new(kind, move |out: FlowEmitter| async move {
            let _guard = guard;
            out.emit(FlowEvent::Loading);
            match ensure_key(&custodian, &alias).await {
                Ok(provisioning) => out.emit(FlowEvent::Success(provisioning.message())),
                Err(e) => {
                    warn!("Key generation failed: {}", e);
                    out.emit(FlowEvent::Error(e.to_string()));
                }
            }
        })
    }
}
