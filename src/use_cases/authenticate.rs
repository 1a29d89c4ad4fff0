//! Authenticate use case
//!
//! Asks the user to authorize one signature and exercises the key with it.

use futures::StreamExt;
use tracing::{debug, info};

use crate::custodian::KeyCustodian;
use crate::error::AuthError;
use crate::gate::AuthenticationGate;
use crate::model::{AuthEvent, KeyAlias};
use crate::ports::{BiometricSensor, HardwareKeyStore};

/// Text reported after a successful probe signature
pub fn probe_message(signature: &[u8]) -> String {
    format!("authenticated, signature length = {}", signature.len())
}

/// Authorize a signature with the key under `alias` and sign `payload`
///
/// Rejected presentations are retried by the prompt itself and never end
/// the use case. Returns the probe signature.
///
/// # Errors
///
/// Returns errors if:
/// - The key is missing or cannot be loaded
/// - The user cancels or is locked out
/// - Biometrics are unavailable
/// - Signing with the authorized context fails
pub async fn authorize_and_sign<K, S>(
    custodian: &KeyCustodian<K>,
    gate: &AuthenticationGate<K, S>,
    alias: &KeyAlias,
    payload: &[u8],
) -> Result<Vec<u8>, AuthError>
where
    K: HardwareKeyStore,
    S: BiometricSensor,
{
    let handle = custodian.handle(alias)?;
    let mut events = gate.request_authorization(handle);

    while let Some(event) = events.next().await {
        match event {
            AuthEvent::Retryable(reason) => debug!("Presentation rejected: {}", reason),
            AuthEvent::Authorized(mut ctx) => {
                let signature = custodian.sign_with(&mut ctx, payload).await?;
                info!("Probe signature verified user presence");
                return Ok(signature);
            }
            AuthEvent::Canceled => return Err(AuthError::Canceled),
            AuthEvent::LockedOut { permanent: false } => return Err(AuthError::LockedOut),
            AuthEvent::LockedOut { permanent: true } => {
                return Err(AuthError::PermanentlyLockedOut)
            }
            AuthEvent::Unavailable(reason) => return Err(AuthError::Unavailable(reason)),
        }
    }

    Err(AuthError::Interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Presentation, SimulatedKeyStore, SimulatedSensor};
    use crate::config::CoreConfig;
    use crate::error::KeyError;
    use crate::model::SensorAvailability;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::{Signature, VerifyingKey};
    use std::sync::Arc;

    struct Setup {
        custodian: Arc<KeyCustodian<SimulatedKeyStore>>,
        gate: AuthenticationGate<SimulatedKeyStore, SimulatedSensor>,
        alias: KeyAlias,
    }

    fn setup(sensor: SimulatedSensor) -> Setup {
        let config = CoreConfig::default();
        let custodian = Arc::new(KeyCustodian::new(
            Arc::new(SimulatedKeyStore::new()),
            &config,
        ));
        let gate = AuthenticationGate::new(custodian.clone(), Arc::new(sensor), &config);
        Setup {
            custodian,
            gate,
            alias: config.alias,
        }
    }

    #[tokio::test]
    async fn test_signature_verifies_against_handle() {
        let s = setup(SimulatedSensor::new());
        let handle = s.custodian.create(&s.alias).await.unwrap();

        let signature = authorize_and_sign(&s.custodian, &s.gate, &s.alias, b"probe")
            .await
            .unwrap();

        let key = VerifyingKey::from_sec1_bytes(handle.public_key()).unwrap();
        let signature = Signature::from_der(&signature).unwrap();
        assert!(key.verify(b"probe", &signature).is_ok());
    }

    #[test]
    fn test_probe_message() {
        assert_eq!(
            probe_message(&[0u8; 71]),
            "authenticated, signature length = 71"
        );
    }

    #[tokio::test]
    async fn test_missing_key() {
        let s = setup(SimulatedSensor::new());

        let result = authorize_and_sign(&s.custodian, &s.gate, &s.alias, b"probe").await;

        assert!(matches!(
            result,
            Err(AuthError::Key(KeyError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_rejections_are_swallowed() {
        let s = setup(SimulatedSensor::with_script(vec![
            Presentation::Reject,
            Presentation::Reject,
            Presentation::Reject,
            Presentation::Accept,
        ]));
        s.custodian.create(&s.alias).await.unwrap();

        let result = authorize_and_sign(&s.custodian, &s.gate, &s.alias, b"probe").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_terminal_failures() {
        let cases = [
            (Presentation::Cancel, AuthError::Canceled),
            (Presentation::Lockout, AuthError::LockedOut),
            (Presentation::LockoutPermanent, AuthError::PermanentlyLockedOut),
        ];
        for (presentation, expected) in cases {
            let s = setup(SimulatedSensor::with_script(vec![presentation]));
            s.custodian.create(&s.alias).await.unwrap();

            let result = authorize_and_sign(&s.custodian, &s.gate, &s.alias, b"probe").await;

            assert_eq!(result, Err(expected));
        }
    }

    #[tokio::test]
    async fn test_unavailable_reason_passed_through() {
        let s = setup(SimulatedSensor::with_availability(
            SensorAvailability::NoneEnrolled,
        ));
        s.custodian.create(&s.alias).await.unwrap();

        let result = authorize_and_sign(&s.custodian, &s.gate, &s.alias, b"probe").await;

        assert_eq!(
            result,
            Err(AuthError::Unavailable("none_enrolled".to_string()))
        );
    }
}
