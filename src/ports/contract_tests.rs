//! Shared behavioral contracts for port implementations
//!
//! Every adapter runs the same contract functions through
//! [`contract_tests_for!`], which builds a fresh instance per test.

/// Generate one `#[test]` per contract function for an adapter constructor
#[macro_export]
macro_rules! contract_tests_for {
    (
        $mod_name:ident,
        make = $make:expr,
        tests = {
            $( $test_name:ident => $contract:path ),+ $(,)?
        }
    ) => {
        mod $mod_name {
            use super::*;

            $(
                #[test]
                fn $test_name() {
                    let port = ($make)();
                    $contract(port);
                }
            )+
        }
    };
}

#[cfg(test)]
pub mod key_store_contract {
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::{Signature, VerifyingKey};

    use crate::{
        error::KeyStoreError,
        model::{AuthToken, Authenticator, KeyAlias, OperationId, SecurityTier},
        ports::{HardwareKeyStore, KeyGenSpec},
    };

    fn alias() -> KeyAlias {
        KeyAlias::new("contract_key").unwrap()
    }

    fn spec() -> KeyGenSpec {
        KeyGenSpec::new(alias(), SecurityTier::HardwareSecurityModule)
    }

    fn token(op: OperationId) -> AuthToken {
        AuthToken {
            challenge: op,
            authenticator: Authenticator::BiometricStrong,
        }
    }

    pub(crate) fn test_contains_after_generate(store: impl HardwareKeyStore) {
        assert!(!store.contains(&alias()));

        let stored = store.generate(&spec()).expect("generate failed");

        assert!(store.contains(&alias()));
        assert_eq!(stored.alias, alias());
        assert_eq!(stored.tier, SecurityTier::HardwareSecurityModule);
    }

    pub(crate) fn test_generate_existing_alias_fails(store: impl HardwareKeyStore) {
        store.generate(&spec()).expect("generate failed");

        let result = store.generate(&spec());
        assert!(matches!(
            result.unwrap_err(),
            KeyStoreError::AliasExists { .. }
        ));
    }

    pub(crate) fn test_load_matches_generated(store: impl HardwareKeyStore) {
        assert_eq!(store.load(&alias()).unwrap(), None);

        let stored = store.generate(&spec()).expect("generate failed");
        let loaded = store.load(&alias()).unwrap().expect("key missing");

        assert_eq!(loaded, stored);
    }

    pub(crate) fn test_delete_removes_key(store: impl HardwareKeyStore) {
        store.generate(&spec()).expect("generate failed");

        assert!(store.delete(&alias()).unwrap());
        assert!(!store.contains(&alias()));
        assert!(!store.delete(&alias()).unwrap());
    }

    pub(crate) fn test_begin_operation_missing_key(store: impl HardwareKeyStore) {
        let result = store.begin_operation(&alias());
        assert!(matches!(result.unwrap_err(), KeyStoreError::NotFound { .. }));
    }

    pub(crate) fn test_sign_success(store: impl HardwareKeyStore) {
        let stored = store.generate(&spec()).expect("generate failed");
        let op = store.begin_operation(&alias()).expect("begin failed");

        let data = b"test data";
        let der = store.sign(op, &token(op), data).expect("sign failed");

        let signature = Signature::from_der(&der).expect("signature is not DER");
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&stored.public_key).expect("bad public key");
        verifying_key
            .verify(data, &signature)
            .expect("Signature verification failed");
    }

    pub(crate) fn test_operation_is_single_use(store: impl HardwareKeyStore) {
        store.generate(&spec()).expect("generate failed");
        let op = store.begin_operation(&alias()).expect("begin failed");

        store.sign(op, &token(op), b"first").expect("sign failed");

        let result = store.sign(op, &token(op), b"second");
        assert_eq!(result.unwrap_err(), KeyStoreError::OperationUnknown);
    }

    pub(crate) fn test_token_for_other_operation_rejected(store: impl HardwareKeyStore) {
        store.generate(&spec()).expect("generate failed");
        let op = store.begin_operation(&alias()).expect("begin failed");
        let other = OperationId(op.0.wrapping_add(1));

        let result = store.sign(op, &token(other), b"data");
        assert!(matches!(
            result.unwrap_err(),
            KeyStoreError::TokenRejected { .. }
        ));
    }

    pub(crate) fn test_device_credential_token_rejected(store: impl HardwareKeyStore) {
        store.generate(&spec()).expect("generate failed");
        let op = store.begin_operation(&alias()).expect("begin failed");
        let weak = AuthToken {
            challenge: op,
            authenticator: Authenticator::DeviceCredential,
        };

        let result = store.sign(op, &weak, b"data");
        assert!(matches!(
            result.unwrap_err(),
            KeyStoreError::TokenRejected { .. }
        ));
    }

    pub(crate) fn test_aborted_operation_unknown(store: impl HardwareKeyStore) {
        store.generate(&spec()).expect("generate failed");
        let op = store.begin_operation(&alias()).expect("begin failed");

        store.abort_operation(op);

        let result = store.sign(op, &token(op), b"data");
        assert_eq!(result.unwrap_err(), KeyStoreError::OperationUnknown);
    }
}

#[cfg(test)]
pub mod sensor_contract {
    use crate::{
        model::{Authenticator, OperationId, PromptInfo, PromptOutcome},
        ports::BiometricSensor,
    };

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime")
    }

    /// `sensor` must be ready and accept the first presentation
    pub(crate) fn test_prompt_success_binds_challenge(sensor: impl BiometricSensor) {
        runtime().block_on(async {
            let challenge = OperationId(42);
            let mut outcomes = sensor
                .open_prompt(&PromptInfo::default(), challenge)
                .await
                .expect("prompt failed");

            match outcomes.recv().await {
                Some(PromptOutcome::Succeeded(Some(token))) => {
                    assert_eq!(token.challenge, challenge);
                    assert_eq!(token.authenticator, Authenticator::BiometricStrong);
                }
                other => panic!("expected success: {other:?}"),
            }
        });
    }

    /// `sensor` must be ready; dropping the receiver must not panic the sensor
    pub(crate) fn test_prompt_can_be_dismissed(sensor: impl BiometricSensor) {
        runtime().block_on(async {
            let outcomes = sensor
                .open_prompt(&PromptInfo::default(), OperationId(1))
                .await
                .expect("prompt failed");
            drop(outcomes);
            tokio::task::yield_now().await;
        });
    }
}
