use std::time::Duration;

use futures::StreamExt;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};

use bioseal::adapters::{Presentation, SimulatedKeyStore, SimulatedSensor};
use bioseal::api::{KeyAlias, SecurityState, SensorAvailability};
use bioseal::{
    run_flow, simulated_coordinator, AuthEvent, CoreConfig, FlowEvent, KeyError,
    SecurityStateMachine,
};

fn verified_prefix(state: &SecurityState) -> bool {
    matches!(state, SecurityState::Verified(detail) if detail.starts_with("authenticated, signature length = "))
}

#[tokio::test]
async fn test_exists_false_until_create() {
    let (coordinator, _, _) = simulated_coordinator(
        SimulatedKeyStore::new(),
        SimulatedSensor::new(),
        &CoreConfig::default(),
    );
    let custodian = coordinator.custodian();

    for name in ["wallet", "wallet.backup", "k-1"] {
        let alias = KeyAlias::new(name).unwrap();
        assert!(!custodian.exists(&alias));
        custodian.create(&alias).await.unwrap();
        assert!(custodian.exists(&alias));
    }
}

#[tokio::test]
async fn test_create_twice_never_overwrites() {
    let (coordinator, _, _) = simulated_coordinator(
        SimulatedKeyStore::new(),
        SimulatedSensor::new(),
        &CoreConfig::default(),
    );
    let custodian = coordinator.custodian();
    let alias = coordinator.alias().clone();

    let first = custodian.create(&alias).await.unwrap();
    let second = custodian.create(&alias).await;

    assert!(matches!(second, Err(KeyError::AlreadyExists { .. })));
    assert_eq!(custodian.handle(&alias).unwrap(), first);
}

#[tokio::test]
async fn test_fresh_install_authenticate() {
    let (coordinator, _, _) = simulated_coordinator(
        SimulatedKeyStore::new(),
        SimulatedSensor::new(),
        &CoreConfig::default(),
    );
    let machine = SecurityStateMachine::new();

    let states = run_flow(&machine, coordinator.authenticate()).await;

    assert_eq!(states.len(), 4);
    assert_eq!(states[0], SecurityState::Idle);
    assert_eq!(states[1], SecurityState::Loading);
    assert_eq!(states[2], SecurityState::Loading);
    assert!(verified_prefix(&states[3]), "got {:?}", states[3]);
    assert!(coordinator.has_key());
}

#[tokio::test]
async fn test_none_enrolled_with_existing_key() {
    let (coordinator, _, _) = simulated_coordinator(
        SimulatedKeyStore::new(),
        SimulatedSensor::with_availability(SensorAvailability::NoneEnrolled),
        &CoreConfig::default(),
    );
    let machine = SecurityStateMachine::new();
    run_flow(&machine, coordinator.bootstrap()).await;
    machine.reset();

    let states = run_flow(&machine, coordinator.authenticate()).await;

    assert_eq!(
        states,
        vec![
            SecurityState::Idle,
            SecurityState::Loading,
            SecurityState::Error("none_enrolled".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_retryable_presentations_do_not_change_state() {
    let (coordinator, _, _) = simulated_coordinator(
        SimulatedKeyStore::new(),
        SimulatedSensor::with_script(vec![
            Presentation::Reject,
            Presentation::Reject,
            Presentation::Accept,
        ]),
        &CoreConfig::default(),
    );
    let machine = SecurityStateMachine::new();

    let states = run_flow(&machine, coordinator.bootstrap()).await;
    assert_eq!(states.last(), Some(&SecurityState::Locked));

    let states = run_flow(&machine, coordinator.authenticate()).await;

    assert_eq!(states.len(), 3);
    assert_eq!(states[0], SecurityState::Locked);
    assert_eq!(states[1], SecurityState::Loading);
    assert!(verified_prefix(&states[2]));
}

#[tokio::test]
async fn test_gate_reports_each_rejection() {
    let (coordinator, store, sensor) = simulated_coordinator(
        SimulatedKeyStore::new(),
        SimulatedSensor::with_script(vec![
            Presentation::Reject,
            Presentation::Reject,
            Presentation::Accept,
        ]),
        &CoreConfig::default(),
    );
    let custodian = std::sync::Arc::new(bioseal::KeyCustodian::new(store, &CoreConfig::default()));
    let gate = bioseal::AuthenticationGate::new(custodian.clone(), sensor, &CoreConfig::default());
    let handle = custodian.create(coordinator.alias()).await.unwrap();

    let events: Vec<AuthEvent> = gate.request_authorization(handle).collect().await;

    let retryable = events
        .iter()
        .filter(|e| matches!(e, AuthEvent::Retryable(_)))
        .count();
    assert_eq!(retryable, 2);
    assert!(matches!(events.last(), Some(AuthEvent::Authorized(_))));
}

#[tokio::test]
async fn test_cancel_pending_authentication_leaves_loading() {
    let (coordinator, store, sensor) = simulated_coordinator(
        SimulatedKeyStore::new(),
        SimulatedSensor::with_script(vec![Presentation::Hang]),
        &CoreConfig::default(),
    );
    let machine = SecurityStateMachine::new();
    run_flow(&machine, coordinator.generate()).await;

    let mut flow = coordinator.authenticate();
    let kind = flow.kind();
    let _ = tokio::time::timeout(Duration::from_millis(50), async {
        while let Some(event) = flow.next().await {
            machine.apply(kind, &event);
        }
    })
    .await;
    assert_eq!(machine.current(), SecurityState::Loading);

    drop(flow);
    tokio::task::yield_now().await;

    assert_eq!(machine.current(), SecurityState::Loading);
    assert_eq!(store.pending_operations(), 0);
    assert_eq!(sensor.stats().opened(), 1);
}

#[tokio::test]
async fn test_context_single_use_through_gate() {
    let config = CoreConfig::default();
    let (_, store, sensor) =
        simulated_coordinator(SimulatedKeyStore::new(), SimulatedSensor::new(), &config);
    let custodian = std::sync::Arc::new(bioseal::KeyCustodian::new(store, &config));
    let gate = bioseal::AuthenticationGate::new(custodian.clone(), sensor, &config);
    let handle = custodian.create(&config.alias).await.unwrap();

    let mut events = gate.request_authorization(handle);
    let Some(AuthEvent::Authorized(mut ctx)) = events.next().await else {
        panic!("expected authorization");
    };

    assert!(custodian.sign_with(&mut ctx, b"payload").await.is_ok());
    assert_eq!(
        custodian.sign_with(&mut ctx, b"payload").await,
        Err(KeyError::ContextExpired)
    );
}

#[tokio::test]
async fn test_lockout_messages_distinct() {
    let mut messages = Vec::new();
    for presentation in [Presentation::Lockout, Presentation::LockoutPermanent] {
        let (coordinator, _, _) = simulated_coordinator(
            SimulatedKeyStore::new(),
            SimulatedSensor::with_script(vec![presentation]),
            &CoreConfig::default(),
        );
        let events: Vec<FlowEvent> = coordinator.authenticate().collect().await;
        match events.last() {
            Some(FlowEvent::Error(message)) => messages.push(message.clone()),
            other => panic!("expected error, got {other:?}"),
        }
    }

    assert_eq!(messages[0], "Too many attempts - locked out");
    assert_eq!(messages[1], "Permanently locked out");
}

#[tokio::test]
async fn test_custom_probe_payload_signed() {
    let config = CoreConfig::default()
        .with_alias("custom.probe")
        .unwrap()
        .with_probe_payload(b"hello".to_vec())
        .unwrap();
    let (coordinator, store, _) =
        simulated_coordinator(SimulatedKeyStore::new(), SimulatedSensor::new(), &config);

    let events: Vec<FlowEvent> = coordinator.authenticate().collect().await;

    assert!(matches!(events.last(), Some(FlowEvent::Success(_))));
    assert_eq!(store.generation_requests().len(), 1);
    assert_eq!(store.generation_requests()[0].alias.as_str(), "custom.probe");

    let handle = coordinator.custodian().handle(coordinator.alias()).unwrap();
    let records = store.signatures();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].alias, *coordinator.alias());
    assert_eq!(records[0].payload, b"hello".to_vec());

    let key = VerifyingKey::from_sec1_bytes(handle.public_key()).unwrap();
    let signature = Signature::from_der(&records[0].signature).unwrap();
    assert!(key.verify(b"hello", &signature).is_ok());
    assert!(key.verify(b"bioseal biometric probe", &signature).is_err());
}
