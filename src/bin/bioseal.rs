use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use tracing::error;

use bioseal::adapters::{Presentation, SimulatedKeyStore, SimulatedSensor};
use bioseal::api::{SecurityState, SecurityTier, SensorAvailability};
use bioseal::ports::BiometricSensor;
use bioseal::{
    delete_key, key_handle, provision_key, run_flow, simulated_coordinator, BiosealResult,
    CoreConfig, FlowStream, SecurityStateMachine,
};

#[derive(Parser, Debug)]
#[command(name = "bioseal")]
#[command(about = "Biometric-gated hardware signing key, on a simulated device", version)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Simulated device the command runs against
#[derive(clap::Args, Debug)]
pub struct DeviceArgs {
    /// Alias of the signing key
    #[arg(long, global = true, env = "BIOSEAL_ALIAS", default_value = "bioseal_hardware_key")]
    pub alias: String,

    /// Payload signed after authentication
    #[arg(long, global = true, env = "BIOSEAL_PROBE")]
    pub probe: Option<String>,

    /// Security tiers the device supports
    #[arg(long, global = true, value_delimiter = ',', default_value = "hsm,tee,software")]
    pub tiers: Vec<TierArg>,

    /// Accept a key without hardware isolation
    #[arg(long, global = true)]
    pub allow_software: bool,

    /// State of the biometric sensor
    #[arg(long, global = true, default_value = "ready")]
    pub sensor: SensorArg,

    /// What the user presents to the prompt, in order
    #[arg(long, global = true, value_delimiter = ',', default_value = "accept")]
    pub present: Vec<PresentationArg>,

    /// Start with the key already on the device
    #[arg(long, global = true)]
    pub provisioned: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the signing key if it does not exist
    Generate,

    /// Verify the user with a biometric-gated probe signature
    Authenticate,

    /// Show key and sensor status
    Status,

    /// Delete the signing key
    Delete,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TierArg {
    Hsm,
    Tee,
    Software,
}

impl From<TierArg> for SecurityTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Hsm => SecurityTier::HardwareSecurityModule,
            TierArg::Tee => SecurityTier::TrustedExecutionEnvironment,
            TierArg::Software => SecurityTier::SoftwareFallback,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SensorArg {
    Ready,
    NoHardware,
    HwUnavailable,
    NoneEnrolled,
}

impl From<SensorArg> for SensorAvailability {
    fn from(arg: SensorArg) -> Self {
        match arg {
            SensorArg::Ready => SensorAvailability::Ready,
            SensorArg::NoHardware => SensorAvailability::NoHardware,
            SensorArg::HwUnavailable => SensorAvailability::HardwareUnavailable,
            SensorArg::NoneEnrolled => SensorAvailability::NoneEnrolled,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresentationArg {
    Accept,
    Reject,
    Cancel,
    NegativeButton,
    Lockout,
    LockoutPermanent,
}

impl From<PresentationArg> for Presentation {
    fn from(arg: PresentationArg) -> Self {
        match arg {
            PresentationArg::Accept => Presentation::Accept,
            PresentationArg::Reject => Presentation::Reject,
            PresentationArg::Cancel => Presentation::Cancel,
            PresentationArg::NegativeButton => Presentation::NegativeButton,
            PresentationArg::Lockout => Presentation::Lockout,
            PresentationArg::LockoutPermanent => Presentation::LockoutPermanent,
        }
    }
}

fn config_from(args: &DeviceArgs) -> BiosealResult<CoreConfig> {
    let mut config = CoreConfig::default()
        .with_alias(&args.alias)?
        .with_software_fallback(args.allow_software);
    if let Some(probe) = &args.probe {
        config = config.with_probe_payload(probe.as_bytes())?;
    }
    Ok(config)
}

fn device_from(args: &DeviceArgs) -> (SimulatedKeyStore, SimulatedSensor) {
    let tiers: Vec<SecurityTier> = args.tiers.iter().map(|&t| t.into()).collect();
    let store = SimulatedKeyStore::with_tiers(&tiers);
    let sensor = SimulatedSensor::with_availability(args.sensor.into());
    sensor.set_script(args.present.iter().map(|&p| p.into()).collect());
    (store, sensor)
}

/// Print every state of `flow`, failing if it ends in `Error`
async fn show(machine: &SecurityStateMachine, flow: FlowStream) -> anyhow::Result<()> {
    let states = run_flow(machine, flow).await;
    for state in states.iter().skip(1) {
        println!("state: {state}");
    }
    match states.last() {
        Some(SecurityState::Error(detail)) => anyhow::bail!("{detail}"),
        _ => Ok(()),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config_from(&cli.device).context("invalid device arguments")?;
    let (store, sensor) = device_from(&cli.device);
    let (coordinator, _store, sensor) = simulated_coordinator(store, sensor, &config);
    let machine = SecurityStateMachine::new();

    if cli.device.provisioned {
        provision_key(&coordinator)
            .await
            .context("failed to provision key")?;
    }

    match cli.command {
        Commands::Generate => {
            show(&machine, coordinator.generate()).await?;
            let handle = key_handle(&coordinator)?;
            println!("tier: {}", handle.tier());
            println!("fingerprint: {}", handle.fingerprint());
            println!("public key: {}", hex::encode(handle.public_key()));
        }
        Commands::Authenticate => {
            show(&machine, coordinator.authenticate()).await?;
        }
        Commands::Status => {
            println!("alias: {}", coordinator.alias());
            match key_handle(&coordinator) {
                Ok(handle) => {
                    println!("key: present");
                    println!("tier: {}", handle.tier());
                    println!("fingerprint: {}", handle.fingerprint());
                }
                Err(_) => println!("key: absent"),
            }
            match sensor.availability().unavailable_reason() {
                Some(reason) => println!("sensor: {reason}"),
                None => println!("sensor: ready"),
            }
        }
        Commands::Delete => {
            let removed = delete_key(&coordinator)
                .await
                .context("failed to delete key")?;
            if removed {
                println!("deleted {}", coordinator.alias());
            } else {
                println!("no key under {}", coordinator.alias());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.tracing_level_filter())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
