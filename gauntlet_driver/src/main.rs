//! Tick driver for the gauntlet orchestrator.
//!
//! Runs the orchestrator against in-memory collaborators and a simulated
//! beacon, polling `tick` on a fixed interval and calling `recover` when a
//! tournament stalls. Events are exported as JSON lines.

mod config;
mod events;
mod logging;
mod population;

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Error};
use chrono::Utc;
use ctrlc::set_handler;
use gauntlet::{
    Collaborators, Gauntlet, GauntletError, TickOutcome,
    external::memory::{
        CoinFlipResolver, InMemoryEscrow, InMemoryRegistry, InMemoryRewardLedger, ManualClock,
        SimulatedBeacon,
    },
    orchestrator::WaitReason,
};
use log::info;
use pico_args::Arguments;

use config::DriverConfig;
use events::EventSink;
use population::{OutageSimulator, Population};

const HELP: &str = "\
Drive a gauntlet bracket orchestrator with simulated participants

USAGE:
  gauntlet_driver [OPTIONS]

OPTIONS:
  --participants N         Registered participants      [default: env DRIVER_PARTICIPANTS or 24]
  --tournaments  N         Stop after N tournaments     [default: env DRIVER_MAX_TOURNAMENTS or run forever]
  --events       PATH      Write events as JSON lines   [default: env DRIVER_EVENTS_PATH or stdout]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  GAUNTLET_SIZE            Entrants per tournament (4, 8, 16, 32 or 64)
  GAUNTLET_ENTRY_FEE       Fee charged on enqueue
  GAUNTLET_FEE_RATE_BPS    Platform share in basis points
  GAUNTLET_MIN_INTERVAL_SECS, GAUNTLET_TIMEOUT_SECS
  GAUNTLET_SUBSTITUTION_POLICY  fallback or forfeit
  BEACON_DELAY_ROUNDS, BEACON_WINDOW_ROUNDS, BEACON_SECRET, BEACON_OUTAGE_CHANCE
  DRIVER_TICK_MS, DRIVER_CLOCK_STEP_SECS, DRIVER_SEED
  RUST_LOG                 Log filter (e.g. info,gauntlet=debug)
  (See .env file for all configuration options)
";

struct Args {
    participants: Option<u64>,
    tournaments: Option<u64>,
    events: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        participants: pargs.opt_value_from_str("--participants")?,
        tournaments: pargs.opt_value_from_str("--tournaments")?,
        events: pargs.opt_value_from_str("--events")?,
    };

    logging::init();

    let config = DriverConfig::from_env(args.participants, args.tournaments, args.events)
        .context("Invalid configuration")?;

    // Catching signals for a clean stop.
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    set_handler(move || flag.store(false, Ordering::SeqCst))?;

    let clock = ManualClock::new(Utc::now());
    let beacon = match config.beacon.secret {
        Some(secret) => {
            SimulatedBeacon::with_secret(secret, config.beacon.delay, config.beacon.window)
        }
        None => SimulatedBeacon::new(config.beacon.delay, config.beacon.window),
    };
    let registry = InMemoryRegistry::new();
    let escrow = InMemoryEscrow::new();

    let services = Collaborators {
        clock: Arc::new(clock.clone()),
        beacon: Arc::new(beacon.clone()),
        registry: Arc::new(registry.clone()),
        escrow: Arc::new(escrow.clone()),
        resolver: Arc::new(CoinFlipResolver),
        ledger: Arc::new(InMemoryRewardLedger::new()),
    };

    let mut gauntlet = Gauntlet::new(config.gauntlet.clone(), services)?;
    let mut population = Population::new(config.population.clone(), registry, escrow.clone());
    let mut outages = OutageSimulator::new(config.beacon.clone(), beacon);
    let mut sink = match &config.events_path {
        Some(path) => EventSink::file(path)?,
        None => EventSink::stdout(),
    };

    info!(
        "Driving gauntlet: {} participants, bracket of {}, tick every {}ms",
        config.population.participants, config.gauntlet.tournament_size, config.tick_ms
    );

    let clock_step = chrono::Duration::seconds(i64::from(config.clock_step_secs));
    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_ms));
    let mut finished: u64 = 0;

    while running.load(Ordering::SeqCst) {
        interval.tick().await;

        population.step(&mut gauntlet);

        match gauntlet.tick() {
            Ok(TickOutcome::Completed(id)) => {
                finished += 1;
                info!("Tournament {id} completed ({finished} finished)");
            }
            Ok(TickOutcome::Waiting(
                WaitReason::SelectionPending
                | WaitReason::ExecutionPending
                | WaitReason::AnchorExpired
                | WaitReason::Recovering,
            )) => try_recover(&mut gauntlet, &mut finished),
            Ok(_) => {}
            Err(e) => tracing::error!("Tick failed: {e}"),
        }

        sink.write_all(gauntlet.drain_events())?;

        if config.max_tournaments.is_some_and(|max| finished >= max) {
            info!("Reached {finished} tournaments");
            break;
        }

        outages.step();
        clock.advance(clock_step);
    }

    info!(
        "Shutting down: {} tournaments recorded, {} fees accrued, {} in custody",
        gauntlet.tournaments().len(),
        gauntlet.accumulated_fees(),
        escrow.custody()
    );

    Ok(())
}

/// Recover a stalled tournament once its timeout has passed.
fn try_recover(gauntlet: &mut Gauntlet, finished: &mut u64) {
    match gauntlet.recover() {
        Ok(id) => {
            *finished += 1;
            tracing::warn!("Tournament {id} recovered after timeout");
        }
        Err(GauntletError::TimeoutNotReached(_) | GauntletError::RandomnessAvailable(_)) => {}
        Err(e) => tracing::error!("Recovery failed: {e}"),
    }
}
