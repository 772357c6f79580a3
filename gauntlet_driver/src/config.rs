//! Driver configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use gauntlet::GauntletConfig;
use gauntlet::orchestrator::config::{parse_env, parse_env_or};
use std::path::PathBuf;

/// Complete driver configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Orchestrator settings
    pub gauntlet: GauntletConfig,
    /// Simulated beacon settings
    pub beacon: BeaconConfig,
    /// Simulated participant population
    pub population: PopulationConfig,
    /// Wall time between ticks
    pub tick_ms: u64,
    /// Simulated time that passes per tick
    pub clock_step_secs: u32,
    /// Stop after this many finished tournaments
    pub max_tournaments: Option<u64>,
    /// JSON-lines event output; stdout when unset
    pub events_path: Option<PathBuf>,
}

/// Simulated beacon configuration
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// Rounds between a commitment and its value
    pub delay: u64,
    /// Rounds a value stays readable
    pub window: u64,
    /// Fixed secret for reproducible runs
    pub secret: Option<u64>,
    /// Chance per tick that the beacon stalls
    pub outage_chance: f64,
    /// Ticks a stall lasts
    pub outage_ticks: u32,
}

/// Simulated participant behaviour
#[derive(Debug, Clone)]
pub struct PopulationConfig {
    /// Number of registered participants
    pub participants: u64,
    /// Chance per tick that an idle participant enqueues
    pub join_chance: f64,
    /// Chance per tick that a queued participant withdraws
    pub leave_chance: f64,
    /// Chance per tick that a participant in a tournament is retired
    pub retire_chance: f64,
    /// Seed for the population's choices
    pub seed: Option<u64>,
}

impl DriverConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `participants_override` - Optional population size (from CLI args)
    /// * `tournaments_override` - Optional tournament limit (from CLI args)
    /// * `events_override` - Optional event output path (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but unparsable or invalid
    pub fn from_env(
        participants_override: Option<u64>,
        tournaments_override: Option<u64>,
        events_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let gauntlet = GauntletConfig::from_env()?;

        let beacon = BeaconConfig {
            delay: parse_env_or("BEACON_DELAY_ROUNDS", 2)?,
            window: parse_env_or("BEACON_WINDOW_ROUNDS", 32)?,
            secret: parse_env("BEACON_SECRET")?,
            outage_chance: parse_env_or("BEACON_OUTAGE_CHANCE", 0.0)?,
            outage_ticks: parse_env_or("BEACON_OUTAGE_TICKS", 120)?,
        };

        let participants = match participants_override {
            Some(participants) => participants,
            None => parse_env_or("DRIVER_PARTICIPANTS", 24)?,
        };
        let population = PopulationConfig {
            participants,
            join_chance: parse_env_or("DRIVER_JOIN_CHANCE", 0.3)?,
            leave_chance: parse_env_or("DRIVER_LEAVE_CHANCE", 0.02)?,
            retire_chance: parse_env_or("DRIVER_RETIRE_CHANCE", 0.0)?,
            seed: parse_env("DRIVER_SEED")?,
        };

        let max_tournaments = match tournaments_override {
            Some(max) => Some(max),
            None => parse_env("DRIVER_MAX_TOURNAMENTS")?,
        };
        let events_path = match events_override {
            Some(path) => Some(path),
            None => parse_env("DRIVER_EVENTS_PATH")?,
        };

        let config = DriverConfig {
            gauntlet,
            beacon,
            population,
            tick_ms: parse_env_or("DRIVER_TICK_MS", 250)?,
            clock_step_secs: parse_env_or("DRIVER_CLOCK_STEP_SECS", 60)?,
            max_tournaments,
            events_path,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "DRIVER_TICK_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if (self.population.participants as usize) < self.gauntlet.tournament_size {
            return Err(ConfigError::Invalid {
                var: "DRIVER_PARTICIPANTS".to_string(),
                reason: format!(
                    "Must be at least the tournament size ({})",
                    self.gauntlet.tournament_size
                ),
            });
        }

        for (var, chance) in [
            ("DRIVER_JOIN_CHANCE", self.population.join_chance),
            ("DRIVER_LEAVE_CHANCE", self.population.leave_chance),
            ("DRIVER_RETIRE_CHANCE", self.population.retire_chance),
            ("BEACON_OUTAGE_CHANCE", self.beacon.outage_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("{chance} is not a probability"),
                });
            }
        }

        if self.beacon.window == 0 {
            return Err(ConfigError::Invalid {
                var: "BEACON_WINDOW_ROUNDS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Gauntlet(#[from] gauntlet::orchestrator::ConfigError),
}
