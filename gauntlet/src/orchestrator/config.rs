//! Orchestrator configuration.
//!
//! Every setting has a default and can be overridden through a `GAUNTLET_*`
//! environment variable.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{env::VarError, fmt::Display, str::FromStr};

use crate::bracket::{SubstitutionPolicy, is_supported_size};
use crate::queue::{AccountId, Amount, LoadoutRef};
use crate::rewards::{FeeRate, RewardSchedule};

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GauntletConfig {
    /// Account allowed to change settings and withdraw fees
    pub operator: AccountId,
    /// Entrants per tournament
    pub tournament_size: usize,
    /// Fee charged on enqueue
    pub entry_fee: Amount,
    /// Platform share of collected fees
    pub fee_rate: FeeRate,
    /// Minimum time between tournament starts
    pub min_interval_secs: u32,
    /// Time after the last randomness request before anyone may recover
    pub timeout_secs: u32,
    /// Whether new enqueues and commits are accepted
    pub enabled: bool,
    pub substitution_policy: SubstitutionPolicy,
    /// Loadout the fallback entrant fights with
    pub fallback_loadout: LoadoutRef,
    /// Level bracket the standard reward tables are scaled for
    pub level_bracket: u32,
    pub rewards: RewardSchedule,
}

impl Default for GauntletConfig {
    fn default() -> Self {
        Self {
            operator: 0,
            tournament_size: 4,
            entry_fee: 100,
            fee_rate: FeeRate::new(1000).unwrap_or(FeeRate::ZERO),
            min_interval_secs: 600,
            timeout_secs: 3600,
            enabled: true,
            substitution_policy: SubstitutionPolicy::Fallback,
            fallback_loadout: LoadoutRef::default(),
            level_bracket: 0,
            rewards: RewardSchedule::standard(0),
        }
    }
}

impl GauntletConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but unparsable or outside its
    /// valid range
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let fee_rate_bps = parse_env_or("GAUNTLET_FEE_RATE_BPS", defaults.fee_rate.bps())?;
        let fee_rate = FeeRate::new(fee_rate_bps).ok_or_else(|| ConfigError::Invalid {
            var: "GAUNTLET_FEE_RATE_BPS".to_string(),
            reason: format!("{fee_rate_bps} exceeds 10000"),
        })?;

        let substitution_policy =
            parse_env_or("GAUNTLET_SUBSTITUTION_POLICY", defaults.substitution_policy)?;

        let level_bracket = parse_env_or("GAUNTLET_LEVEL_BRACKET", defaults.level_bracket)?;

        let config = Self {
            operator: parse_env_or("GAUNTLET_OPERATOR", defaults.operator)?,
            tournament_size: parse_env_or("GAUNTLET_SIZE", defaults.tournament_size)?,
            entry_fee: parse_env_or("GAUNTLET_ENTRY_FEE", defaults.entry_fee)?,
            fee_rate,
            min_interval_secs: parse_env_or(
                "GAUNTLET_MIN_INTERVAL_SECS",
                defaults.min_interval_secs,
            )?,
            timeout_secs: parse_env_or("GAUNTLET_TIMEOUT_SECS", defaults.timeout_secs)?,
            enabled: parse_env_or("GAUNTLET_ENABLED", defaults.enabled)?,
            substitution_policy,
            fallback_loadout: LoadoutRef(parse_env_or("GAUNTLET_FALLBACK_LOADOUT", 0)?),
            level_bracket,
            rewards: RewardSchedule::standard(level_bracket),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_supported_size(self.tournament_size) {
            return Err(ConfigError::Invalid {
                var: "GAUNTLET_SIZE".to_string(),
                reason: format!(
                    "{} is not one of {:?}",
                    self.tournament_size,
                    crate::bracket::SUPPORTED_SIZES
                ),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "GAUNTLET_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::seconds(i64::from(self.min_interval_secs))
    }

    #[must_use]
    pub fn timeout_window(&self) -> Duration {
        Duration::seconds(i64::from(self.timeout_secs))
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional environment variable.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the variable is set but is not valid
/// unicode or does not parse as `T`
pub fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::Invalid {
            var: key.to_string(),
            reason: "Not valid unicode".to_string(),
        }),
    }
}

/// Parse an environment variable, using `default` when it is unset.
///
/// # Errors
///
/// Same as [`parse_env`]
pub fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_env(key)?.unwrap_or(default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("{raw:?}: {e}"),
    })
}
