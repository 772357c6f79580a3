//! Elimination bracket: entrants, substitution and the bracket walk.

pub mod executor;
pub mod models;

pub use executor::{BracketError, BracketExecutor};
pub use models::{
    BracketOutcome, Contestant, Elimination, Entrant, FightOutcome, MatchRecord, MatchResult,
    Resolution, SUPPORTED_SIZES, Side, SubstitutionPolicy, is_supported_size,
};
