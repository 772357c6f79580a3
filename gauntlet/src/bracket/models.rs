//! Bracket data models.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::queue::{LoadoutRef, ParticipantId};

/// Bracket sizes the executor accepts.
pub const SUPPORTED_SIZES: [usize; 5] = [4, 8, 16, 32, 64];

/// Whether `size` is one of [`SUPPORTED_SIZES`].
#[must_use]
pub fn is_supported_size(size: usize) -> bool {
    SUPPORTED_SIZES.contains(&size)
}

/// Who occupies a bracket position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entrant {
    Real(ParticipantId),
    /// Stand-in contestant. Never receives prize money or rewards.
    Fallback,
}

impl Entrant {
    #[must_use]
    pub const fn participant_id(&self) -> Option<ParticipantId> {
        match self {
            Self::Real(id) => Some(*id),
            Self::Fallback => None,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

impl fmt::Display for Entrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(id) => write!(f, "participant {id}"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// An entrant together with the loadout it fights with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contestant {
    pub entrant: Entrant,
    pub loadout: LoadoutRef,
}

impl Contestant {
    #[must_use]
    pub const fn real(participant_id: ParticipantId, loadout: LoadoutRef) -> Self {
        Self {
            entrant: Entrant::Real(participant_id),
            loadout,
        }
    }

    #[must_use]
    pub const fn fallback(loadout: LoadoutRef) -> Self {
        Self {
            entrant: Entrant::Fallback,
            loadout,
        }
    }
}

/// Side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// What the fight resolver returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightOutcome {
    pub winner: Side,
    pub combat_log: Vec<String>,
}

/// Result credited to a participant's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
}

/// How a scheduled participant that is no longer eligible is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionPolicy {
    /// Replace them with the fallback entrant for that match. Two
    /// substitutions in one match produce a fallback-versus-fallback fight.
    #[default]
    Fallback,
    /// The opponent advances without a fight. If both sides are ineligible
    /// the fallback entrant advances.
    Forfeit,
}

impl fmt::Display for SubstitutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => write!(f, "fallback"),
            Self::Forfeit => write!(f, "forfeit"),
        }
    }
}

impl FromStr for SubstitutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "forfeit" => Ok(Self::Forfeit),
            other => Err(format!("unknown substitution policy: {other}")),
        }
    }
}

/// How a match was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Fought { combat_log: Vec<String> },
    Walkover,
}

/// One resolved match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Zero-based round; the final is `rounds - 1`.
    pub round: u32,
    pub index: u32,
    /// Entrants as they actually took the field, after substitution.
    pub a: Entrant,
    pub b: Entrant,
    pub winner: Entrant,
    pub loser: Entrant,
    pub resolution: Resolution,
    /// Scheduled participants that could not take the field.
    pub substituted: Vec<ParticipantId>,
}

impl MatchRecord {
    #[must_use]
    pub fn was_fought(&self) -> bool {
        matches!(self.resolution, Resolution::Fought { .. })
    }
}

/// A loser and the round they fell in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub entrant: Entrant,
    pub round: u32,
}

/// Full result of a bracket walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketOutcome {
    pub champion: Entrant,
    pub runner_up: Entrant,
    pub rounds: u32,
    pub matches: Vec<MatchRecord>,
    pub eliminations: Vec<Elimination>,
    pub substituted: Vec<ParticipantId>,
}

impl BracketOutcome {
    /// Placement tier of every real participant that finished on the field:
    /// 0 for the champion, 1 for the runner-up, and `rounds - round` for
    /// anyone knocked out in `round`. Substituted participants are absent.
    #[must_use]
    pub fn placements(&self) -> Vec<(ParticipantId, u32)> {
        let mut placements = Vec::with_capacity(self.eliminations.len() + 1);
        if let Some(id) = self.champion.participant_id() {
            placements.push((id, 0));
        }

        // Eliminations are recorded final-last, so reverse for best-first.
        for elimination in self.eliminations.iter().rev() {
            if let Some(id) = elimination.entrant.participant_id() {
                if !self.substituted.contains(&id) {
                    placements.push((id, self.rounds - elimination.round));
                }
            }
        }

        placements
    }

    /// Matches a real participant actually fought in.
    pub fn fights_of(&self, participant_id: ParticipantId) -> impl Iterator<Item = &MatchRecord> {
        let entrant = Entrant::Real(participant_id);
        self.matches
            .iter()
            .filter(move |m| m.was_fought() && (m.a == entrant || m.b == entrant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_sizes() {
        assert!(is_supported_size(4));
        assert!(is_supported_size(64));
        assert!(!is_supported_size(2));
        assert!(!is_supported_size(12));
        assert!(!is_supported_size(128));
    }

    #[test]
    fn test_substitution_policy_parse() {
        assert_eq!(
            "Forfeit".parse::<SubstitutionPolicy>(),
            Ok(SubstitutionPolicy::Forfeit)
        );
        assert_eq!(
            "fallback".parse::<SubstitutionPolicy>(),
            Ok(SubstitutionPolicy::Fallback)
        );
        assert!("coin".parse::<SubstitutionPolicy>().is_err());
    }

    #[test]
    fn test_entrant_accessors() {
        assert_eq!(Entrant::Real(5).participant_id(), Some(5));
        assert_eq!(Entrant::Fallback.participant_id(), None);
        assert!(Entrant::Fallback.is_fallback());
        assert_eq!(Entrant::Real(5).to_string(), "participant 5");
    }
}
