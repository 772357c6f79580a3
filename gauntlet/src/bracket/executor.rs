//! Single-elimination bracket walk.

use log::{debug, warn};
use thiserror::Error;

use super::models::{
    BracketOutcome, Contestant, Elimination, Entrant, MatchRecord, Resolution, Side,
    SubstitutionPolicy, is_supported_size,
};
use crate::external::{EligibilityRegistry, FightResolver};
use crate::queue::{LoadoutRef, ParticipantId};
use crate::randomness::Entropy;

const MATCH_LABEL: &[u8] = b"gauntlet/match";

/// Bracket errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketError {
    #[error("unsupported bracket size: {0}")]
    UnsupportedSize(usize),
}

/// A scheduled contestant after the eligibility check.
enum CheckIn {
    Ready(Contestant),
    Ineligible(ParticipantId),
}

/// Walks the elimination tree for one tournament.
///
/// Adjacent contestants meet in the first round, winners of adjacent matches
/// meet in the next, and so on. Each match gets its own seed derived from the
/// execution entropy with the round and match index, so the walk is fully
/// reproducible for a given order, entropy and resolver.
pub struct BracketExecutor<'a> {
    resolver: &'a dyn FightResolver,
    registry: &'a dyn EligibilityRegistry,
    policy: SubstitutionPolicy,
    fallback_loadout: LoadoutRef,
}

impl<'a> BracketExecutor<'a> {
    pub fn new(
        resolver: &'a dyn FightResolver,
        registry: &'a dyn EligibilityRegistry,
        policy: SubstitutionPolicy,
        fallback_loadout: LoadoutRef,
    ) -> Self {
        Self {
            resolver,
            registry,
            policy,
            fallback_loadout,
        }
    }

    /// Run the whole bracket.
    pub fn run(
        &self,
        seeding: &[Contestant],
        entropy: &Entropy,
    ) -> Result<BracketOutcome, BracketError> {
        if !is_supported_size(seeding.len()) {
            return Err(BracketError::UnsupportedSize(seeding.len()));
        }

        let rounds = seeding.len().trailing_zeros();
        let mut field = seeding.to_vec();
        let mut matches = Vec::with_capacity(seeding.len() - 1);
        let mut eliminations = Vec::with_capacity(seeding.len() - 1);
        let mut substituted = Vec::new();

        for round in 0..rounds {
            let mut advancing = Vec::with_capacity(field.len() / 2);

            for (index, pair) in field.chunks_exact(2).enumerate() {
                let seed = entropy.derive(MATCH_LABEL, u64::from(round), index as u64);
                let (winner, record) = self.play(round, index as u32, pair[0], pair[1], &seed);

                eliminations.push(Elimination {
                    entrant: record.loser,
                    round,
                });
                substituted.extend_from_slice(&record.substituted);
                advancing.push(winner);
                matches.push(record);
            }

            field = advancing;
        }

        let champion = field[0].entrant;
        let runner_up = matches
            .last()
            .map(|m: &MatchRecord| m.loser)
            .unwrap_or(Entrant::Fallback);

        debug!("bracket: {champion} wins over {runner_up} after {rounds} rounds");

        Ok(BracketOutcome {
            champion,
            runner_up,
            rounds,
            matches,
            eliminations,
            substituted,
        })
    }

    fn play(
        &self,
        round: u32,
        index: u32,
        a: Contestant,
        b: Contestant,
        seed: &Entropy,
    ) -> (Contestant, MatchRecord) {
        let mut substituted = Vec::new();
        let a = self.check_in(a);
        let b = self.check_in(b);

        for check_in in [&a, &b] {
            if let CheckIn::Ineligible(id) = check_in {
                warn!("bracket: participant {id} ineligible for round {round} match {index}");
                substituted.push(*id);
            }
        }

        let fallback = Contestant::fallback(self.fallback_loadout);
        let (a, b) = match (self.policy, a, b) {
            (_, CheckIn::Ready(a), CheckIn::Ready(b)) => (a, b),
            (SubstitutionPolicy::Fallback, a, b) => (
                Self::or_fallback(a, fallback),
                Self::or_fallback(b, fallback),
            ),
            (SubstitutionPolicy::Forfeit, CheckIn::Ready(a), CheckIn::Ineligible(id)) => {
                let record = Self::walkover(round, index, a, Entrant::Real(id), substituted);
                return (a, record);
            }
            (SubstitutionPolicy::Forfeit, CheckIn::Ineligible(id), CheckIn::Ready(b)) => {
                let record = Self::walkover(round, index, b, Entrant::Real(id), substituted);
                return (b, record);
            }
            (SubstitutionPolicy::Forfeit, CheckIn::Ineligible(_), CheckIn::Ineligible(id)) => {
                let record = Self::walkover(round, index, fallback, Entrant::Real(id), substituted);
                return (fallback, record);
            }
        };

        let outcome = self.resolver.resolve(&a, &b, seed);
        let (winner, loser) = match outcome.winner {
            Side::A => (a, b),
            Side::B => (b, a),
        };

        let record = MatchRecord {
            round,
            index,
            a: a.entrant,
            b: b.entrant,
            winner: winner.entrant,
            loser: loser.entrant,
            resolution: Resolution::Fought {
                combat_log: outcome.combat_log,
            },
            substituted,
        };

        (winner, record)
    }

    fn check_in(&self, contestant: Contestant) -> CheckIn {
        match contestant.entrant {
            Entrant::Real(id) if !self.registry.is_eligible(id) => CheckIn::Ineligible(id),
            _ => CheckIn::Ready(contestant),
        }
    }

    fn or_fallback(check_in: CheckIn, fallback: Contestant) -> Contestant {
        match check_in {
            CheckIn::Ready(contestant) => contestant,
            CheckIn::Ineligible(_) => fallback,
        }
    }

    fn walkover(
        round: u32,
        index: u32,
        winner: Contestant,
        loser: Entrant,
        substituted: Vec<ParticipantId>,
    ) -> MatchRecord {
        MatchRecord {
            round,
            index,
            a: winner.entrant,
            b: loser,
            winner: winner.entrant,
            loser,
            resolution: Resolution::Walkover,
            substituted,
        }
    }
}
