//! End-to-end tournament lifecycle tests.

mod common;

use common::{FEE, LowestIdWins, arena, arena_with_resolver, config};
use gauntlet::bracket::Entrant;
use gauntlet::external::memory::WinLossRecord;
use gauntlet::orchestrator::{
    GauntletEvent, ParticipantStatus, TickOutcome, TournamentPhase, TournamentState, WaitReason,
};
use gauntlet::rewards::Reward;
use std::sync::Arc;

#[test]
fn test_four_player_lifecycle() {
    let mut arena = arena_with_resolver(config(), Arc::new(LowestIdWins));
    arena.enqueue_all(1..=4);
    assert_eq!(arena.escrow.custody(), 4 * FEE);

    let id = arena.run_tournament();
    let tournament = arena.gauntlet.tournament(id).expect("tournament");

    assert_eq!(tournament.state, TournamentState::Completed);
    assert_eq!(tournament.phase, TournamentPhase::Executed);
    assert_eq!(tournament.champion, Some(Entrant::Real(1)));
    assert!(tournament.substituted.is_empty());

    let split = tournament.fee_split.expect("settled");
    assert_eq!(split.total_collected, 400);
    assert_eq!(split.platform_fee, 40);
    assert_eq!(split.prize, 360);
    assert_eq!(arena.escrow.balance(1), 360);
    assert_eq!(arena.gauntlet.accumulated_fees(), 40);
    assert_eq!(arena.escrow.custody(), 40);

    // Champion: two wins, no losses, top tier reward.
    assert_eq!(
        arena.ledger.record_of(1),
        WinLossRecord { wins: 2, losses: 0 }
    );
    assert_eq!(arena.ledger.rewards_of(1), Reward::new(100, 2));

    let Some(Entrant::Real(runner_up)) = tournament.runner_up else {
        panic!("runner-up must be real");
    };
    assert_eq!(
        arena.ledger.record_of(runner_up),
        WinLossRecord { wins: 1, losses: 1 }
    );
    assert_eq!(arena.ledger.rewards_of(runner_up), Reward::new(50, 1));

    // First-round losers have a record but fall outside the reward table.
    for participant_id in (2..=4).filter(|&p| p != runner_up) {
        assert_eq!(
            arena.ledger.record_of(participant_id),
            WinLossRecord { wins: 0, losses: 1 }
        );
        assert!(arena.ledger.rewards_of(participant_id).is_zero());
    }
}

#[test]
fn test_placements_cover_every_entrant() {
    let mut cfg = config();
    cfg.tournament_size = 8;
    let mut arena = arena(cfg);
    arena.enqueue_all(1..=8);

    let id = arena.run_tournament();
    let tournament = arena.gauntlet.tournament(id).expect("tournament");

    assert_eq!(tournament.placements.len(), 8);
    let mut tiers: Vec<u32> = tournament.placements.iter().map(|p| p.tier).collect();
    tiers.sort_unstable();
    assert_eq!(tiers, vec![0, 1, 2, 2, 3, 3, 3, 3]);
    assert_eq!(tournament.placements[0].tier, 0);
    assert_eq!(
        Some(Entrant::Real(tournament.placements[0].participant_id)),
        tournament.champion
    );
}

#[test]
fn test_events_follow_lifecycle() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.run_tournament();

    let events: Vec<GauntletEvent> = arena.gauntlet.drain_events().into_iter().collect();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            GauntletEvent::ParticipantQueued { .. } => "queued",
            GauntletEvent::TournamentCommitted { .. } => "committed",
            GauntletEvent::ParticipantsSelected { .. } => "selected",
            GauntletEvent::TournamentCompleted { .. } => "completed",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["queued", "queued", "queued", "queued", "committed", "selected", "completed"]
    );
    assert!(arena.gauntlet.drain_events().is_empty());
}

#[test]
fn test_queue_keeps_filling_during_tournament() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    let id = arena.commit();
    arena.select();

    arena.enqueue_all(5..=8);
    assert_eq!(arena.gauntlet.queue_len(), 4);
    assert_eq!(arena.gauntlet.status_of(5), ParticipantStatus::Queued);

    assert_eq!(arena.execute(), id);
    assert_eq!(arena.gauntlet.queue_len(), 4);
}

#[test]
fn test_selected_participant_cannot_requeue() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    let id = arena.commit();
    arena.select();

    arena.escrow.deposit(1, FEE);
    let err = arena
        .gauntlet
        .enqueue(1, 1, gauntlet::queue::LoadoutRef(1), FEE)
        .expect_err("in tournament");
    assert!(matches!(
        err,
        gauntlet::GauntletError::AlreadyInTournament {
            participant_id: 1,
            tournament_id
        } if tournament_id == id
    ));
}

#[test]
fn test_selection_waits_when_queue_shrinks() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.commit();

    // The selection value is not readable yet, so withdrawing is allowed.
    assert_eq!(arena.gauntlet.withdraw(4, 4).expect("withdraw"), FEE);
    arena.beacon.advance(2);
    assert_eq!(
        arena.gauntlet.tick().expect("tick"),
        TickOutcome::Waiting(WaitReason::QueueTooShort {
            queued: 3,
            needed: 4
        })
    );
}

#[test]
fn test_disabled_game_does_not_commit() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena
        .gauntlet
        .set_enabled(common::OPERATOR, false)
        .expect("operator");

    assert_eq!(
        arena.gauntlet.tick().expect("tick"),
        TickOutcome::Waiting(WaitReason::Disabled)
    );
}

#[test]
fn test_history_grows_across_tournaments() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.run_tournament();

    arena.clock.advance(chrono::Duration::seconds(600));
    arena.enqueue_all(5..=8);
    assert_eq!(arena.run_tournament(), 2);

    assert_eq!(arena.gauntlet.tournaments().len(), 2);
    assert_eq!(arena.gauntlet.accumulated_fees(), 80);
}
