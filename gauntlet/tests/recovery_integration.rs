//! Timeout recovery and retry safety.

mod common;

use chrono::Duration;
use common::{FEE, arena, config};
use gauntlet::GauntletError;
use gauntlet::external::memory::EntryType;
use gauntlet::orchestrator::{
    GauntletEvent, ParticipantStatus, TickOutcome, TournamentPhase, TournamentState, WaitReason,
};

#[test]
fn test_recovery_refunds_after_timeout() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.commit();
    let id = arena.select();
    arena.beacon.set_unresponsive(true);

    assert_eq!(
        arena.gauntlet.tick().expect("tick"),
        TickOutcome::Waiting(WaitReason::ExecutionPending)
    );
    assert!(matches!(
        arena.gauntlet.recover(),
        Err(GauntletError::TimeoutNotReached(_))
    ));

    arena.clock.advance(Duration::seconds(3600));
    assert_eq!(arena.gauntlet.recover().expect("recover"), id);

    for participant_id in 1..=4 {
        assert_eq!(arena.escrow.balance(participant_id), FEE);
    }
    assert_eq!(arena.escrow.custody(), 0);
    assert_eq!(arena.gauntlet.locked_funds(), 0);
    assert!(
        arena
            .gauntlet
            .drain_events()
            .iter()
            .any(|e| matches!(e, GauntletEvent::TournamentRecovered { refunded: 400, .. }))
    );
}

#[test]
fn test_timeout_counts_from_latest_request() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.commit();

    arena.clock.advance(Duration::seconds(3000));
    arena.select();
    arena.beacon.set_unresponsive(true);

    // One hour after commit, but not after the execution request.
    arena.clock.advance(Duration::seconds(600));
    assert!(matches!(
        arena.gauntlet.recover(),
        Err(GauntletError::TimeoutNotReached(1))
    ));

    arena.clock.advance(Duration::seconds(3000));
    assert_eq!(arena.gauntlet.recover().expect("recover"), 1);
}

#[test]
fn test_recovery_retry_never_double_refunds() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.commit();
    let id = arena.select();
    arena.beacon.set_unresponsive(true);
    arena.clock.advance(Duration::seconds(3600));

    // Two refunds go through, the third fails.
    arena.escrow.fail_after(2);
    assert!(matches!(
        arena.gauntlet.recover(),
        Err(GauntletError::Escrow(_))
    ));
    assert_eq!(
        arena.gauntlet.tournament(id).map(|t| t.state),
        Some(TournamentState::Pending)
    );

    arena.escrow.set_failing(false);
    assert_eq!(arena.gauntlet.recover().expect("retry"), id);

    for participant_id in 1..=4 {
        assert_eq!(arena.escrow.balance(participant_id), FEE);
    }
    let refunds = arena
        .escrow
        .entries()
        .iter()
        .filter(|e| e.entry_type == EntryType::Refund)
        .count();
    assert_eq!(refunds, 4);
    assert_eq!(arena.escrow.custody(), 0);
}

#[test]
fn test_interrupted_recovery_finishes_after_beacon_returns() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.commit();
    let id = arena.select();
    arena.beacon.set_unresponsive(true);
    arena.clock.advance(Duration::seconds(3600));

    arena.escrow.fail_after(2);
    assert!(arena.gauntlet.recover().is_err());
    let tournament = arena.gauntlet.pending_tournament().expect("still pending");
    assert_eq!(tournament.phase, TournamentPhase::Recovering);
    assert_eq!(
        tournament.participants.iter().filter(|e| e.refunded).count(),
        2
    );
    assert_eq!(
        arena.gauntlet.status_of(1),
        ParticipantStatus::InTournament(id)
    );

    // A readable execution value no longer blocks a recovery already under way.
    arena.beacon.set_unresponsive(false);
    arena.beacon.advance(2);
    assert_eq!(
        arena.gauntlet.tick().expect("tick"),
        TickOutcome::Waiting(WaitReason::Recovering)
    );
    assert!(matches!(
        arena.gauntlet.recover(),
        Err(GauntletError::Escrow(_))
    ));

    arena.escrow.set_failing(false);
    assert_eq!(arena.gauntlet.recover().expect("finish"), id);
    assert_eq!(
        arena.gauntlet.tournament(id).map(|t| t.state),
        Some(TournamentState::Recovered)
    );
    assert!(arena.gauntlet.drain_events().iter().any(|e| matches!(
        e,
        GauntletEvent::TournamentRecovered { refunded: 400, .. }
    )));
    for participant_id in 1..=4 {
        assert_eq!(arena.escrow.balance(participant_id), FEE);
        assert_eq!(
            arena.gauntlet.status_of(participant_id),
            ParticipantStatus::Idle
        );
    }
    assert_eq!(arena.escrow.custody(), 0);
}

#[test]
fn test_new_tournament_after_recovery() {
    let mut arena = arena(config());
    arena.enqueue_all(1..=4);
    arena.commit();
    arena.select();
    arena.beacon.set_unresponsive(true);
    arena.clock.advance(Duration::seconds(3600));
    arena.gauntlet.recover().expect("recover");

    arena.beacon.set_unresponsive(false);
    arena.enqueue_all(1..=4);
    assert_eq!(arena.run_tournament(), 2);
}

#[test]
fn test_recover_without_pending_tournament() {
    let mut arena = arena(config());
    assert!(matches!(
        arena.gauntlet.recover(),
        Err(GauntletError::GauntletNotPending)
    ));
}
