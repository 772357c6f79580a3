/// Property-based tests for queue and fund invariants using proptest
///
/// Random sequences of enqueues, withdrawals, ticks and beacon progress are
/// replayed against the orchestrator; after every step the queue index,
/// fee pool, participant statuses and escrow custody must agree.
mod common;

use chrono::{DateTime, Duration, Utc};
use common::{Arena, arena, config};
use gauntlet::orchestrator::ParticipantStatus;
use gauntlet::queue::{LoadoutRef, ParticipantQueue, ParticipantSlot};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Enqueue(u64),
    Withdraw(u64),
    Tick,
    Advance(u64),
    Wait(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u64..=12).prop_map(Op::Enqueue),
        2 => (1u64..=12).prop_map(Op::Withdraw),
        3 => Just(Op::Tick),
        2 => (1u64..=3).prop_map(Op::Advance),
        1 => (60i64..=900).prop_map(Op::Wait),
    ]
}

fn apply(arena: &mut Arena, op: &Op) {
    match *op {
        Op::Enqueue(id) => {
            arena.sign_up(id);
            let _ = arena.gauntlet.enqueue(id, id, LoadoutRef(0), 100);
        }
        Op::Withdraw(id) => {
            let _ = arena.gauntlet.withdraw(id, id);
        }
        Op::Tick => {
            arena.gauntlet.tick().expect("collaborators never fail here");
        }
        Op::Advance(rounds) => arena.beacon.advance(rounds),
        Op::Wait(secs) => arena.clock.advance(Duration::seconds(secs)),
    }
}

fn check_invariants(arena: &Arena) -> Result<(), TestCaseError> {
    let gauntlet = &arena.gauntlet;
    let queue = gauntlet.queue();

    prop_assert!(queue.check_consistency().is_ok());
    prop_assert_eq!(
        queue.fee_pool(),
        queue.slots().iter().map(|s| s.fee_paid).sum::<u64>()
    );
    for (i, slot) in queue.slots().iter().enumerate() {
        prop_assert_eq!(gauntlet.queue_position(slot.participant_id), Some(i));
        prop_assert_eq!(
            gauntlet.status_of(slot.participant_id),
            ParticipantStatus::Queued
        );
    }

    if let Some(tournament) = gauntlet.pending_tournament() {
        for participant_id in tournament.participant_ids() {
            prop_assert!(!queue.contains(participant_id));
            prop_assert_eq!(
                gauntlet.status_of(participant_id),
                ParticipantStatus::InTournament(tournament.id)
            );
        }
    }

    prop_assert_eq!(
        arena.escrow.custody(),
        gauntlet.fee_pool() + gauntlet.locked_funds() + gauntlet.accumulated_fees()
    );
    Ok(())
}

fn slot(participant_id: u64, fee_paid: u64) -> ParticipantSlot {
    ParticipantSlot {
        participant_id,
        loadout: LoadoutRef(0),
        owner: participant_id,
        fee_paid,
        ticket: participant_id,
        enqueued_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

proptest! {
    #[test]
    fn test_orchestrator_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..120)) {
        let mut arena = arena(config());
        for op in &ops {
            apply(&mut arena, op);
            check_invariants(&arena)?;
        }
    }

    #[test]
    fn test_take_positions_keeps_index_consistent(
        fees in prop::collection::vec(0u64..1_000, 1..40),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
    ) {
        let mut queue = ParticipantQueue::new();
        for (i, fee) in fees.iter().enumerate() {
            queue.push(slot(i as u64 + 1, *fee)).expect("unique ids");
        }

        let mut positions: Vec<usize> = picks.iter().map(|p| p.index(fees.len())).collect();
        positions.sort_unstable();
        positions.dedup();
        let expected: Vec<u64> = positions
            .iter()
            .map(|&p| queue.slots()[p].participant_id)
            .collect();

        let taken = queue.take_positions(&positions);
        let taken_ids: Vec<u64> = taken.iter().map(|s| s.participant_id).collect();
        prop_assert_eq!(taken_ids, expected);
        prop_assert_eq!(queue.len(), fees.len() - positions.len());
        prop_assert!(queue.check_consistency().is_ok());

        let taken_fees: u64 = taken.iter().map(|s| s.fee_paid).sum();
        prop_assert_eq!(queue.fee_pool() + taken_fees, fees.iter().sum::<u64>());
    }

    #[test]
    fn test_swap_remove_keeps_index_consistent(
        count in 1usize..40,
        removals in prop::collection::vec(1u64..50, 0..40),
    ) {
        let mut queue = ParticipantQueue::new();
        for id in 1..=count as u64 {
            queue.push(slot(id, 10)).expect("unique ids");
        }

        for id in removals {
            let was_queued = queue.contains(id);
            prop_assert_eq!(queue.swap_remove(id).is_some(), was_queued);
            prop_assert!(!queue.contains(id));
            prop_assert!(queue.check_consistency().is_ok());
            prop_assert_eq!(queue.fee_pool(), queue.len() as u64 * 10);
        }
    }
}
