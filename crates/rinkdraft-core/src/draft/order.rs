// Full draft order: lottery-adjusted first round followed by standings-order
// later rounds, plus validation of any externally supplied slot list.

use std::collections::HashSet;

use crate::draft::slot::{DraftSlot, SlotId};
use crate::error::DraftError;
use crate::lottery::LotteryOutcome;
use crate::team::{Team, TeamId};

/// Build every slot of a `rounds`-round draft.
///
/// `standings` is the full pre-lottery order, worst team first. Round 1 uses
/// the lottery order for the eligible teams and standings order for the rest;
/// rounds 2 and later use standings order unchanged. Slot ids and overall
/// numbers run from 1.
pub fn build_draft_order(
    standings: &[Team],
    lottery: &LotteryOutcome,
    rounds: u32,
) -> Result<Vec<DraftSlot>, DraftError> {
    if rounds == 0 {
        return Err(invalid("a draft needs at least one round"));
    }

    let known: HashSet<TeamId> = standings.iter().map(|t| t.id).collect();
    if known.len() != standings.len() {
        return Err(invalid("standings list a team more than once"));
    }
    if let Some(stranger) = lottery.teams().find(|t| !known.contains(&t.id)) {
        return Err(invalid(format!(
            "lottery team {} ({}) is not in the standings",
            stranger, stranger.id
        )));
    }

    let drawn: HashSet<TeamId> = lottery.teams().map(|t| t.id).collect();
    let first_round: Vec<&Team> = lottery
        .teams()
        .chain(standings.iter().filter(|t| !drawn.contains(&t.id)))
        .collect();

    let mut slots = Vec::with_capacity(standings.len() * rounds as usize);
    let mut overall = 0u32;
    for round in 1..=rounds {
        let teams: Box<dyn Iterator<Item = &Team>> = if round == 1 {
            Box::new(first_round.iter().copied())
        } else {
            Box::new(standings.iter())
        };
        for (i, team) in teams.enumerate() {
            overall += 1;
            slots.push(DraftSlot::new(
                SlotId(overall),
                round,
                i as u32 + 1,
                overall,
                team.clone(),
            ));
        }
    }

    Ok(slots)
}

/// Check the slot-list invariants the allocator relies on:
///
/// - round and pick-within-round are 1-based
/// - each (round, pick) pair and each slot id appears once
/// - overall numbers are 1, 2, 3, ... in list order
/// - list order is (round, pick) ascending
pub fn validate_slots(slots: &[DraftSlot]) -> Result<(), DraftError> {
    let mut ids = HashSet::with_capacity(slots.len());
    let mut pairs = HashSet::with_capacity(slots.len());

    for (i, slot) in slots.iter().enumerate() {
        if slot.round == 0 || slot.pick_in_round == 0 {
            return Err(invalid(format!(
                "slot {} has round {} pick {}; both must be >= 1",
                slot.id, slot.round, slot.pick_in_round
            )));
        }
        if !ids.insert(slot.id) {
            return Err(invalid(format!("slot id {} is duplicated", slot.id)));
        }
        if !pairs.insert((slot.round, slot.pick_in_round)) {
            return Err(invalid(format!(
                "round {} pick {} appears more than once",
                slot.round, slot.pick_in_round
            )));
        }
        let expected = i as u32 + 1;
        if slot.overall != expected {
            return Err(invalid(format!(
                "slot {} has overall pick {}, expected {}",
                slot.id, slot.overall, expected
            )));
        }
        if i > 0 {
            let prev = &slots[i - 1];
            if (prev.round, prev.pick_in_round) >= (slot.round, slot.pick_in_round) {
                return Err(invalid(format!(
                    "overall pick {} ({}) is out of round order",
                    slot.overall,
                    slot.label()
                )));
            }
        }
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> DraftError {
    DraftError::InvalidSlots {
        message: message.into(),
    }
}
