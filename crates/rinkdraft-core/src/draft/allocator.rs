// Pick allocator: owns the draft order and commits players to slots one at a
// time, in overall-pick order.
//
// Every transition validates before it mutates, so an `Err` always leaves
// the allocator exactly as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::draft::order::validate_slots;
use crate::draft::pool::{PlayerPool, DEFAULT_SEARCH_LIMIT};
use crate::draft::simulator::PickSimulator;
use crate::draft::slot::{DraftSlot, SlotId};
use crate::error::DraftError;
use crate::player::{Player, PlayerId};
use crate::team::TeamId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftStatus {
    InProgress,
    Complete,
}

/// Where the draft stands after a pick.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftProgress {
    /// The next open slot.
    OnTheClock(DraftSlot),
    /// No open slots remain.
    Complete,
}

/// A committed pick and the state it left the draft in.
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    /// The slot that was just filled.
    pub pick: DraftSlot,
    pub progress: DraftProgress,
}

impl PickResult {
    pub fn is_final(&self) -> bool {
        matches!(self.progress, DraftProgress::Complete)
    }
}

/// Reservation of the current slot while a choice is made elsewhere.
///
/// While a ticket is outstanding every other pick attempt is rejected with
/// [`DraftError::PickInFlight`]. Not `Clone`: exactly one holder may fulfill
/// or release it.
#[derive(Debug, PartialEq, Eq)]
pub struct PickTicket {
    slot: SlotId,
}

impl PickTicket {
    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

/// Drives a draft from the first open slot to completion.
#[derive(Debug, Clone)]
pub struct DraftAllocator {
    slots: Vec<DraftSlot>,
    /// Index of the first open slot, `None` once the draft is complete.
    current: Option<usize>,
    pool: PlayerPool,
    in_flight: Option<SlotId>,
    search_limit: usize,
}

impl DraftAllocator {
    /// Take ownership of a full slot list and the draft-eligible players.
    ///
    /// Slots that already carry a player (a draft restored from storage) mark
    /// that player drafted; each such player must be in `players` and may
    /// fill only one slot.
    pub fn new(slots: Vec<DraftSlot>, players: Vec<Player>) -> Result<Self, DraftError> {
        validate_slots(&slots)?;
        let mut pool = PlayerPool::new(players)?;
        let mut slots = slots;

        for slot in slots.iter_mut() {
            let Some(prior) = slot.player.as_ref() else {
                continue;
            };
            let id = prior.id;
            pool.check_available(id)?;
            slot.player = pool.mark_drafted(id);
        }

        let current = slots.iter().position(|s| !s.is_completed());
        let restored = slots.iter().filter(|s| s.is_completed()).count();
        info!(
            "Draft initialized: {} slots ({} already filled), {} players",
            slots.len(),
            restored,
            pool.len()
        );

        Ok(DraftAllocator {
            slots,
            current,
            pool,
            in_flight: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
        })
    }

    /// Override the cap on `filter_available` results (minimum 1).
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    // -----------------------------------------------------------------------
    // Read views
    // -----------------------------------------------------------------------

    /// The first open slot in overall-pick order.
    pub fn current_pick(&self) -> Option<&DraftSlot> {
        self.current.map(|i| &self.slots[i])
    }

    pub fn status(&self) -> DraftStatus {
        if self.current.is_some() {
            DraftStatus::InProgress
        } else {
            DraftStatus::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status() == DraftStatus::Complete
    }

    /// Slot currently reserved by an outstanding [`PickTicket`].
    pub fn in_flight(&self) -> Option<SlotId> {
        self.in_flight
    }

    pub fn slots(&self) -> &[DraftSlot] {
        &self.slots
    }

    pub fn open_slots(&self) -> impl Iterator<Item = &DraftSlot> {
        self.slots.iter().filter(|s| !s.is_completed())
    }

    pub fn open_slots_in_round(&self, round: u32) -> impl Iterator<Item = &DraftSlot> {
        self.open_slots().filter(move |s| s.round == round)
    }

    pub fn completed_picks(&self) -> impl Iterator<Item = &DraftSlot> {
        self.slots.iter().filter(|s| s.is_completed())
    }

    /// Completed picks made by one team.
    pub fn picks_for_team(&self, team: TeamId) -> impl Iterator<Item = &DraftSlot> {
        self.completed_picks().filter(move |s| s.team.id == team)
    }

    /// Highest round number in the draft.
    pub fn rounds(&self) -> u32 {
        self.slots.iter().map(|s| s.round).max().unwrap_or(0)
    }

    pub fn pool(&self) -> &PlayerPool {
        &self.pool
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.pool.get(id)
    }

    pub fn available_count(&self) -> usize {
        self.pool.available_count()
    }

    /// Undrafted players matching `query` by name or position,
    /// case-insensitive, in pool order, capped at the search limit.
    pub fn filter_available(&self, query: &str) -> Vec<&Player> {
        self.pool.search(query, self.search_limit)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Commit `player` to the current slot and advance.
    pub fn commit_pick(&mut self, player: PlayerId) -> Result<PickResult, DraftError> {
        if let Some(slot) = self.in_flight {
            return Err(DraftError::PickInFlight { slot });
        }
        let idx = self.open_index()?;
        self.apply(idx, player)
    }

    /// Reserve the current slot for an out-of-band choice. Pair with
    /// [`fulfill`](Self::fulfill) or [`release`](Self::release).
    pub fn reserve(&mut self) -> Result<PickTicket, DraftError> {
        if let Some(slot) = self.in_flight {
            return Err(DraftError::PickInFlight { slot });
        }
        let idx = self.open_index()?;
        let slot = self.slots[idx].id;
        self.in_flight = Some(slot);
        debug!("Reserved slot {} ({})", slot, self.slots[idx].label());
        Ok(PickTicket { slot })
    }

    /// Commit `player` against a reservation. On error the reservation is
    /// kept so the holder can retry or release it.
    pub fn fulfill(
        &mut self,
        ticket: &PickTicket,
        player: PlayerId,
    ) -> Result<PickResult, DraftError> {
        if self.in_flight != Some(ticket.slot) {
            return Err(DraftError::StaleTicket);
        }
        let idx = self.open_index()?;
        if self.slots[idx].id != ticket.slot {
            return Err(DraftError::StaleTicket);
        }
        let result = self.apply(idx, player)?;
        self.in_flight = None;
        Ok(result)
    }

    /// Drop a reservation without picking. A ticket that was already
    /// fulfilled is ignored.
    pub fn release(&mut self, ticket: PickTicket) {
        if self.in_flight == Some(ticket.slot) {
            debug!("Released slot {}", ticket.slot);
            self.in_flight = None;
        }
    }

    /// Let `simulator` choose for the current slot, then commit its choice.
    ///
    /// Nothing is mutated until the simulator has answered, so a failure, an
    /// empty answer, or dropping the future mid-flight all leave the draft
    /// unchanged and the same slot on the clock.
    pub async fn simulate_pick<S>(&mut self, simulator: &S) -> Result<PickResult, DraftError>
    where
        S: PickSimulator + ?Sized,
    {
        if let Some(slot) = self.in_flight {
            return Err(DraftError::PickInFlight { slot });
        }
        let idx = self.open_index()?;
        let slot = self.slots[idx].clone();
        let available: Vec<Player> = self.pool.available().cloned().collect();

        let choice = match simulator.choose(&slot, &available).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!("Simulator returned no player for {}", slot.label());
                return Err(DraftError::NoPlayerChosen { slot: slot.id });
            }
            Err(e) => {
                warn!("Simulator failed for {}: {:#}", slot.label(), e);
                return Err(DraftError::SimulationFailed {
                    slot: slot.id,
                    reason: format!("{e:#}"),
                });
            }
        };

        self.apply(idx, choice)
    }

    fn open_index(&self) -> Result<usize, DraftError> {
        self.current.ok_or(DraftError::DraftComplete)
    }

    /// Validate, then write the pick and advance the pointer.
    fn apply(&mut self, idx: usize, player: PlayerId) -> Result<PickResult, DraftError> {
        self.pool.check_available(player)?;
        let drafted = self
            .pool
            .mark_drafted(player)
            .ok_or(DraftError::PlayerNotFound { id: player })?;

        let slot = &mut self.slots[idx];
        slot.player = Some(drafted);
        info!(
            "Pick {}: {} selects {}",
            slot.label(),
            slot.team,
            slot.player.as_ref().map(|p| p.name.as_str()).unwrap_or_default()
        );
        let pick = slot.clone();

        self.current = self.slots[idx + 1..]
            .iter()
            .position(|s| !s.is_completed())
            .map(|offset| idx + 1 + offset);

        let progress = match self.current_pick() {
            Some(next) => DraftProgress::OnTheClock(next.clone()),
            None => {
                info!("Draft complete: {} picks made", self.slots.len());
                DraftProgress::Complete
            }
        };

        Ok(PickResult { pick, progress })
    }
}
