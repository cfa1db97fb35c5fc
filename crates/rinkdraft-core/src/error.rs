// Error types for the lottery and the allocator.

use thiserror::Error;

use crate::draft::slot::SlotId;
use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LotteryError {
    #[error("lottery needs at least 2 eligible entries, found {found}")]
    NotEnoughEntries { found: usize },

    #[error("lottery odds total {total} is not a positive finite number")]
    DegenerateOdds { total: f64 },

    #[error("invalid odds table: {message}")]
    InvalidOddsTable { message: String },
}

/// Every variant is returned before any allocator state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("invalid draft slots: {message}")]
    InvalidSlots { message: String },

    #[error("player {id} appears more than once in the player pool")]
    DuplicatePlayer { id: PlayerId },

    #[error("invalid pick: the draft is complete")]
    DraftComplete,

    #[error("invalid pick: player {id} is not in the player pool")]
    PlayerNotFound { id: PlayerId },

    #[error("invalid pick: {name} (player {id}) has already been drafted")]
    AlreadyDrafted { id: PlayerId, name: String },

    #[error("invalid pick: slot {slot} already has a pick in flight")]
    PickInFlight { slot: SlotId },

    #[error("invalid pick: ticket does not match the pick in flight")]
    StaleTicket,

    #[error("simulated pick for slot {slot} failed: {reason}")]
    SimulationFailed { slot: SlotId, reason: String },

    #[error("simulator returned no player for slot {slot}")]
    NoPlayerChosen { slot: SlotId },
}

impl DraftError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DraftError::SimulationFailed { .. } | DraftError::NoPlayerChosen { .. }
        )
    }
}
