// A single reservation in the draft order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::player::Player;
use crate::team::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One team's pick in one round.
///
/// A slot is open until a player is assigned, and the assignment is final:
/// only the allocator fills `player`, and it never overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSlot {
    pub id: SlotId,
    /// 1-based round number.
    pub round: u32,
    /// 1-based pick number within the round.
    pub pick_in_round: u32,
    /// 1-based pick number across the whole draft.
    pub overall: u32,
    /// Team that owns the pick.
    pub team: Team,
    pub(crate) player: Option<Player>,
}

impl DraftSlot {
    pub fn new(id: SlotId, round: u32, pick_in_round: u32, overall: u32, team: Team) -> Self {
        DraftSlot {
            id,
            round,
            pick_in_round,
            overall,
            team,
            player: None,
        }
    }

    /// A slot that was already filled in an earlier session (crash recovery).
    pub fn with_player(mut self, player: Player) -> Self {
        self.player = Some(player);
        self
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.player.is_some()
    }

    /// Display label like "R2 #5 (37)".
    pub fn label(&self) -> String {
        format!("R{} #{} ({})", self.round, self.pick_in_round, self.overall)
    }
}
