// Capability for choosing a player on a team's behalf.

use async_trait::async_trait;

use crate::draft::slot::DraftSlot;
use crate::player::{Player, PlayerId};

/// Picks a player for the slot on the clock.
///
/// `available` holds the undrafted players in pool order. Returning
/// `Ok(None)` or `Err(_)` leaves the pick open; the allocator reports the
/// failure and the caller may retry.
#[async_trait]
pub trait PickSimulator: Send + Sync {
    async fn choose(
        &self,
        slot: &DraftSlot,
        available: &[Player],
    ) -> anyhow::Result<Option<PlayerId>>;
}
