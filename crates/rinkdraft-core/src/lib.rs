// Library root for the draft core: lottery engine, draft-order builder and
// the pick allocator, plus the shared team/player/slot types they operate on.

pub mod draft;
pub mod error;
pub mod lottery;
pub mod player;
pub mod random;
pub mod team;

pub use draft::allocator::{DraftAllocator, DraftProgress, DraftStatus, PickResult, PickTicket};
pub use draft::order::{build_draft_order, validate_slots};
pub use draft::pool::PlayerPool;
pub use draft::simulator::PickSimulator;
pub use draft::slot::{DraftSlot, SlotId};
pub use error::{DraftError, LotteryError};
pub use lottery::{LotteryEngine, LotteryEntry, LotteryOutcome, OddsTable};
pub use player::{Player, PlayerId, Position};
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use team::{Team, TeamId};
