// Draft lottery: weighted, order-preserving draw for the first two picks.
//
// The two winners are drawn without replacement, weighted by the fixed odds
// of their pre-lottery position. Every other eligible team keeps its relative
// order and slides down to fill the gap.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LotteryError;
use crate::random::RandomSource;
use crate::team::Team;

/// Standard odds by pre-lottery position (index 0 is position 1).
///
/// These are relative weights: they total 107.5, and a team's chance in a
/// draw is its weight over the total still in the draw.
pub const DEFAULT_ODDS: [f64; 16] = [
    25.5, 13.5, 11.5, 9.5, 8.5, 7.5, 6.5, 6.0, 5.0, 3.5, 3.0, 2.5, 2.0, 1.5, 1.0, 0.5,
];

/// Number of picks decided by the draw.
pub const DRAWN_PICKS: usize = 2;

// ---------------------------------------------------------------------------
// Odds table
// ---------------------------------------------------------------------------

/// Lottery odds keyed by 1-based pre-lottery position. Positions past the end
/// of the table have zero odds, i.e. they are not lottery-eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsTable {
    odds: Vec<f64>,
}

impl OddsTable {
    /// Build a custom table. Every value must be finite and non-negative, the
    /// table must cover at least two positions, and the total must be
    /// positive. Values are weights and need not sum to 100.
    pub fn new(odds: Vec<f64>) -> Result<Self, LotteryError> {
        if odds.len() < DRAWN_PICKS {
            return Err(LotteryError::InvalidOddsTable {
                message: format!("need at least {DRAWN_PICKS} positions, got {}", odds.len()),
            });
        }
        if let Some((i, v)) = odds
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(LotteryError::InvalidOddsTable {
                message: format!("odds for position {} must be finite and >= 0, got {v}", i + 1),
            });
        }
        let total: f64 = odds.iter().sum();
        if total <= 0.0 {
            return Err(LotteryError::InvalidOddsTable {
                message: "odds must have a positive total".to_string(),
            });
        }
        Ok(OddsTable { odds })
    }

    /// Odds for a 1-based pre-lottery position; 0 outside the table.
    pub fn odds_for(&self, position: usize) -> f64 {
        if position == 0 {
            return 0.0;
        }
        self.odds.get(position - 1).copied().unwrap_or(0.0)
    }

    /// Number of lottery-eligible positions.
    pub fn eligible(&self) -> usize {
        self.odds.len()
    }

    pub fn total(&self) -> f64 {
        self.odds.iter().sum()
    }
}

impl Default for OddsTable {
    fn default() -> Self {
        OddsTable {
            odds: DEFAULT_ODDS.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One lottery-eligible team with its odds and, after the run, its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotteryEntry {
    pub team: Team,
    /// 1-based rank before the lottery.
    pub original_position: usize,
    /// Percentage chance from the odds table.
    pub odds: f64,
    /// 1-based rank after the lottery; equals `original_position` until drawn.
    pub new_position: usize,
    /// `original_position - new_position`; positive means the team moved up.
    pub movement: i32,
}

impl LotteryEntry {
    pub fn new(team: Team, original_position: usize, odds: f64) -> Self {
        LotteryEntry {
            team,
            original_position,
            odds,
            new_position: original_position,
            movement: 0,
        }
    }

    fn place(&mut self, new_position: usize) {
        self.new_position = new_position;
        self.movement = self.original_position as i32 - new_position as i32;
    }
}

/// The post-lottery first-round order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotteryOutcome {
    /// Entries in post-lottery order; index `i` holds new position `i + 1`.
    pub order: Vec<LotteryEntry>,
}

impl LotteryOutcome {
    /// The team awarded the first overall pick.
    pub fn first_winner(&self) -> &LotteryEntry {
        &self.order[0]
    }

    /// The team awarded the second overall pick.
    pub fn second_winner(&self) -> &LotteryEntry {
        &self.order[1]
    }

    /// Teams in post-lottery order.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.order.iter().map(|e| &e.team)
    }

    /// Entries whose position changed.
    pub fn movers(&self) -> impl Iterator<Item = &LotteryEntry> {
        self.order.iter().filter(|e| e.movement != 0)
    }
}

// ---------------------------------------------------------------------------
// Draw
// ---------------------------------------------------------------------------

/// Weighted draw over `entries`, returning the index of the winner.
///
/// Samples `r` uniformly from `[0, total)` and walks the entries in their
/// given order; the first entry with positive odds whose cumulative odds
/// reach `r` wins. If floating-point drift lets the walk fall off the end,
/// the first entry is returned and a warning is logged.
pub fn draw<R: RandomSource + ?Sized>(
    entries: &[LotteryEntry],
    rng: &mut R,
) -> Result<usize, LotteryError> {
    if entries.is_empty() {
        return Err(LotteryError::NotEnoughEntries { found: 0 });
    }

    let total: f64 = entries.iter().map(|e| e.odds).sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(LotteryError::DegenerateOdds { total });
    }

    let r = rng.next_unit() * total;
    let mut cumulative = 0.0;
    for (idx, entry) in entries.iter().enumerate() {
        cumulative += entry.odds;
        if entry.odds > 0.0 && cumulative >= r {
            debug!(
                "draw r={r:.4} of {total:.4} selected {} (position {})",
                entry.team, entry.original_position
            );
            return Ok(idx);
        }
    }

    warn!(
        "lottery walk selected no entry (r={r}, total={total}); falling back to {}",
        entries[0].team
    );
    Ok(0)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs the lottery over a pre-lottery order using an injected random source.
pub struct LotteryEngine<R> {
    odds: OddsTable,
    rng: R,
}

impl<R: RandomSource> LotteryEngine<R> {
    /// Engine with the standard odds table.
    pub fn new(rng: R) -> Self {
        Self::with_odds(OddsTable::default(), rng)
    }

    pub fn with_odds(odds: OddsTable, rng: R) -> Self {
        LotteryEngine { odds, rng }
    }

    pub fn odds(&self) -> &OddsTable {
        &self.odds
    }

    /// Build the entries for the lottery-eligible head of `pre_lottery`.
    pub fn entries(&self, pre_lottery: &[Team]) -> Vec<LotteryEntry> {
        pre_lottery
            .iter()
            .take(self.odds.eligible())
            .enumerate()
            .map(|(i, team)| LotteryEntry::new(team.clone(), i + 1, self.odds.odds_for(i + 1)))
            .collect()
    }

    /// Draw the top two picks and return the reordered lottery-eligible teams.
    ///
    /// `pre_lottery` is the full standings order, worst team first; only the
    /// first `eligible()` teams take part. Nothing past the returned entries
    /// is reordered.
    pub fn run(&mut self, pre_lottery: &[Team]) -> Result<LotteryOutcome, LotteryError> {
        let mut remaining = self.entries(pre_lottery);
        if remaining.len() < DRAWN_PICKS {
            return Err(LotteryError::NotEnoughEntries {
                found: remaining.len(),
            });
        }

        // The first winner is removed before the second draw, so the two
        // winners are always distinct teams.
        let first_idx = draw(&remaining, &mut self.rng)?;
        let mut first = remaining.remove(first_idx);
        let second_idx = draw(&remaining, &mut self.rng)?;
        let mut second = remaining.remove(second_idx);

        first.place(1);
        second.place(2);

        let mut order = Vec::with_capacity(remaining.len() + DRAWN_PICKS);
        order.push(first);
        order.push(second);
        for (offset, mut entry) in remaining.into_iter().enumerate() {
            entry.place(DRAWN_PICKS + offset + 1);
            order.push(entry);
        }

        info!(
            "Lottery complete: {} wins #1 (from {}), {} wins #2 (from {})",
            order[0].team, order[0].original_position, order[1].team, order[1].original_position
        );

        Ok(LotteryOutcome { order })
    }
}
