// Stand-in pick simulators used when a team's pick is simulated.

use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use rinkdraft_core::{
    DraftSlot, PickSimulator, Player, PlayerId, RandomSource, SeededRandom, ThreadRandom,
};
use tracing::debug;

use crate::config::{SimulationConfig, SimulationStrategy};

/// Always takes the highest-ranked available prospect.
#[derive(Debug, Default, Clone, Copy)]
pub struct BestAvailable;

#[async_trait]
impl PickSimulator for BestAvailable {
    async fn choose(
        &self,
        _slot: &DraftSlot,
        available: &[Player],
    ) -> anyhow::Result<Option<PlayerId>> {
        Ok(available.first().map(|p| p.id))
    }
}

/// Random choice among the top `top_n` available prospects.
///
/// Weights fall off linearly with rank: with `top_n = 3` the best prospect is
/// taken half the time, the second a third and the third a sixth.
pub struct WeightedTopN {
    top_n: usize,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl WeightedTopN {
    pub fn new(top_n: usize, rng: Box<dyn RandomSource>) -> Self {
        WeightedTopN {
            top_n: top_n.max(1),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl PickSimulator for WeightedTopN {
    async fn choose(
        &self,
        slot: &DraftSlot,
        available: &[Player],
    ) -> anyhow::Result<Option<PlayerId>> {
        let candidates = &available[..available.len().min(self.top_n)];
        if candidates.is_empty() {
            return Ok(None);
        }

        let n = candidates.len();
        let total = (n * (n + 1) / 2) as f64;
        let sample = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| anyhow!("random source lock poisoned"))?;
            rng.next_unit()
        };
        let r = sample * total;

        let mut cumulative = 0.0;
        for (i, player) in candidates.iter().enumerate() {
            cumulative += (n - i) as f64;
            if r < cumulative {
                debug!("{} takes candidate {} of {}", slot.label(), i + 1, n);
                return Ok(Some(player.id));
            }
        }
        Ok(candidates.last().map(|p| p.id))
    }
}

/// Build the configured simulator. A seed makes weighted choices repeatable.
pub fn from_config(config: &SimulationConfig, seed: Option<u64>) -> Box<dyn PickSimulator> {
    match config.strategy {
        SimulationStrategy::BestAvailable => Box::new(BestAvailable),
        SimulationStrategy::WeightedTopN => {
            let rng: Box<dyn RandomSource> = match seed {
                // Offset so picks don't replay the lottery's sample stream.
                Some(seed) => Box::new(SeededRandom::new(seed.wrapping_add(1))),
                None => Box::new(ThreadRandom),
            };
            Box::new(WeightedTopN::new(config.top_n, rng))
        }
    }
}
