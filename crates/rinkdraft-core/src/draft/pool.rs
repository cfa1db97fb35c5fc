// Draft-eligible players in source order, with per-player drafted flags.

use std::collections::HashMap;

use crate::error::DraftError;
use crate::player::{Player, PlayerId};

/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Players keyed by id, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
}

impl PlayerPool {
    /// Build a pool from players in ranking order. Duplicate ids are rejected.
    pub fn new(players: Vec<Player>) -> Result<Self, DraftError> {
        let mut index = HashMap::with_capacity(players.len());
        for (i, p) in players.iter().enumerate() {
            if index.insert(p.id, i).is_some() {
                return Err(DraftError::DuplicatePlayer { id: p.id });
            }
        }
        Ok(PlayerPool { players, index })
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.index.get(&id).map(|&i| &self.players[i])
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// All players, drafted or not, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Undrafted players in insertion order.
    pub fn available(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.drafted)
    }

    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    /// Undrafted players whose name or position contains `query`
    /// (case-insensitive), in insertion order, at most `limit` of them.
    /// The query is matched as given; whitespace is not stripped.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Player> {
        let needle = query.to_lowercase();
        self.available()
            .filter(|p| p.matches_lowercase(&needle))
            .take(limit)
            .collect()
    }

    /// Look up a player that may be drafted right now.
    pub(crate) fn check_available(&self, id: PlayerId) -> Result<&Player, DraftError> {
        let player = self.get(id).ok_or(DraftError::PlayerNotFound { id })?;
        if player.drafted {
            return Err(DraftError::AlreadyDrafted {
                id,
                name: player.name.clone(),
            });
        }
        Ok(player)
    }

    /// Flip a player to drafted and return the updated copy. Callers must
    /// have run `check_available` first.
    pub(crate) fn mark_drafted(&mut self, id: PlayerId) -> Option<Player> {
        let &i = self.index.get(&id)?;
        let player = &mut self.players[i];
        player.drafted = true;
        Some(player.clone())
    }
}
