// SQLite persistence layer for lottery results and committed picks.

use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use rinkdraft_core::{DraftSlot, LotteryOutcome, PlayerId, TeamId};
use rusqlite::{params, Connection};

/// A committed pick as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPick {
    pub overall: u32,
    pub round: u32,
    pub pick_in_round: u32,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: String,
}

/// One row of a stored lottery result.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLotteryEntry {
    pub new_position: usize,
    pub original_position: usize,
    pub team_id: TeamId,
    pub odds: f64,
    pub movement: i32,
}

/// SQLite-backed persistence for lottery results, draft picks, and
/// key-value draft state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS lottery_results (
                draft_id          TEXT NOT NULL,
                new_position      INTEGER NOT NULL,
                original_position INTEGER NOT NULL,
                team_id           INTEGER NOT NULL,
                odds              REAL NOT NULL,
                movement          INTEGER NOT NULL,
                PRIMARY KEY (draft_id, new_position)
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                draft_id      TEXT NOT NULL,
                overall       INTEGER NOT NULL,
                round         INTEGER NOT NULL,
                pick_in_round INTEGER NOT NULL,
                team_id       INTEGER NOT NULL,
                player_id     INTEGER NOT NULL,
                player_name   TEXT NOT NULL,
                position      TEXT NOT NULL,
                timestamp     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (draft_id, overall)
            );

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_draft_picks_draft_id ON draft_picks(draft_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn().execute_batch(sql)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn row_count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Lottery
    // ------------------------------------------------------------------

    /// Store a lottery result, replacing any earlier result for `draft_id`.
    pub fn record_lottery(&self, outcome: &LotteryOutcome, draft_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "DELETE FROM lottery_results WHERE draft_id = ?1",
            params![draft_id],
        )
        .context("failed to clear previous lottery result")?;
        for entry in &outcome.order {
            tx.execute(
                "INSERT INTO lottery_results
                    (draft_id, new_position, original_position, team_id, odds, movement)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    draft_id,
                    entry.new_position as i64,
                    entry.original_position as i64,
                    entry.team.id.0,
                    entry.odds,
                    entry.movement,
                ],
            )
            .context("failed to insert lottery entry")?;
        }
        tx.commit().context("failed to commit lottery result")?;
        Ok(())
    }

    /// Load the lottery result for `draft_id` in post-lottery order. Empty if
    /// no lottery has been recorded.
    pub fn load_lottery(&self, draft_id: &str) -> Result<Vec<StoredLotteryEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT new_position, original_position, team_id, odds, movement
                 FROM lottery_results WHERE draft_id = ?1 ORDER BY new_position",
            )
            .context("failed to prepare load_lottery query")?;

        let rows = stmt
            .query_map(params![draft_id], |row| {
                let new_position: i64 = row.get(0)?;
                let original_position: i64 = row.get(1)?;
                Ok(StoredLotteryEntry {
                    new_position: new_position as usize,
                    original_position: original_position as usize,
                    team_id: TeamId(row.get(2)?),
                    odds: row.get(3)?,
                    movement: row.get(4)?,
                })
            })
            .context("failed to query lottery results")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map lottery rows")?;

        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Picks
    // ------------------------------------------------------------------

    /// Record a completed pick. Uses INSERT OR IGNORE so re-recording the
    /// same overall pick is a no-op. Timestamp is generated by SQLite.
    pub fn record_pick(&self, slot: &DraftSlot, draft_id: &str) -> Result<()> {
        let Some(player) = slot.player() else {
            bail!("slot {} has no player to record", slot.label());
        };
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO draft_picks
                (draft_id, overall, round, pick_in_round, team_id, player_id, player_name, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                draft_id,
                slot.overall,
                slot.round,
                slot.pick_in_round,
                slot.team.id.0,
                player.id.0,
                player.name,
                player.position.display_str(),
            ],
        )
        .context("failed to record draft pick")?;
        Ok(())
    }

    /// Load picks for a draft session, ordered by overall pick.
    pub fn load_picks(&self, draft_id: &str) -> Result<Vec<StoredPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT overall, round, pick_in_round, team_id, player_id, player_name, position
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY overall",
            )
            .context("failed to prepare load_picks query")?;

        let picks = stmt
            .query_map(params![draft_id], |row| {
                Ok(StoredPick {
                    overall: row.get(0)?,
                    round: row.get(1)?,
                    pick_in_round: row.get(2)?,
                    team_id: TeamId(row.get(3)?),
                    player_id: PlayerId(row.get(4)?),
                    player_name: row.get(5)?,
                    position: row.get(6)?,
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        Ok(picks)
    }

    /// Returns `true` if a lottery has been recorded for `draft_id`.
    pub fn has_draft_in_progress(&self, draft_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM lottery_results WHERE draft_id = ?1)",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to check lottery_results existence")?;
        Ok(exists)
    }

    /// Number of picks recorded for `draft_id`.
    pub fn pick_count(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM draft_picks WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count draft picks")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`, overwriting any previous
    /// value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM draft_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query draft state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Draft ID management
    // ------------------------------------------------------------------

    const DRAFT_ID_KEY: &'static str = "current_draft_id";

    /// The draft id of the session in progress, if any.
    pub fn get_draft_id(&self) -> Result<Option<String>> {
        let value = self.load_state(Self::DRAFT_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    pub fn set_draft_id(&self, draft_id: &str) -> Result<()> {
        self.save_state(
            Self::DRAFT_ID_KEY,
            &serde_json::Value::String(draft_id.to_string()),
        )
    }

    /// Generate a new draft id from the current UTC timestamp.
    ///
    /// Format: `draft_YYYYMMDD_HHMMSS_mmm` (e.g. `draft_20250621_190512_123`).
    pub fn generate_draft_id() -> String {
        let now = chrono::Utc::now();
        format!("draft_{}", now.format("%Y%m%d_%H%M%S_%3f"))
    }
}
