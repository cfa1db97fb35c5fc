// Draft session: binds the allocator to persistence and drives it from the
// command loop.
//
// Every committed pick is written to the database under the session's draft
// id. A failed write is reported, never retried, and never rolls back the
// in-memory pick.

use std::collections::HashMap;

use anyhow::{bail, Context};
use rinkdraft_core::{
    build_draft_order, DraftAllocator, DraftError, DraftProgress, DraftSlot, LotteryEngine,
    LotteryEntry, LotteryOutcome, PickResult, PickSimulator, Player, PlayerId, RandomSource,
    SeededRandom, Team, TeamId, ThreadRandom,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::DraftData;
use crate::db::Database;
use crate::protocol::{DraftUpdate, UserCommand};
use crate::simulators;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A committed pick plus the outcome of writing it to the database.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPick {
    pub result: PickResult,
    /// Set when the pick could not be persisted.
    pub persist_error: Option<String>,
}

/// Live state of one draft.
pub struct DraftSession {
    config: Config,
    draft_id: String,
    lottery: LotteryOutcome,
    allocator: DraftAllocator,
    db: Database,
    simulator: Box<dyn PickSimulator>,
}

impl DraftSession {
    /// Resume the draft recorded in the database, or start a new one when
    /// there is none (or the recorded one is finished).
    pub fn open(config: Config, data: DraftData, db: Database) -> anyhow::Result<Self> {
        if let Some(draft_id) = db.get_draft_id()? {
            let recovered = recover_from_db(config.clone(), data.clone(), db, &draft_id)?;
            match recovered {
                Ok(session) if !session.allocator.is_complete() => return Ok(session),
                Ok(session) => {
                    info!("Draft {} already complete, starting a new one", draft_id);
                    return Self::start(config, data, session.db);
                }
                Err(db) => return Self::start(config, data, db),
            }
        }
        Self::start(config, data, db)
    }

    /// Start a fresh draft with the configured random source.
    pub fn start(config: Config, data: DraftData, db: Database) -> anyhow::Result<Self> {
        let rng: Box<dyn RandomSource> = match config.draft.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom),
        };
        Self::start_with_rng(config, data, db, rng)
    }

    /// Run the lottery and build the full draft order, then record the
    /// lottery and mark the new draft current.
    pub fn start_with_rng<R: RandomSource>(
        config: Config,
        data: DraftData,
        db: Database,
        rng: R,
    ) -> anyhow::Result<Self> {
        let draft_id = Database::generate_draft_id();
        info!("Starting {} draft {}", config.draft.year, draft_id);

        let mut engine = LotteryEngine::with_odds(config.odds.clone(), rng);
        let lottery = engine
            .run(&data.standings)
            .context("draft lottery failed")?;

        let slots = build_draft_order(&data.standings, &lottery, config.draft.rounds)?;
        let allocator = DraftAllocator::new(slots, data.prospects)?
            .with_search_limit(config.draft.search_limit);
        let simulator = simulators::from_config(&config.simulation, config.draft.seed);

        // Only a draft that can actually run becomes the stored current draft.
        db.record_lottery(&lottery, &draft_id)?;
        db.set_draft_id(&draft_id)?;

        Ok(DraftSession {
            config,
            draft_id,
            lottery,
            allocator,
            db,
            simulator,
        })
    }

    /// Replace the configured simulator.
    pub fn with_simulator(mut self, simulator: Box<dyn PickSimulator>) -> Self {
        self.simulator = simulator;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn draft_id(&self) -> &str {
        &self.draft_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lottery(&self) -> &LotteryOutcome {
        &self.lottery
    }

    pub fn allocator(&self) -> &DraftAllocator {
        &self.allocator
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    // -----------------------------------------------------------------------
    // Picks
    // -----------------------------------------------------------------------

    /// Commit `player` to the slot on the clock and persist it.
    pub fn commit_pick(&mut self, player: PlayerId) -> Result<SessionPick, DraftError> {
        let result = self.allocator.commit_pick(player)?;
        let persist_error = self.persist(&result.pick);
        Ok(SessionPick {
            result,
            persist_error,
        })
    }

    /// Let the simulator make the pick on the clock and persist it.
    pub async fn simulate_pick(&mut self) -> Result<SessionPick, DraftError> {
        let result = self
            .allocator
            .simulate_pick(self.simulator.as_ref())
            .await?;
        let persist_error = self.persist(&result.pick);
        Ok(SessionPick {
            result,
            persist_error,
        })
    }

    fn persist(&self, slot: &DraftSlot) -> Option<String> {
        match self.db.record_pick(slot, &self.draft_id) {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to persist pick {}: {:#}", slot.label(), e);
                Some(format!("{e:#}"))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Available prospects matching `query`, capped at the search limit.
    pub fn search(&self, query: &str) -> Vec<Player> {
        self.allocator
            .filter_available(query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every slot, or only those in `round`.
    pub fn board(&self, round: Option<u32>) -> Vec<DraftSlot> {
        self.allocator
            .slots()
            .iter()
            .filter(|s| round.map_or(true, |r| s.round == r))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Crash recovery
// ---------------------------------------------------------------------------

/// Rebuild a session from the lottery and picks stored under `draft_id`.
///
/// Returns `Ok(Err(db))`, handing the database back, when nothing is stored
/// for that draft. Stored data that no longer matches the data files is an
/// error.
pub fn recover_from_db(
    config: Config,
    data: DraftData,
    db: Database,
    draft_id: &str,
) -> anyhow::Result<Result<DraftSession, Database>> {
    if !db.has_draft_in_progress(draft_id)? {
        info!("No draft in progress for draft_id={}, starting fresh", draft_id);
        return Ok(Err(db));
    }

    let teams: HashMap<TeamId, &Team> = data.standings.iter().map(|t| (t.id, t)).collect();
    let mut order = Vec::new();
    for entry in db.load_lottery(draft_id)? {
        let Some(team) = teams.get(&entry.team_id) else {
            bail!(
                "stored lottery for {} names team {} which is not in the standings",
                draft_id,
                entry.team_id
            );
        };
        order.push(LotteryEntry {
            team: (*team).clone(),
            original_position: entry.original_position,
            odds: entry.odds,
            new_position: entry.new_position,
            movement: entry.movement,
        });
    }
    let lottery = LotteryOutcome { order };

    let mut slots = build_draft_order(&data.standings, &lottery, config.draft.rounds)?;
    let prospects: HashMap<PlayerId, &Player> =
        data.prospects.iter().map(|p| (p.id, p)).collect();

    let picks = db.load_picks(draft_id)?;
    info!(
        "Crash recovery: restoring {} picks from DB for draft_id={}",
        picks.len(),
        draft_id
    );
    for pick in &picks {
        let Some(idx) = slots.iter().position(|s| s.overall == pick.overall) else {
            bail!("stored pick {} is outside the draft order", pick.overall);
        };
        if slots[idx].team.id != pick.team_id {
            bail!(
                "stored pick {} belongs to team {} but the order gives it to {}",
                pick.overall,
                pick.team_id,
                slots[idx].team.id
            );
        }
        let Some(player) = prospects.get(&pick.player_id) else {
            bail!(
                "stored pick {} drafted {} ({}) who is not in the prospect list",
                pick.overall,
                pick.player_name,
                pick.player_id
            );
        };
        slots[idx] = slots[idx].clone().with_player((*player).clone());
    }

    let allocator = DraftAllocator::new(slots, data.prospects)
        .context("stored picks do not replay into a valid draft")?
        .with_search_limit(config.draft.search_limit);
    let simulator = simulators::from_config(&config.simulation, config.draft.seed);

    Ok(Ok(DraftSession {
        config,
        draft_id: draft_id.to_string(),
        lottery,
        allocator,
        db,
        simulator,
    }))
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the session event loop.
///
/// Processes commands from `cmd_rx` one at a time, so picks are serialized,
/// and pushes updates through `ui_tx`. Exits on `Quit` or when the command
/// channel closes, handing the session back to the caller.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<DraftUpdate>,
    mut session: DraftSession,
) -> anyhow::Result<DraftSession> {
    info!("Draft session loop started (draft_id={})", session.draft_id);

    let _ = ui_tx
        .send(DraftUpdate::Lottery(session.lottery.clone()))
        .await;
    let _ = ui_tx.send(clock_update(&session.allocator)).await;

    loop {
        match cmd_rx.recv().await {
            Some(UserCommand::Quit) => {
                info!("Quit command received, shutting down");
                break;
            }
            Some(cmd) => handle_user_command(&mut session, cmd, &ui_tx).await,
            None => {
                info!("Command channel closed, shutting down");
                break;
            }
        }
    }

    info!("Draft session loop exiting");
    Ok(session)
}

fn clock_update(allocator: &DraftAllocator) -> DraftUpdate {
    match allocator.current_pick() {
        Some(slot) => DraftUpdate::OnTheClock(slot.clone()),
        None => DraftUpdate::DraftComplete,
    }
}

/// Handle one command from the front end.
async fn handle_user_command(
    session: &mut DraftSession,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<DraftUpdate>,
) {
    match cmd {
        UserCommand::MakePick(player) => {
            let outcome = session.commit_pick(player);
            report_pick(outcome, ui_tx).await;
        }
        UserCommand::SimulatePick => {
            let outcome = session.simulate_pick().await;
            report_pick(outcome, ui_tx).await;
        }
        UserCommand::SimulateToEnd => {
            info!(
                "Simulating the remaining {} picks",
                session.allocator.open_slots().count()
            );
            while !session.allocator.is_complete() {
                let outcome = session.simulate_pick().await;
                if !report_pick(outcome, ui_tx).await {
                    break;
                }
            }
        }
        UserCommand::Search(query) => {
            let players = session.search(&query);
            debug!("Search '{}' matched {} players", query, players.len());
            let _ = ui_tx
                .send(DraftUpdate::SearchResults { query, players })
                .await;
        }
        UserCommand::ShowBoard { round } => {
            let slots = session.board(round);
            let _ = ui_tx.send(DraftUpdate::Board { round, slots }).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Push the updates for one pick attempt. Returns whether a pick was made.
async fn report_pick(
    outcome: Result<SessionPick, DraftError>,
    ui_tx: &mpsc::Sender<DraftUpdate>,
) -> bool {
    let pick = match outcome {
        Ok(pick) => pick,
        Err(e) => {
            warn!("Pick rejected: {}", e);
            let _ = ui_tx.send(DraftUpdate::Rejected(e.to_string())).await;
            return false;
        }
    };

    let overall = pick.result.pick.overall;
    let _ = ui_tx.send(DraftUpdate::PickMade(pick.result.pick)).await;
    if let Some(message) = pick.persist_error {
        let _ = ui_tx
            .send(DraftUpdate::PersistFailed { overall, message })
            .await;
    }
    let next = match pick.result.progress {
        DraftProgress::OnTheClock(slot) => DraftUpdate::OnTheClock(slot),
        DraftProgress::Complete => DraftUpdate::DraftComplete,
    };
    let _ = ui_tx.send(next).await;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataPaths, DraftSettings, SimulationConfig, SimulationStrategy};
    use rinkdraft_core::{FixedRandom, OddsTable, Position};

    fn config() -> Config {
        Config {
            draft: DraftSettings {
                year: 2025,
                rounds: 2,
                lottery_slots: 3,
                search_limit: 5,
                seed: None,
            },
            odds: OddsTable::new(vec![50.0, 30.0, 20.0]).unwrap(),
            simulation: SimulationConfig {
                strategy: SimulationStrategy::BestAvailable,
                top_n: 3,
            },
            db_path: ":memory:".to_string(),
            data_paths: DataPaths {
                teams: "teams.csv".to_string(),
                prospects: "prospects.csv".to_string(),
            },
        }
    }

    fn team(id: u32, abbreviation: &str) -> Team {
        Team {
            id: TeamId(id),
            abbreviation: abbreviation.to_string(),
            market: String::new(),
            name: abbreviation.to_string(),
            conference: String::new(),
            division: String::new(),
            logo: String::new(),
        }
    }

    fn data() -> DraftData {
        DraftData {
            standings: vec![team(1, "AAA"), team(2, "BBB"), team(3, "CCC"), team(4, "DDD")],
            prospects: (1..=10)
                .map(|i| {
                    let position = if i % 2 == 0 { Position::Defense } else { Position::Center };
                    Player::new(PlayerId(100 + i), format!("Prospect {i}"), position)
                })
                .collect(),
        }
    }

    /// First draw 0.6 * 100 = 60 lands on BBB (50, 80]; with BBB removed
    /// the second draw 0.0 lands on AAA.
    fn session() -> DraftSession {
        let db = Database::open(":memory:").unwrap();
        DraftSession::start_with_rng(config(), data(), db, FixedRandom::new(vec![0.6, 0.0]))
            .unwrap()
    }

    fn order(session: &DraftSession) -> Vec<String> {
        session
            .board(None)
            .iter()
            .map(|s| s.team.abbreviation.clone())
            .collect()
    }

    #[test]
    fn start_runs_lottery_and_builds_order() {
        let session = session();
        assert_eq!(
            order(&session),
            vec!["BBB", "AAA", "CCC", "DDD", "AAA", "BBB", "CCC", "DDD"]
        );
        assert_eq!(session.lottery().first_winner().team.id, TeamId(2));
        assert_eq!(session.db().get_draft_id().unwrap().as_deref(), Some(session.draft_id()));
        assert_eq!(session.db().load_lottery(session.draft_id()).unwrap().len(), 3);
    }

    #[test]
    fn commit_pick_persists() {
        let mut session = session();
        let pick = session.commit_pick(PlayerId(105)).unwrap();
        assert_eq!(pick.persist_error, None);
        assert_eq!(pick.result.pick.team.id, TeamId(2));

        let stored = session.db().load_picks(session.draft_id()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].player_id, PlayerId(105));
        assert_eq!(stored[0].overall, 1);
    }

    #[test]
    fn rejected_pick_writes_nothing() {
        let mut session = session();
        session.commit_pick(PlayerId(101)).unwrap();
        let err = session.commit_pick(PlayerId(101)).unwrap_err();
        assert!(matches!(err, DraftError::AlreadyDrafted { .. }));
        assert_eq!(session.db().pick_count(session.draft_id()).unwrap(), 1);
    }

    #[test]
    fn persist_failure_keeps_pick_in_memory() {
        let mut session = session();
        session.db().execute_raw("DROP TABLE draft_picks").unwrap();

        let pick = session.commit_pick(PlayerId(101)).unwrap();
        assert!(pick.persist_error.is_some());
        assert_eq!(session.allocator().completed_picks().count(), 1);
        assert_eq!(session.allocator().current_pick().unwrap().overall, 2);
    }

    #[tokio::test]
    async fn simulate_pick_uses_configured_simulator() {
        let mut session = session();
        let pick = session.simulate_pick().await.unwrap();
        assert_eq!(pick.result.pick.player().unwrap().id, PlayerId(101));
        assert_eq!(session.db().pick_count(session.draft_id()).unwrap(), 1);
    }

    #[test]
    fn search_and_board_views() {
        let mut session = session();
        session.commit_pick(PlayerId(101)).unwrap();

        let found = session.search("prospect 1");
        let ids: Vec<u32> = found.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![110]);

        let defense = session.search("d");
        assert!(defense.len() <= 5);
        assert!(defense.iter().all(|p| !p.is_drafted()));

        let round_two = session.board(Some(2));
        assert_eq!(round_two.len(), 4);
        assert!(round_two.iter().all(|s| s.round == 2));
    }

    #[test]
    fn recover_replays_stored_picks() {
        let mut session = session();
        session.commit_pick(PlayerId(104)).unwrap();
        session.commit_pick(PlayerId(102)).unwrap();
        let draft_id = session.draft_id().to_string();
        let board_before = session.board(None);
        let DraftSession { db, .. } = session;

        let recovered = match recover_from_db(config(), data(), db, &draft_id).unwrap() {
            Ok(session) => session,
            Err(_) => panic!("stored draft should be recovered"),
        };
        assert_eq!(recovered.board(None), board_before);
        assert_eq!(recovered.allocator().current_pick().unwrap().overall, 3);
        assert!(recovered.search("prospect 4").is_empty());
        assert_eq!(recovered.lottery().first_winner().team.id, TeamId(2));
    }

    #[test]
    fn failed_start_stores_nothing() {
        let path = std::env::temp_dir().join(format!(
            "rinkdraft_failed_start_{}.db",
            std::process::id()
        ));
        let path_str = path.display().to_string();
        let _ = std::fs::remove_file(&path);

        let mut bad = data();
        bad.prospects.push(Player::new(PlayerId(101), "Duplicate", Position::Goalie));
        let db = Database::open(&path_str).unwrap();
        let result =
            DraftSession::start_with_rng(config(), bad, db, FixedRandom::new(vec![0.6, 0.0]));
        assert!(result.is_err());

        let db = Database::open(&path_str).unwrap();
        assert_eq!(db.get_draft_id().unwrap(), None);
        assert_eq!(db.row_count("lottery_results").unwrap(), 0);
        drop(db);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
        }
    }

    #[test]
    fn recover_without_lottery_hands_database_back() {
        let db = Database::open(":memory:").unwrap();
        let result = recover_from_db(config(), data(), db, "draft_missing").unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn recover_rejects_unknown_prospect() {
        let mut session = session();
        session.commit_pick(PlayerId(103)).unwrap();
        let draft_id = session.draft_id().to_string();
        let DraftSession { db, .. } = session;

        let mut trimmed = data();
        trimmed.prospects.retain(|p| p.id != PlayerId(103));
        assert!(recover_from_db(config(), trimmed, db, &draft_id).is_err());
    }

    #[test]
    fn open_resumes_draft_in_progress() {
        let mut session = session();
        session.commit_pick(PlayerId(101)).unwrap();
        let draft_id = session.draft_id().to_string();
        let DraftSession { db, .. } = session;

        let reopened = DraftSession::open(config(), data(), db).unwrap();
        assert_eq!(reopened.draft_id(), draft_id);
        assert_eq!(reopened.allocator().completed_picks().count(), 1);
    }

    #[tokio::test]
    async fn run_loop_handles_commands_in_order() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);

        cmd_tx.send(UserCommand::MakePick(PlayerId(103))).await.unwrap();
        cmd_tx.send(UserCommand::MakePick(PlayerId(103))).await.unwrap();
        cmd_tx.send(UserCommand::Search("prospect 3".into())).await.unwrap();
        cmd_tx.send(UserCommand::Quit).await.unwrap();

        let session = run(cmd_rx, ui_tx, session()).await.unwrap();
        assert_eq!(session.allocator().completed_picks().count(), 1);

        let mut updates = Vec::new();
        while let Some(update) = ui_rx.recv().await {
            updates.push(update);
        }
        assert!(matches!(updates[0], DraftUpdate::Lottery(_)));
        assert!(matches!(&updates[1], DraftUpdate::OnTheClock(s) if s.overall == 1));
        assert!(matches!(&updates[2], DraftUpdate::PickMade(s) if s.overall == 1));
        assert!(matches!(&updates[3], DraftUpdate::OnTheClock(s) if s.overall == 2));
        assert!(matches!(updates[4], DraftUpdate::Rejected(_)));
        assert!(
            matches!(&updates[5], DraftUpdate::SearchResults { players, .. } if players.is_empty())
        );
        assert_eq!(updates.len(), 6);
    }

    #[tokio::test]
    async fn simulate_to_end_completes_draft() {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        cmd_tx.send(UserCommand::SimulateToEnd).await.unwrap();
        drop(cmd_tx);

        let session = run(cmd_rx, ui_tx, session()).await.unwrap();
        assert!(session.allocator().is_complete());
        assert_eq!(session.db().pick_count(session.draft_id()).unwrap(), 8);

        let mut picks = 0;
        let mut last = None;
        while let Some(update) = ui_rx.recv().await {
            if matches!(update, DraftUpdate::PickMade(_)) {
                picks += 1;
            }
            last = Some(update);
        }
        assert_eq!(picks, 8);
        assert_eq!(last, Some(DraftUpdate::DraftComplete));
    }

    #[tokio::test]
    async fn simulate_to_end_stops_when_pool_runs_dry() {
        let mut short = data();
        short.prospects.truncate(5);
        let db = Database::open(":memory:").unwrap();
        let session =
            DraftSession::start_with_rng(config(), short, db, FixedRandom::new(vec![0.6, 0.0]))
                .unwrap();

        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        cmd_tx.send(UserCommand::SimulateToEnd).await.unwrap();
        drop(cmd_tx);

        let session = run(cmd_rx, ui_tx, session).await.unwrap();
        assert_eq!(session.allocator().completed_picks().count(), 5);
        assert!(!session.allocator().is_complete());

        let mut rejected = 0;
        while let Some(update) = ui_rx.recv().await {
            if matches!(update, DraftUpdate::Rejected(_)) {
                rejected += 1;
            }
        }
        assert_eq!(rejected, 1);
    }
}
