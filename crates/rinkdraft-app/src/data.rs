// Team standings and prospect list loading.
//
// Both files are CSV with a `rank` column: standings rank (worst team first)
// for teams, pre-draft ranking for prospects. Rows come back sorted by rank.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use rinkdraft_core::{Player, PlayerId, Position, Team, TeamId};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything a draft needs from the data files.
#[derive(Debug, Clone)]
pub struct DraftData {
    /// All teams in pre-lottery order, worst record first.
    pub standings: Vec<Team>,
    /// Draft-eligible prospects in ranking order.
    pub prospects: Vec<Player>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawTeam {
    rank: u32,
    id: u32,
    abbreviation: String,
    market: String,
    name: String,
    #[serde(default)]
    conference: String,
    #[serde(default)]
    division: String,
    #[serde(default)]
    logo: String,
}

#[derive(Debug, Deserialize)]
struct RawProspect {
    rank: u32,
    id: u32,
    name: String,
    position: String,
    #[serde(default)]
    shoots: Option<String>,
    #[serde(default)]
    amateur_team: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Reader-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<Team>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut ranked = Vec::new();
    for result in reader.deserialize::<RawTeam>() {
        match result {
            Ok(raw) => ranked.push((
                raw.rank,
                Team {
                    id: TeamId(raw.id),
                    abbreviation: raw.abbreviation.trim().to_string(),
                    market: raw.market.trim().to_string(),
                    name: raw.name.trim().to_string(),
                    conference: raw.conference.trim().to_string(),
                    division: raw.division.trim().to_string(),
                    logo: raw.logo.trim().to_string(),
                },
            )),
            Err(e) => warn!("skipping malformed team row: {}", e),
        }
    }
    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, team)| team).collect())
}

fn load_prospects_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut ranked = Vec::new();
    for result in reader.deserialize::<RawProspect>() {
        match result {
            Ok(raw) => {
                let Some(position) = Position::from_str_pos(&raw.position) else {
                    warn!(
                        "skipping prospect '{}': unknown position '{}'",
                        raw.name.trim(),
                        raw.position
                    );
                    continue;
                };
                let mut player = Player::new(PlayerId(raw.id), raw.name.trim(), position);
                player.shoots = non_empty(raw.shoots);
                player.amateur_team = non_empty(raw.amateur_team);
                ranked.push((raw.rank, player));
            }
            Err(e) => warn!("skipping malformed prospect row: {}", e),
        }
    }
    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, player)| player).collect())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_teams(teams: &[Team], lottery_slots: usize) -> Result<(), DataError> {
    if teams.len() < lottery_slots {
        return Err(DataError::Validation(format!(
            "standings list {} teams but the lottery needs {}",
            teams.len(),
            lottery_slots
        )));
    }
    let mut seen = HashSet::new();
    for team in teams {
        if !seen.insert(team.id) {
            return Err(DataError::Validation(format!(
                "team id {} ({}) appears more than once",
                team.id, team.abbreviation
            )));
        }
    }
    Ok(())
}

fn validate_prospects(prospects: &[Player]) -> Result<(), DataError> {
    let mut seen = HashSet::new();
    for p in prospects {
        if !seen.insert(p.id) {
            return Err(DataError::Validation(format!(
                "prospect id {} ({}) appears more than once",
                p.id, p.name
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, DataError> {
    std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_teams(path: &Path) -> Result<Vec<Team>, DataError> {
    load_teams_from_reader(open(path)?).map_err(|e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_prospects(path: &Path) -> Result<Vec<Player>, DataError> {
    load_prospects_from_reader(open(path)?).map_err(|e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load and validate both data files. Relative paths in the config are
/// resolved against `base_dir`.
pub fn load_all(config: &Config, base_dir: &Path) -> Result<DraftData, DataError> {
    let standings = load_teams(&base_dir.join(&config.data_paths.teams))?;
    validate_teams(&standings, config.odds.eligible())?;

    let prospects = load_prospects(&base_dir.join(&config.data_paths.prospects))?;
    validate_prospects(&prospects)?;

    let slots = standings.len() * config.draft.rounds as usize;
    if prospects.len() < slots {
        warn!(
            "only {} prospects for {} draft slots; simulated picks will run dry",
            prospects.len(),
            slots
        );
    }

    info!(
        "Loaded {} teams and {} prospects",
        standings.len(),
        prospects.len()
    );
    Ok(DraftData {
        standings,
        prospects,
    })
}
