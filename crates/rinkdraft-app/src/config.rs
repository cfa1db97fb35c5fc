// Configuration loading and parsing (config/draft.toml).

use rinkdraft_core::lottery::{OddsTable, DEFAULT_ODDS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names expected under `config/`.
pub const DRAFT_CONFIG_FILE: &str = "draft.toml";

/// Largest league we model.
pub const MAX_LOTTERY_SLOTS: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftSettings,
    /// Lottery odds, either the standard table or the `[lottery] odds` override.
    pub odds: OddsTable,
    pub simulation: SimulationConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// draft.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire draft.toml file.
#[derive(Debug, Clone, Deserialize)]
struct DraftFile {
    draft: DraftSettings,
    #[serde(default)]
    lottery: LotterySection,
    simulation: SimulationConfig,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftSettings {
    /// Draft year, used for display and the draft id.
    pub year: u16,
    pub rounds: u32,
    #[serde(default = "default_lottery_slots")]
    pub lottery_slots: usize,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Fixed seed for a reproducible lottery. Random when omitted.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_lottery_slots() -> usize {
    DEFAULT_ODDS.len()
}

fn default_search_limit() -> usize {
    10
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LotterySection {
    #[serde(default)]
    odds: Option<Vec<f64>>,
}

/// How simulated picks are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStrategy {
    /// Highest-ranked available prospect.
    BestAvailable,
    /// Random choice among the top `top_n`, favouring higher ranks.
    WeightedTopN,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub strategy: SimulationStrategy,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub teams: String,
    pub prospects: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/draft.toml` relative to
/// `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(DRAFT_CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse and validate draft.toml contents. `path` is used for error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: DraftFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_draft(&file.draft)?;
    let odds = resolve_odds(file.lottery.odds, file.draft.lottery_slots)?;

    let config = Config {
        draft: file.draft,
        odds,
        simulation: file.simulation,
        db_path: file.database.path,
        data_paths: file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to `base_dir` after copying any
/// missing defaults.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validation(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Use the configured odds, or the standard table when none are given. A
/// lottery size other than the standard one must come with its own odds.
fn resolve_odds(odds: Option<Vec<f64>>, lottery_slots: usize) -> Result<OddsTable, ConfigError> {
    match odds {
        Some(values) => {
            if values.len() != lottery_slots {
                return Err(validation(
                    "lottery.odds",
                    format!(
                        "expected {lottery_slots} values (draft.lottery_slots), got {}",
                        values.len()
                    ),
                ));
            }
            OddsTable::new(values).map_err(|e| validation("lottery.odds", e.to_string()))
        }
        None if lottery_slots == DEFAULT_ODDS.len() => Ok(OddsTable::default()),
        None => Err(validation(
            "lottery.odds",
            format!(
                "draft.lottery_slots is {lottery_slots}; the standard table covers {}, \
                 so custom odds are required",
                DEFAULT_ODDS.len()
            ),
        )),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_draft(draft: &DraftSettings) -> Result<(), ConfigError> {
    if draft.rounds == 0 {
        return Err(validation("draft.rounds", "must be greater than 0"));
    }
    if !(2..=MAX_LOTTERY_SLOTS).contains(&draft.lottery_slots) {
        return Err(validation(
            "draft.lottery_slots",
            format!(
                "must be between 2 and {MAX_LOTTERY_SLOTS} inclusive, got {}",
                draft.lottery_slots
            ),
        ));
    }
    if draft.search_limit == 0 {
        return Err(validation("draft.search_limit", "must be greater than 0"));
    }
    Ok(())
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.simulation.top_n == 0 {
        return Err(validation("simulation.top_n", "must be greater than 0"));
    }
    if config.db_path.trim().is_empty() {
        return Err(validation("database.path", "must not be empty"));
    }
    let paths: &[(&str, &str)] = &[
        ("data_paths.teams", config.data_paths.teams.as_str()),
        ("data_paths.prospects", config.data_paths.prospects.as_str()),
    ];
    for (name, val) in paths {
        if val.trim().is_empty() {
            return Err(validation(name, "must not be empty"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    const MINIMAL: &str = r#"
        [draft]
        year = 2025
        rounds = 2

        [simulation]
        strategy = "best_available"

        [database]
        path = "test.db"

        [data_paths]
        teams = "data/teams.csv"
        prospects = "data/prospects.csv"
    "#;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        parse_config(text, Path::new("draft.toml"))
    }

    #[test]
    fn load_valid_config_from_project_defaults() {
        let root = project_root();
        let text = fs::read_to_string(root.join("defaults").join(DRAFT_CONFIG_FILE))
            .expect("defaults/draft.toml should exist");
        let config = parse(&text).expect("defaults should be valid");

        assert_eq!(config.draft.year, 2025);
        assert_eq!(config.draft.rounds, 2);
        assert_eq!(config.draft.lottery_slots, 16);
        assert_eq!(config.draft.search_limit, 10);
        assert_eq!(config.draft.seed, None);
        assert_eq!(config.odds, OddsTable::default());
        assert_eq!(config.simulation.strategy, SimulationStrategy::BestAvailable);
        assert_eq!(config.simulation.top_n, 3);
        assert_eq!(config.db_path, "rinkdraft.db");
        assert_eq!(config.data_paths.teams, "data/teams.csv");
        assert_eq!(config.data_paths.prospects, "data/prospects.csv");
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.draft.lottery_slots, 16);
        assert_eq!(config.draft.search_limit, 10);
        assert_eq!(config.odds, OddsTable::default());
        assert!((config.odds.total() - 107.5).abs() < 1e-9);
    }

    #[test]
    fn custom_odds_override_table() {
        let text = MINIMAL.replace(
            "rounds = 2",
            "rounds = 2\nlottery_slots = 4\n\n[lottery]\nodds = [40.0, 30.0, 20.0, 10.0]",
        );
        let config = parse(&text).unwrap();
        assert_eq!(config.odds.eligible(), 4);
        assert_eq!(config.odds.odds_for(1), 40.0);
    }

    #[test]
    fn custom_odds_need_positive_total() {
        let text = MINIMAL.replace(
            "rounds = 2",
            "rounds = 2\nlottery_slots = 2\n\n[lottery]\nodds = [0.0, 0.0]",
        );
        match parse(&text) {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "lottery.odds"),
            other => panic!("expected odds validation error, got {other:?}"),
        }
    }

    #[test]
    fn standard_odds_written_out_are_accepted() {
        let text = MINIMAL.replace(
            "rounds = 2",
            "rounds = 2\n\n[lottery]\nodds = [25.5, 13.5, 11.5, 9.5, 8.5, 7.5, 6.5, 6.0, \
             5.0, 3.5, 3.0, 2.5, 2.0, 1.5, 1.0, 0.5]",
        );
        let config = parse(&text).unwrap();
        assert_eq!(config.odds, OddsTable::default());
    }

    #[test]
    fn custom_odds_length_must_match_slots() {
        let text = MINIMAL.replace("rounds = 2", "rounds = 2\n\n[lottery]\nodds = [50.0, 50.0]");
        assert!(matches!(parse(&text), Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn nonstandard_lottery_size_requires_odds() {
        let text = MINIMAL.replace("rounds = 2", "rounds = 2\nlottery_slots = 11");
        assert!(matches!(parse(&text), Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn zero_rounds_rejected() {
        let text = MINIMAL.replace("rounds = 2", "rounds = 0");
        match parse(&text) {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "draft.rounds"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn zero_search_limit_rejected() {
        let text = MINIMAL.replace("rounds = 2", "rounds = 2\nsearch_limit = 0");
        assert!(matches!(parse(&text), Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn weighted_top_n_strategy_parses() {
        let text = MINIMAL.replace(
            "strategy = \"best_available\"",
            "strategy = \"weighted_top_n\"\ntop_n = 5",
        );
        let config = parse(&text).unwrap();
        assert_eq!(config.simulation.strategy, SimulationStrategy::WeightedTopN);
        assert_eq!(config.simulation.top_n, 5);
    }

    #[test]
    fn unknown_strategy_is_parse_error() {
        let text = MINIMAL.replace("best_available", "coin_flip");
        assert!(matches!(parse(&text), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn missing_config_file_reports_path() {
        let tmp = std::env::temp_dir().join("rinkdraft_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        match load_config_from(&tmp) {
            Err(ConfigError::FileNotFound { path }) => assert!(path.ends_with("draft.toml")),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_defaults_once() {
        let tmp = std::env::temp_dir().join("rinkdraft_config_copy");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(DRAFT_CONFIG_FILE), MINIMAL).unwrap();
        fs::write(tmp.join("defaults").join("notes.toml.example"), "x = 1").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
        assert!(!tmp.join("config").join("notes.toml.example").exists());

        // Second run leaves the existing file alone.
        fs::write(tmp.join("config").join(DRAFT_CONFIG_FILE), "edited").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(tmp.join("config").join(DRAFT_CONFIG_FILE)).unwrap(),
            "edited"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_dirs_fails() {
        let tmp = std::env::temp_dir().join("rinkdraft_config_empty");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_files(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_config_end_to_end_in_temp_dir() {
        let tmp = std::env::temp_dir().join("rinkdraft_config_e2e");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(DRAFT_CONFIG_FILE), MINIMAL).unwrap();
        let config = load_config(&tmp).unwrap();
        assert_eq!(config.db_path, "test.db");
        let _ = fs::remove_dir_all(&tmp);
    }
}
