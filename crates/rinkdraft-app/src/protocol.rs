// Message types passed between the session loop and the front end.

use rinkdraft_core::{DraftSlot, LotteryOutcome, Player, PlayerId};

// ---------------------------------------------------------------------------
// Front end -> session
// ---------------------------------------------------------------------------

/// Commands sent from the console to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Draft the given prospect with the pick on the clock.
    MakePick(PlayerId),
    /// Let the simulator make the pick on the clock.
    SimulatePick,
    /// Simulate every remaining pick.
    SimulateToEnd,
    /// Search available prospects by name or position.
    Search(String),
    /// Show the board, optionally limited to one round.
    ShowBoard { round: Option<u32> },
    Quit,
}

impl UserCommand {
    /// Parse a console line such as `pick 12`, `sim`, `search mack` or
    /// `board 2`. Returns an error message suitable for display.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "pick" | "p" => rest
                .parse::<u32>()
                .map(|id| UserCommand::MakePick(PlayerId(id)))
                .map_err(|_| format!("expected a player id, got '{rest}'")),
            "sim" | "s" => Ok(UserCommand::SimulatePick),
            "auto" | "simall" => Ok(UserCommand::SimulateToEnd),
            "search" | "find" | "/" => Ok(UserCommand::Search(rest.to_string())),
            "board" | "b" => {
                if rest.is_empty() {
                    return Ok(UserCommand::ShowBoard { round: None });
                }
                rest.parse::<u32>()
                    .map(|round| UserCommand::ShowBoard { round: Some(round) })
                    .map_err(|_| format!("expected a round number, got '{rest}'"))
            }
            "quit" | "q" | "exit" => Ok(UserCommand::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Session -> front end
// ---------------------------------------------------------------------------

/// Updates pushed from the session loop to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftUpdate {
    /// The lottery result the draft order was built from.
    Lottery(LotteryOutcome),
    OnTheClock(DraftSlot),
    /// A pick was committed (and persisted unless a `PersistFailed` follows).
    PickMade(DraftSlot),
    DraftComplete,
    SearchResults { query: String, players: Vec<Player> },
    /// Slots on the board; open slots have no player.
    Board { round: Option<u32>, slots: Vec<DraftSlot> },
    /// The pick stands in memory but was not written to the database.
    PersistFailed { overall: u32, message: String },
    /// A command was refused; the draft is unchanged.
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pick() {
        assert_eq!(UserCommand::parse("pick 42"), Ok(UserCommand::MakePick(PlayerId(42))));
        assert_eq!(UserCommand::parse("  P   7 "), Ok(UserCommand::MakePick(PlayerId(7))));
        assert!(UserCommand::parse("pick celebrini").is_err());
        assert!(UserCommand::parse("pick").is_err());
    }

    #[test]
    fn parse_simulation_commands() {
        assert_eq!(UserCommand::parse("sim"), Ok(UserCommand::SimulatePick));
        assert_eq!(UserCommand::parse("auto"), Ok(UserCommand::SimulateToEnd));
    }

    #[test]
    fn parse_search_keeps_query_text() {
        assert_eq!(
            UserCommand::parse("search Ivan Dem"),
            Ok(UserCommand::Search("Ivan Dem".to_string()))
        );
        assert_eq!(UserCommand::parse("find"), Ok(UserCommand::Search(String::new())));
    }

    #[test]
    fn parse_board() {
        assert_eq!(UserCommand::parse("board"), Ok(UserCommand::ShowBoard { round: None }));
        assert_eq!(
            UserCommand::parse("b 2"),
            Ok(UserCommand::ShowBoard { round: Some(2) })
        );
        assert!(UserCommand::parse("board two").is_err());
    }

    #[test]
    fn parse_quit_and_unknown() {
        assert_eq!(UserCommand::parse("QUIT"), Ok(UserCommand::Quit));
        assert!(UserCommand::parse("").is_err());
        assert!(UserCommand::parse("trade 1 2").is_err());
    }
}
