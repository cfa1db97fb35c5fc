// Line-oriented console front end.
//
// Reads commands from stdin, forwards them to the session loop and prints
// every update it pushes back. Exits once the session loop has shut down.

use rinkdraft_app::protocol::{DraftUpdate, UserCommand};
use rinkdraft_core::{DraftSlot, LotteryOutcome, Player};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub const HELP: &str = "\
commands:
  pick <id>       draft a prospect with the pick on the clock
  sim             simulate the pick on the clock
  auto            simulate every remaining pick
  search <text>   search available prospects by name or position
  board [round]   show the draft board
  quit            exit (the draft can be resumed later)";

pub async fn run(
    mut ui_rx: mpsc::Receiver<DraftUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    println!("{HELP}");

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(update) => println!("{}", render(&update)),
                    None => {
                        debug!("Update channel closed");
                        break;
                    }
                }
            }

            line = lines.next_line(), if stdin_open => {
                let cmd = match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match UserCommand::parse(&line) {
                        Ok(cmd) => cmd,
                        Err(message) => {
                            println!("{message}\n{HELP}");
                            continue;
                        }
                    },
                    None => {
                        info!("stdin closed, quitting");
                        stdin_open = false;
                        UserCommand::Quit
                    }
                };
                if cmd == UserCommand::Quit {
                    stdin_open = false;
                }
                if cmd_tx.send(cmd).await.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render(update: &DraftUpdate) -> String {
    match update {
        DraftUpdate::Lottery(outcome) => render_lottery(outcome),
        DraftUpdate::OnTheClock(slot) => {
            format!("On the clock: {} {}", slot.label(), slot.team.full_name())
        }
        DraftUpdate::PickMade(slot) => render_slot(slot),
        DraftUpdate::DraftComplete => "The draft is complete.".to_string(),
        DraftUpdate::SearchResults { query, players } => {
            if players.is_empty() {
                return format!("No available prospects match '{query}'.");
            }
            let mut out = format!("Available prospects matching '{query}':");
            for p in players {
                out.push('\n');
                out.push_str(&render_player(p));
            }
            out
        }
        DraftUpdate::Board { round, slots } => {
            let mut out = match round {
                Some(r) => format!("Round {r}:"),
                None => "Draft board:".to_string(),
            };
            for slot in slots {
                out.push('\n');
                out.push_str(&render_slot(slot));
            }
            out
        }
        DraftUpdate::PersistFailed { overall, message } => {
            format!("warning: pick {overall} was not saved: {message}")
        }
        DraftUpdate::Rejected(reason) => format!("rejected: {reason}"),
    }
}

fn render_lottery(outcome: &LotteryOutcome) -> String {
    let mut out = String::from("Lottery results:");
    for entry in &outcome.order {
        let moved = match entry.movement {
            0 => String::new(),
            m if m > 0 => format!("  (up {m})"),
            m => format!("  (down {})", -m),
        };
        out.push_str(&format!(
            "\n  {:>2}. {:<4} {:>5.1}%{}",
            entry.new_position, entry.team.abbreviation, entry.odds, moved
        ));
    }
    out
}

fn render_slot(slot: &DraftSlot) -> String {
    let pick = match slot.player() {
        Some(p) => format!("{} {}", p.position, p.name),
        None => "-".to_string(),
    };
    format!("{:<14} {:<4} {}", slot.label(), slot.team.abbreviation, pick)
}

fn render_player(p: &Player) -> String {
    let mut line = format!("  [{}] {} {}", p.id, p.position, p.name);
    if let Some(team) = &p.amateur_team {
        line.push_str(&format!(" ({team})"));
    }
    line
}
