// Rinkdraft entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database
// 4. Load teams and prospects
// 5. Resume the stored draft or run a new lottery
// 6. Create mpsc channels
// 7. Spawn the session loop
// 8. Run the console until the user quits
// 9. Cleanup on exit

mod console;

use std::path::{Path, PathBuf};

use anyhow::Context;
use rinkdraft_app::{config, data, db, session};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;

    // 1. Initialize tracing (log to file, not terminal)
    init_tracing(&cwd)?;
    info!("Rinkdraft starting up");

    // 2. Load config
    let config = config::load_config(&cwd).context("failed to load configuration")?;
    info!(
        "Config loaded: {} draft, {} rounds, {} lottery teams",
        config.draft.year,
        config.draft.rounds,
        config.odds.eligible()
    );

    // 3. Open database
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. Load teams and prospects
    let data = data::load_all(&config, &cwd).context("failed to load draft data")?;

    // 5. Resume or start
    let draft = match session::DraftSession::open(config, data, db) {
        Ok(draft) => draft,
        Err(e) => {
            error!("Failed to open draft session: {:#}", e);
            return Err(e.context("failed to open draft session"));
        }
    };
    info!(
        "Draft {} ready: {} of {} picks made",
        draft.draft_id(),
        draft.allocator().completed_picks().count(),
        draft.allocator().slots().len()
    );

    // 6. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 7. Spawn the session loop
    let session_handle = tokio::spawn(async move {
        if let Err(e) = session::run(cmd_rx, ui_tx, draft).await {
            error!("Session loop error: {}", e);
        }
    });

    // 8. Console (blocks until the user quits or stdin closes)
    if let Err(e) = console::run(ui_rx, cmd_tx).await {
        error!("Console error: {}", e);
    }

    // 9. Cleanup: wait for the session task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = session_handle.await;
    })
    .await;

    info!("Rinkdraft shut down cleanly");
    Ok(())
}

/// Directory for the log file: `logs/` under the working directory, or the
/// platform data directory when that cannot be created.
fn log_dir(cwd: &Path) -> anyhow::Result<PathBuf> {
    let local = cwd.join("logs");
    if std::fs::create_dir_all(&local).is_ok() {
        return Ok(local);
    }
    let dirs = directories::ProjectDirs::from("", "", "rinkdraft")
        .context("no writable log directory")?;
    let fallback = dirs.data_local_dir().join("logs");
    std::fs::create_dir_all(&fallback)
        .with_context(|| format!("failed to create {}", fallback.display()))?;
    Ok(fallback)
}

/// Initialize tracing to log to a file (not the terminal, which is used by the console).
fn init_tracing(cwd: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_file = std::fs::File::create(log_dir(cwd)?.join("rinkdraft.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rinkdraft=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
