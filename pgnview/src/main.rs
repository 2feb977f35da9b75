//! pgnview - browse the games in a PGN file from the terminal.
//!
//! Subcommands:
//! - `list`: one line per game with players, event, date and move count.
//! - `show`: the board at a given game and ply.
//! - `step`: interactive stepping driven by stdin.
//! - `dump`: every parsed game as JSON.
//!
//! Tunables such as the log filter live in [`config`].

use std::path::{Path, PathBuf};

use anyhow::Context;
use chess::{PgnCollection, PgnError, ReplayCursor, ReplayError};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod render;
mod session;

#[derive(Parser)]
#[command(name = "pgnview", about = "Replay games from PGN files")]
struct Cli {
    /// Draw pieces as Unicode figurines (also `PGNVIEW_UNICODE=1`).
    #[arg(long, global = true)]
    unicode: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the games in a file.
    List { file: PathBuf },
    /// Print the board after a given move.
    Show {
        file: PathBuf,
        /// 1-based game number.
        #[arg(short, long, default_value_t = 1)]
        game: usize,
        /// Number of moves played; 0 is the initial position. Defaults to the last move.
        #[arg(short, long)]
        ply: Option<usize>,
    },
    /// Step through a game: n(ext), p(rev), s(tart), e(nd), g N, q(uit).
    Step {
        file: PathBuf,
        #[arg(short, long, default_value_t = 1)]
        game: usize,
    },
    /// Print all parsed games as JSON.
    Dump { file: PathBuf },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no games loaded from {path} ({skipped} skipped)")]
    NoGames { path: PathBuf, skipped: usize },

    #[error("game {0} does not exist")]
    GameNumber(usize),

    #[error("cannot seek: {0}")]
    Seek(#[from] ReplayError),
}

/// Install the subscriber: a daily rolling file when a log directory is
/// configured, stderr otherwise. The returned guard must outlive all logging.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::get_log_filter()));

    match config::get_log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir).ok();
            let file_appender = tracing_appender::rolling::daily(dir, config::LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .with(filter)
                .init();
            None
        }
    }
}

fn load(path: &Path) -> anyhow::Result<PgnCollection> {
    match chess::load_from_file(path) {
        Ok(collection) => Ok(collection),
        Err(PgnError::EmptyInput { skipped }) => Err(CliError::NoGames {
            path: path.to_path_buf(),
            skipped,
        }
        .into()),
        Err(err) => Err(err).with_context(|| format!("loading {}", path.display())),
    }
}

/// Cursor on the 1-based `game`.
fn open_cursor(collection: PgnCollection, game: usize) -> anyhow::Result<ReplayCursor> {
    let mut cursor = ReplayCursor::new(collection.games)?;
    let index = game.checked_sub(1).ok_or(CliError::GameNumber(game))?;
    cursor
        .select_game(index)
        .map_err(|_| CliError::GameNumber(game))?;
    Ok(cursor)
}

fn list(collection: &PgnCollection) {
    for (i, game) in collection.games.iter().enumerate() {
        println!(
            "{:>3}. {}  [{}, {}]  {} moves  {}",
            i + 1,
            game.title(),
            game.event(),
            game.date(),
            game.len(),
            game.result()
        );
    }
    if !collection.skipped.is_empty() {
        println!("({} skipped)", collection.skipped.len());
    }
}

fn show(mut cursor: ReplayCursor, ply: Option<usize>, unicode: bool) -> Result<(), CliError> {
    match ply {
        None => cursor.go_to_end(),
        Some(0) => cursor.go_to_start(),
        Some(n) => cursor.seek(Some(n - 1))?,
    }
    let board = cursor.current_board();
    let shown = cursor.index().map_or(0, |i| i + 1);
    print!("{}", render::render_headers(cursor.game()));
    print!(
        "{}",
        render::render_position(cursor.game(), &board, cursor.current_node(), shown, unicode)
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing();
    let unicode = cli.unicode || config::get_unicode();

    match cli.command {
        Commands::List { file } => {
            let collection = load(&file)?;
            list(&collection);
        }
        Commands::Show { file, game, ply } => {
            let cursor = open_cursor(load(&file)?, game)?;
            show(cursor, ply, unicode)?;
        }
        Commands::Step { file, game } => {
            let cursor = open_cursor(load(&file)?, game)?;
            tracing::debug!(game, "starting step session");
            let mut session = session::Session::new(cursor, unicode);
            session.run(std::io::stdin().lock(), std::io::stdout().lock())?;
        }
        Commands::Dump { file } => {
            let collection = load(&file)?;
            let json = serde_json::to_string_pretty(&collection.games)?;
            println!("{}", json);
        }
    }
    Ok(())
}
