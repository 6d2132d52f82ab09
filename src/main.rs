//! # Delve Main Entry Point
//!
//! Loads or starts a game, then runs a line-based terminal loop: one key per
//! line, one turn per key.

use clap::Parser;
use delve::{
    menu_selection, ActionResult, DelveError, DelveResult, GameCompletionState, GameConfig,
    GameState, InputHandler, InputToken, Renderer, TextDisplay, WriterRenderer,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
#[cfg(feature = "dev-tools")]
use tracing::{error, info, warn, Level};

#[cfg(not(feature = "dev-tools"))]
use log::{error, info, warn};

/// Command line arguments for Delve.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "A turn-based dungeon crawl with fog of war")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where the game is saved on quit and loaded from on start
    #[arg(long, default_value = "savegame.json")]
    save_file: PathBuf,

    /// Ignore any existing save and start over
    #[arg(long)]
    new_game: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);
    info!("Starting Delve v{}", delve::VERSION);

    if let Err(e) = run(&args) {
        error!("Fatal error: {}", e);
        eprintln!("delve: {}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_timestamp(None)
            .init();
    }
}

fn run(args: &Args) -> DelveResult<()> {
    let config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut state = if args.new_game {
        GameState::new(config, seed)?
    } else {
        load_or_new(&args.save_file, config, seed)?
    };

    let handler = InputHandler::new();
    let mut renderer = WriterRenderer::new(TextDisplay::new(!args.no_color), io::stdout());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("{}", handler.help_text());

    loop {
        state.recompute_fov_if_dirty();
        renderer.draw(&state)?;

        if state.is_over() {
            break;
        }

        let Some(line) = lines.next().transpose()? else {
            info!("Input closed");
            break;
        };
        let token = handler.token_for_line(&line);

        let selection = if token.opens_menu() {
            prompt_selection(&renderer.display, &state, &mut lines)?
        } else {
            None
        };

        let action = handler.token_to_action(token, selection);
        match state.play_turn(action)? {
            ActionResult::Rejected(reason) => info!("Rejected: {}", reason),
            ActionResult::Cancelled(reason) => info!("Cancelled: {}", reason),
            ActionResult::Performed | ActionResult::Ignored => {}
        }

        if token == InputToken::Quit {
            break;
        }
    }

    if state.completion_state == GameCompletionState::PlayerDied {
        remove_save(&args.save_file);
    } else {
        state.save_to_file(&args.save_file)?;
        println!("Game saved to {}", args.save_file.display());
    }

    let stats = &state.statistics;
    println!(
        "Depth {} reached, {} enemies defeated, {} items collected.",
        stats.max_depth_reached, stats.enemies_defeated, stats.items_collected
    );
    Ok(())
}

/// Loads the saved game, starting a new one when the save is missing or
/// unreadable.
fn load_or_new(path: &Path, config: GameConfig, seed: u64) -> DelveResult<GameState> {
    match GameState::load_from_file(path) {
        Ok(state) => {
            info!("Resumed game from {}", path.display());
            Ok(state)
        }
        Err(e) if e.is_persistence() => {
            if !matches!(e, DelveError::SaveNotFound(_)) {
                warn!("Could not load save: {}", e);
            }
            GameState::new(config, seed)
        }
        Err(e) => Err(e),
    }
}

/// Shows the inventory menu and reads one letter.
fn prompt_selection<I>(
    display: &TextDisplay,
    state: &GameState,
    lines: &mut I,
) -> DelveResult<Option<usize>>
where
    I: Iterator<Item = io::Result<String>>,
{
    let Some(menu) = display.render_inventory(state) else {
        println!("Your inventory is empty.");
        return Ok(None);
    };
    println!("{}", menu);
    print!("Choose an item (any other key cancels): ");
    io::stdout().flush()?;

    let menu_len = state
        .player()
        .and_then(|p| p.inventory.as_ref())
        .map_or(0, |inventory| inventory.len());
    let Some(line) = lines.next().transpose()? else {
        return Ok(None);
    };
    Ok(line
        .trim()
        .chars()
        .next()
        .and_then(|key| menu_selection(key, menu_len)))
}

fn remove_save(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove save {}: {}", path.display(), e);
        }
    }
}
