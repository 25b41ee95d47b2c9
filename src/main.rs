//! `gambit` command-line front end.
//!
//! Usage:
//!   gambit perft --depth 5 [--threads 4] [--fen FEN] [--divide]
//!   gambit search [--fen FEN] [--moves e2e4 e7e5 ...] [--depth 8] [--movetime 2000] [--nodes N] [--hash 64]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use gambit_engine::engines::engine_iterative::IterativeEngine;
use gambit_engine::engines::engine_trait::{Engine, GameContext};
use gambit_engine::game_state::chess_rules::STARTING_POSITION_FEN;
use gambit_engine::game_state::game_state::GameState;
use gambit_engine::move_generation::legal_move_generator::MoveGenerator;
use gambit_engine::move_generation::perft::{format_divide, perft_divide, PerftReport};
use gambit_engine::search::search_events::{format_score, SearchEvent};
use gambit_engine::utils::long_algebraic::{
    annotate_long_algebraic, move_to_coordinate, parse_coordinate_move,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Gambit chess engine tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count leaf nodes of the legal move tree
    Perft {
        /// Depth in plies
        #[arg(short, long, default_value_t = 5)]
        depth: u8,

        /// Worker threads (root moves are split between them)
        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        /// Start position (defaults to the standard initial position)
        #[arg(short, long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        /// Print node counts per root move
        #[arg(long)]
        divide: bool,
    },

    /// Search a position and print the best move
    Search {
        /// Start position (defaults to the standard initial position)
        #[arg(short, long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        /// Moves in coordinate notation played from the start position
        #[arg(short, long, num_args = 1..)]
        moves: Vec<String>,

        /// Maximum depth in plies
        #[arg(short, long)]
        depth: Option<u8>,

        /// Time budget in milliseconds
        #[arg(long)]
        movetime: Option<u64>,

        /// Node budget
        #[arg(long)]
        nodes: Option<u64>,

        /// Transposition table size in MB
        #[arg(long, default_value_t = 64)]
        hash: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Perft {
            depth,
            threads,
            fen,
            divide,
        } => run_perft(&fen, depth, threads, divide),
        Command::Search {
            fen,
            moves,
            depth,
            movetime,
            nodes,
            hash,
        } => run_search(&fen, &moves, depth, movetime, nodes, hash),
    }
}

fn run_perft(fen: &str, depth: u8, threads: usize, divide: bool) -> Result<()> {
    let game = GameState::from_fen(fen).with_context(|| format!("cannot load position '{fen}'"))?;

    if divide {
        let per_move = perft_divide(&game, depth).context("perft divide failed")?;
        println!("{}", format_divide(&per_move));
        return Ok(());
    }

    let report = PerftReport::run(&game, depth, threads.max(1)).context("perft failed")?;
    println!("{report}");
    Ok(())
}

fn run_search(
    fen: &str,
    moves: &[String],
    depth: Option<u8>,
    movetime: Option<u64>,
    nodes: Option<u64>,
    hash: usize,
) -> Result<()> {
    let mut game = GameState::from_fen(fen).with_context(|| format!("cannot load position '{fen}'"))?;
    for text in moves {
        let mv = parse_coordinate_move(text, &mut game).with_context(|| format!("cannot play '{text}'"))?;
        game.make_move(mv)?;
    }
    if depth.is_none() && movetime.is_none() && nodes.is_none() {
        bail!("give at least one of --depth, --movetime, --nodes");
    }

    println!("{game}");

    let status = game.status(&mut MoveGenerator::new())?;
    if status.is_terminal() {
        println!("game over: {status:?}");
        return Ok(());
    }

    let mut engine = IterativeEngine::new();
    engine.set_option("Hash", &hash.to_string())?;
    engine.set_observer(Box::new(|event: &SearchEvent| {
        if let SearchEvent::Iteration(info) = event {
            println!("info {}", info.to_info_line());
        }
    }));
    engine.init(game.side_to_move);
    engine.set_game(GameContext {
        depth,
        move_time_ms: movetime,
        nodes,
        ..GameContext::default()
    });

    let output = engine.get_next_move(&game)?;
    for line in &output.info_lines {
        info!("{line}");
    }

    match output.best_move {
        Some(mv) => {
            let shown = annotate_long_algebraic(&mut game, mv)?;
            println!(
                "bestmove {} ({shown}, {})",
                move_to_coordinate(mv),
                format_score(output.score)
            );
        }
        None => println!("bestmove (none) {}", format_score(output.score)),
    }
    Ok(())
}
