//! Perft: exhaustive legal-move tree walk used to validate move generation.
//!
//! Leaf statistics are read back from the last history entry and the
//! resulting position. No evaluation or transposition table is involved.
//! The multi-threaded variant hands root moves to a pool of workers, each
//! owning a private copy of the position and its own generator.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::Move;
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_generator::MoveGenerator;
use crate::moves::move_descriptions::is_promotion;
use crate::moves::move_list::MoveList;
use crate::utils::long_algebraic::move_to_coordinate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftCounts {
    pub fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.checkmates += rhs.checkmates;
    }
}

pub fn perft(game_state: &GameState, depth: u8) -> ChessResult<PerftCounts> {
    let mut game = game_state.clone();
    let mut generator = MoveGenerator::new();
    perft_single_thread(&mut generator, &mut game, depth)
}

pub fn perft_single_thread(
    generator: &mut MoveGenerator,
    game_state: &mut GameState,
    depth: u8,
) -> ChessResult<PerftCounts> {
    let mut counts = PerftCounts::default();
    if depth == 0 {
        counts.nodes = 1;
        return Ok(counts);
    }
    perft_recurse(generator, game_state, depth, &mut counts)?;
    Ok(counts)
}

/// Node counts per root move, in generation order.
pub fn perft_divide(game_state: &GameState, depth: u8) -> ChessResult<Vec<(Move, u64)>> {
    let mut game = game_state.clone();
    let mut generator = MoveGenerator::new();
    let mut root_moves = MoveList::new();
    generator.generate_legal(&mut game, &mut root_moves)?;

    let mut out = Vec::with_capacity(root_moves.len());
    for mv in root_moves.iter().copied() {
        game.make_move(mv)?;
        let child = perft_single_thread(&mut generator, &mut game, depth.saturating_sub(1))?;
        game.undo_move()?;
        out.push((mv, child.nodes));
    }
    Ok(out)
}

/// Root moves are shared out to `threads` workers through an atomic job index.
pub fn perft_multi_threaded(
    game_state: &GameState,
    depth: u8,
    threads: usize,
) -> ChessResult<PerftCounts> {
    if depth <= 1 || threads <= 1 {
        return perft(game_state, depth);
    }

    let mut root = game_state.clone();
    let mut root_moves = MoveList::new();
    MoveGenerator::new().generate_legal(&mut root, &mut root_moves)?;
    let jobs = root_moves.as_slice();
    let next_job = AtomicUsize::new(0);
    let total = Mutex::new(PerftCounts::default());
    let (next_job_ref, total_ref) = (&next_job, &total);

    let worker_results: Vec<ChessResult<()>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads.min(jobs.len()))
            .map(|_| {
                scope.spawn(move || -> ChessResult<()> {
                    let mut game = game_state.clone();
                    let mut generator = MoveGenerator::new();
                    let mut local = PerftCounts::default();
                    loop {
                        let job = next_job_ref.fetch_add(1, Ordering::Relaxed);
                        let Some(&mv) = jobs.get(job) else {
                            break;
                        };
                        game.make_move(mv)?;
                        let result = perft_single_thread(&mut generator, &mut game, depth - 1);
                        game.undo_move()?;
                        local.merge(result?);
                    }
                    let mut guard = total_ref
                        .lock()
                        .map_err(|_| ChessError::Worker("perft totals lock poisoned".to_owned()))?;
                    guard.merge(local);
                    Ok(())
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(ChessError::Worker("perft worker thread panicked".to_owned())))
            })
            .collect()
    });

    for result in worker_results {
        result?;
    }
    total
        .into_inner()
        .map_err(|_| ChessError::Worker("perft totals lock poisoned".to_owned()))
}

fn perft_recurse(
    generator: &mut MoveGenerator,
    game_state: &mut GameState,
    depth: u8,
    counts: &mut PerftCounts,
) -> ChessResult<()> {
    let mut moves = MoveList::new();
    generator.generate_legal(game_state, &mut moves)?;

    for mv in moves.iter().copied() {
        game_state.make_move(mv)?;
        if depth == 1 {
            counts.merge(leaf_counts(generator, game_state)?);
        } else {
            perft_recurse(generator, game_state, depth - 1, counts)?;
        }
        game_state.undo_move()?;
    }
    Ok(())
}

/// Statistics for the position just reached by the last move.
fn leaf_counts(generator: &mut MoveGenerator, game_state: &mut GameState) -> ChessResult<PerftCounts> {
    let mut counts = PerftCounts {
        nodes: 1,
        ..PerftCounts::default()
    };
    let Some(last) = game_state.last_move() else {
        return Ok(counts);
    };
    let mv = last.mv;
    counts.captures = u64::from(last.captured_piece.is_some());
    counts.en_passant = u64::from(last.was_en_passant);
    counts.castles = u64::from(last.was_castling);
    counts.promotions = u64::from(is_promotion(mv));
    if last.gives_check {
        counts.checks = 1;
        counts.checkmates = u64::from(!generator.has_legal_move(game_state)?);
    }
    Ok(counts)
}

/// Result of one timed perft run, printed by the CLI.
#[derive(Debug, Clone)]
pub struct PerftReport {
    pub fen: String,
    pub depth: u8,
    pub threads: usize,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub counts: PerftCounts,
}

impl PerftReport {
    pub fn run(game_state: &GameState, depth: u8, threads: usize) -> ChessResult<Self> {
        let started_at = Local::now();
        let start = Instant::now();
        let counts = perft_multi_threaded(game_state, depth, threads)?;
        Ok(Self {
            fen: game_state.get_fen(),
            depth,
            threads,
            started_at,
            elapsed: start.elapsed(),
            counts,
        })
    }

    pub fn nodes_per_second(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return self.counts.nodes;
        }
        (self.counts.nodes as f64 / secs) as u64
    }
}

impl fmt::Display for PerftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "perft started {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "fen         {}", self.fen)?;
        writeln!(f, "depth       {} ({} threads)", self.depth, self.threads)?;
        writeln!(f, "nodes       {}", self.counts.nodes)?;
        writeln!(f, "captures    {}", self.counts.captures)?;
        writeln!(f, "en passant  {}", self.counts.en_passant)?;
        writeln!(f, "castles     {}", self.counts.castles)?;
        writeln!(f, "promotions  {}", self.counts.promotions)?;
        writeln!(f, "checks      {}", self.counts.checks)?;
        writeln!(f, "checkmates  {}", self.counts.checkmates)?;
        writeln!(f, "elapsed     {:.3}s", self.elapsed.as_secs_f64())?;
        write!(f, "nps         {}", self.nodes_per_second())
    }
}

/// `e2e4: 20` lines followed by the total, like most engines print it.
pub fn format_divide(divide: &[(Move, u64)]) -> String {
    let mut lines: Vec<String> = divide
        .iter()
        .map(|(mv, nodes)| format!("{}: {nodes}", move_to_coordinate(*mv)))
        .collect();
    lines.sort();
    let total: u64 = divide.iter().map(|(_, nodes)| nodes).sum();
    lines.push(String::new());
    lines.push(format!("Nodes searched: {total}"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn depth_zero_counts_single_node() {
        let counts = perft(&GameState::new_game(), 0).expect("perft should run");
        assert_eq!(
            counts,
            PerftCounts {
                nodes: 1,
                ..PerftCounts::default()
            }
        );
    }

    #[test]
    fn starting_position_shallow_reference_counts() {
        let game = GameState::new_game();
        assert_eq!(perft(&game, 1).expect("perft").nodes, 20);
        assert_eq!(perft(&game, 2).expect("perft").nodes, 400);

        let d3 = perft(&game, 3).expect("perft");
        assert_eq!((d3.nodes, d3.captures, d3.checks, d3.checkmates), (8_902, 34, 12, 0));

        let d4 = perft(&game, 4).expect("perft");
        assert_eq!(
            (d4.nodes, d4.captures, d4.checks, d4.checkmates),
            (197_281, 1_576, 469, 8)
        );
    }

    #[test]
    fn starting_position_depth_five_threaded() {
        let counts = perft_multi_threaded(&GameState::new_game(), 5, 4).expect("perft");
        assert_eq!(
            counts,
            PerftCounts {
                nodes: 4_865_609,
                captures: 82_719,
                en_passant: 258,
                castles: 0,
                promotions: 0,
                checks: 27_351,
                checkmates: 347,
            }
        );
    }

    #[test]
    fn kiwipete_exercises_special_moves() {
        let game = GameState::from_fen(KIWIPETE).expect("FEN should parse");
        let d2 = perft(&game, 2).expect("perft");
        assert_eq!(
            (d2.nodes, d2.captures, d2.en_passant, d2.castles, d2.checks),
            (2_039, 351, 1, 91, 3)
        );
        let d3 = perft_multi_threaded(&game, 3, 3).expect("perft");
        assert_eq!(
            d3,
            PerftCounts {
                nodes: 97_862,
                captures: 17_102,
                en_passant: 45,
                castles: 3_162,
                promotions: 0,
                checks: 993,
                checkmates: 1,
            }
        );
    }

    #[test]
    fn promotion_heavy_position() {
        let game = GameState::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
            .expect("FEN should parse");
        let d3 = perft(&game, 3).expect("perft");
        assert_eq!(d3.nodes, 9_467);
        assert_eq!(d3.promotions, 120);
        assert_eq!(d3.checkmates, 22);
    }

    #[test]
    fn divide_sums_to_perft() {
        let game = GameState::from_fen(KIWIPETE).expect("FEN should parse");
        let divide = perft_divide(&game, 2).expect("divide");
        assert_eq!(divide.len(), 48);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 2_039);
        assert!(format_divide(&divide).ends_with("Nodes searched: 2039"));
    }

    #[test]
    fn report_mentions_counts() {
        let report = PerftReport::run(&GameState::new_game(), 2, 2).expect("report");
        let text = report.to_string();
        assert!(text.contains("nodes       400"));
        assert!(text.contains("depth       2 (2 threads)"));
    }
}
