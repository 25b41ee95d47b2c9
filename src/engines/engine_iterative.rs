//! Iterative-deepening engine.
//!
//! Every `get_next_move` call runs the search on a dedicated thread and
//! waits on a single-use channel for its answer. The `Searcher` (with its
//! transposition table and evaluation cache) travels to the search thread
//! and back, so the tables persist between moves of one game.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use log::{info, warn};

use crate::engines::engine_trait::{Engine, EngineOutput, GameContext};
use crate::engines::time_management::search_limits_for;
use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::Color;
use crate::game_state::game_state::GameState;
use crate::search::board_scoring::StandardScorer;
use crate::search::iterative_deepening::{SearchConfig, SearchResult, Searcher};
use crate::search::search_events::{format_score, SearchObserver};
use crate::utils::long_algebraic::{move_to_coordinate, move_to_long_algebraic, CheckMark};

const SEARCH_THREAD_STACK_BYTES: usize = 32 * 1024 * 1024;

/// Tunables exposed through `set_option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub hash_mb: usize,
    pub eval_cache_entries: usize,
    pub quiescence_depth: u8,
    pub move_overhead_ms: u64,
    pub delta_pruning: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let search = SearchConfig::default();
        Self {
            hash_mb: search.tt_size_mb,
            eval_cache_entries: search.eval_cache_entries,
            quiescence_depth: search.quiescence_depth,
            move_overhead_ms: 30,
            delta_pruning: search.delta_pruning,
        }
    }
}

impl EngineOptions {
    fn search_config(&self, base: SearchConfig) -> SearchConfig {
        SearchConfig {
            tt_size_mb: self.hash_mb,
            eval_cache_entries: self.eval_cache_entries,
            quiescence_depth: self.quiescence_depth,
            delta_pruning: self.delta_pruning,
            ..base
        }
    }
}

pub struct IterativeEngine {
    side: Option<Color>,
    context: GameContext,
    options: EngineOptions,
    /// `None` only while a search thread owns it.
    searcher: Option<Searcher<StandardScorer>>,
    stop: Arc<AtomicBool>,
}

impl Default for IterativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IterativeEngine {
    pub fn new() -> Self {
        let options = EngineOptions::default();
        let searcher = Searcher::new(StandardScorer, options.search_config(SearchConfig::default()));
        let stop = searcher.stop_handle();
        Self {
            side: None,
            context: GameContext::default(),
            options,
            searcher: Some(searcher),
            stop,
        }
    }

    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn set_observer(&mut self, observer: Box<dyn SearchObserver>) {
        if let Some(searcher) = self.searcher.as_mut() {
            searcher.set_observer(observer);
        }
    }

    fn apply_options(&mut self) {
        if let Some(searcher) = self.searcher.as_mut() {
            let config = self.options.search_config(*searcher.config());
            searcher.reconfigure(config);
        }
    }

    fn run_search(&mut self, game_state: &GameState) -> ChessResult<SearchResult> {
        let mut searcher = self
            .searcher
            .take()
            .ok_or_else(|| ChessError::Worker("a search is already running".to_owned()))?;
        let limits = search_limits_for(game_state, &self.context, self.options.move_overhead_ms);
        let position = game_state.clone();
        let (tx, rx) = mpsc::sync_channel(1);

        self.stop.store(false, Ordering::Relaxed);
        let handle = thread::Builder::new()
            .name("gambit-search".to_owned())
            .stack_size(SEARCH_THREAD_STACK_BYTES)
            .spawn(move || {
                let result = searcher.search(&position, limits);
                let _ = tx.send((searcher, result));
            })
            .map_err(|e| ChessError::Worker(format!("failed to spawn search thread: {e}")))?;

        let received = rx.recv();
        if handle.join().is_err() {
            return Err(ChessError::Worker("search thread panicked".to_owned()));
        }
        let (searcher, result) =
            received.map_err(|_| ChessError::Worker("search thread ended without a result".to_owned()))?;
        self.searcher = Some(searcher);
        result
    }
}

impl Engine for IterativeEngine {
    fn name(&self) -> &str {
        "Gambit Iterative"
    }

    fn init(&mut self, side: Color) {
        self.side = Some(side);
        self.context = GameContext::default();
        if let Some(searcher) = self.searcher.as_mut() {
            searcher.clear();
        }
    }

    fn set_game(&mut self, context: GameContext) {
        self.context = context;
    }

    fn set_option(&mut self, name: &str, value: &str) -> ChessResult<()> {
        let value = value.trim();
        if name.eq_ignore_ascii_case("Hash") {
            self.options.hash_mb = parse_clamped(name, value, 1, 4096)?;
        } else if name.eq_ignore_ascii_case("EvalCache") {
            self.options.eval_cache_entries = parse_clamped(name, value, 1, 1 << 24)?;
        } else if name.eq_ignore_ascii_case("QuiescenceDepth") {
            self.options.quiescence_depth = parse_clamped(name, value, 0, 32)?;
        } else if name.eq_ignore_ascii_case("MoveOverhead") {
            self.options.move_overhead_ms = parse_clamped(name, value, 0, 5_000)?;
        } else if name.eq_ignore_ascii_case("DeltaPruning") {
            self.options.delta_pruning = match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(ChessError::InvalidOption {
                        name: name.to_owned(),
                        reason: format!("expected a boolean, found '{value}'"),
                    })
                }
            };
        } else {
            warn!("ignoring unknown option '{name}'");
            return Err(ChessError::InvalidOption {
                name: name.to_owned(),
                reason: "unknown option".to_owned(),
            });
        }
        self.apply_options();
        Ok(())
    }

    fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn get_next_move(&mut self, game_state: &GameState) -> ChessResult<EngineOutput> {
        if let Some(expected) = self.side {
            if expected != game_state.side_to_move {
                return Err(ChessError::NotEngineTurn {
                    expected,
                    actual: game_state.side_to_move,
                });
            }
        }

        let result = self.run_search(game_state)?;
        let mut out = EngineOutput {
            best_move: result.best_move,
            score: result.score,
            depth: result.reached_depth,
            info_lines: Vec::new(),
        };
        out.info_lines.push(format!(
            "depth {} score {} nodes {} nps {} time {}",
            result.reached_depth,
            format_score(result.score),
            result.nodes,
            result.nps,
            result.elapsed.as_millis()
        ));
        if !result.pv.is_empty() {
            let pv: Vec<String> = result.pv.iter().map(|mv| move_to_coordinate(*mv)).collect();
            out.info_lines.push(format!("pv {}", pv.join(" ")));
        }

        match result.best_move {
            Some(mv) => info!(
                "{} plays {} ({}, depth {}, {} nodes)",
                self.name(),
                move_to_long_algebraic(mv, CheckMark::None),
                format_score(result.score),
                result.reached_depth,
                result.nodes
            ),
            None => info!("{} has no legal move", self.name()),
        }

        Ok(out)
    }
}

fn parse_clamped<T>(name: &str, value: &str, min: T, max: T) -> ChessResult<T>
where
    T: std::str::FromStr + PartialOrd + Copy + std::fmt::Display,
{
    let parsed = value.parse::<T>().map_err(|_| ChessError::InvalidOption {
        name: name.to_owned(),
        reason: format!("'{value}' is not a number"),
    })?;
    if parsed < min || parsed > max {
        let clamped = if parsed < min { min } else { max };
        warn!("option {name}={parsed} out of range [{min}, {max}], using {clamped}");
        return Ok(clamped);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::legal_move_generator::MoveGenerator;

    #[test]
    fn plays_a_legal_move_at_fixed_depth() {
        let mut engine = IterativeEngine::new();
        engine.init(Color::Light);
        engine.set_game(GameContext::fixed_depth(3));

        let mut game = GameState::new_game();
        let out = engine.get_next_move(&game).expect("engine should answer");
        let mv = out.best_move.expect("a move should be chosen");
        assert_eq!(out.depth, 3);
        assert!(MoveGenerator::new().is_legal_move(&mut game, mv).expect("query"));
        assert!(out.info_lines[0].starts_with("depth 3 score cp"));
    }

    #[test]
    fn finds_mate_through_the_thread_boundary() {
        let mut engine = IterativeEngine::new();
        engine.init(Color::Light);
        engine.set_game(GameContext::fixed_depth(4));

        let game = GameState::from_fen("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1").expect("FEN should parse");
        let out = engine.get_next_move(&game).expect("engine should answer");
        assert_eq!(out.best_move.map(move_to_coordinate).as_deref(), Some("d1d8"));

        // The searcher comes back and can be reused.
        let again = engine.get_next_move(&game).expect("engine should answer again");
        assert_eq!(again.best_move, out.best_move);
    }

    #[test]
    fn refuses_to_move_for_the_opponent() {
        let mut engine = IterativeEngine::new();
        engine.init(Color::Dark);
        let err = engine.get_next_move(&GameState::new_game()).expect_err("wrong side");
        assert!(matches!(err, ChessError::NotEngineTurn { expected: Color::Dark, .. }));
    }

    #[test]
    fn move_time_budget_returns_in_time() {
        let mut engine = IterativeEngine::new();
        engine.init(Color::Light);
        engine.set_game(GameContext::fixed_move_time(150));

        let started = std::time::Instant::now();
        let out = engine.get_next_move(&GameState::new_game()).expect("engine should answer");
        assert!(out.best_move.is_some());
        // 150 ms budget plus a few poll intervals.
        assert!(started.elapsed() < std::time::Duration::from_millis(250));
    }

    #[test]
    fn options_are_parsed_and_clamped() {
        let mut engine = IterativeEngine::new();
        engine.set_option("Hash", "8").expect("valid");
        engine.set_option("quiescencedepth", "99").expect("clamped");
        engine.set_option("DeltaPruning", "off").expect("valid");
        engine.set_option("MoveOverhead", "0").expect("valid");

        let options = engine.options();
        assert_eq!(options.hash_mb, 8);
        assert_eq!(options.quiescence_depth, 32);
        assert!(!options.delta_pruning);
        assert_eq!(options.move_overhead_ms, 0);

        assert!(matches!(
            engine.set_option("Hash", "lots"),
            Err(ChessError::InvalidOption { .. })
        ));
        assert!(matches!(
            engine.set_option("Ponder", "true"),
            Err(ChessError::InvalidOption { .. })
        ));
    }

    #[test]
    fn terminal_position_yields_no_move() {
        let mut engine = IterativeEngine::new();
        engine.init(Color::Dark);
        engine.set_game(GameContext::fixed_depth(2));
        let mated = GameState::from_fen("3R2k1/5ppp/8/8/8/8/5PPP/6K1 b - - 1 1").expect("FEN should parse");
        let out = engine.get_next_move(&mated).expect("engine should answer");
        assert_eq!(out.best_move, None);
    }
}
