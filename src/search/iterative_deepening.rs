//! Iterative deepening search with negamax alpha-beta pruning.
//!
//! Each depth runs a principal-variation negamax from the root. Leaves hand
//! over to a capture-only quiescence search. Results are memoized in the
//! transposition table and static scores in the evaluation cache; both are
//! owned by the `Searcher` and only touched by the thread running it.
//!
//! Stopping is cooperative: the external stop flag and the hard time flag
//! are polled at every node, the soft flag between iterations. Depth 1 is
//! always searched to completion so an aborted search still has a move to
//! return. A node budget, when given, aborts the same way as the hard flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::errors::ChessResult;
use crate::game_state::chess_rules::is_insufficient_material;
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_generator::MoveGenerator;
use crate::moves::move_descriptions::*;
use crate::moves::move_list::MoveList;
use crate::search::board_scoring::{BoardScorer, EvalCache, EvalCacheStats, MaterialScorer};
use crate::search::search_events::{IterationInfo, SearchEvent, SearchObserver};
use crate::search::time_keeper::{TimeBudget, TimeFlags, TimeKeeper, DEFAULT_POLL_INTERVAL};
use crate::search::transposition_table::{
    score_from_tt, score_to_tt, Bound, TTEntry, TTStats, TranspositionTable, MATE_BOUND,
};

pub const MATE_SCORE: i32 = 30_000;
pub const INF: i32 = 32_000;
pub const DRAW_SCORE: i32 = 0;
pub const MAX_PLY: usize = 128;

/// Optimistic margin added to a capture's gain before delta pruning it.
const DELTA_MARGIN: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub max_depth: u8,
    /// Quiescence plies below the nominal horizon.
    pub quiescence_depth: u8,
    pub delta_pruning: bool,
    pub tt_size_mb: usize,
    pub eval_cache_entries: usize,
    pub poll_interval: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            quiescence_depth: 8,
            delta_pruning: true,
            tt_size_mb: 16,
            eval_cache_entries: 1 << 16,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Per-request limits. Unset fields mean "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: Option<u8>,
    pub soft_ms: Option<u64>,
    pub hard_ms: Option<u64>,
    pub max_nodes: Option<u64>,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        Self {
            max_depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn movetime(ms: u64) -> Self {
        Self {
            soft_ms: Some(ms),
            hard_ms: Some(ms),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub reached_depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub nps: u64,
    pub pv: Vec<Move>,
    /// The last iteration was cut short by a stop request or the hard limit.
    pub stopped: bool,
    pub tt_stats: TTStats,
    pub eval_stats: EvalCacheStats,
}

pub struct Searcher<S: BoardScorer = MaterialScorer> {
    config: SearchConfig,
    scorer: S,
    tt: TranspositionTable,
    eval_cache: EvalCache,
    generator: MoveGenerator,
    stop: Arc<AtomicBool>,
    observer: Option<Box<dyn SearchObserver>>,

    // Per-search state.
    time_flags: Arc<TimeFlags>,
    nodes: u64,
    node_budget: Option<u64>,
    can_abort: bool,
    aborted: bool,
}

impl<S: BoardScorer> Searcher<S> {
    pub fn new(scorer: S, config: SearchConfig) -> Self {
        Self {
            tt: TranspositionTable::new_with_mb(config.tt_size_mb),
            eval_cache: EvalCache::new(config.eval_cache_entries),
            config,
            scorer,
            generator: MoveGenerator::new(),
            stop: Arc::new(AtomicBool::new(false)),
            observer: None,
            time_flags: Arc::new(TimeFlags::default()),
            nodes: 0,
            node_budget: None,
            can_abort: false,
            aborted: false,
        }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Apply a new configuration, rebuilding the tables whose size changed.
    pub fn reconfigure(&mut self, config: SearchConfig) {
        if config.tt_size_mb != self.config.tt_size_mb {
            self.tt = TranspositionTable::new_with_mb(config.tt_size_mb);
        }
        if config.eval_cache_entries != self.config.eval_cache_entries {
            self.eval_cache = EvalCache::new(config.eval_cache_entries);
        }
        self.config = config;
    }

    /// Shared flag; storing `true` stops the running search at the next node.
    #[inline]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn set_observer(&mut self, observer: Box<dyn SearchObserver>) {
        self.observer = Some(observer);
    }

    /// Forget everything learned in earlier searches.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.eval_cache.clear();
        self.generator.clear_cache();
    }

    /// Search `game_state` and return the best move found within `limits`.
    ///
    /// The caller's position is not modified. The stop flag is not reset
    /// here; a stop requested before the call ends the search after the
    /// completed depth-1 iteration.
    pub fn search(&mut self, game_state: &GameState, limits: SearchLimits) -> ChessResult<SearchResult> {
        let keeper = TimeKeeper::start(
            TimeBudget::from_millis(limits.soft_ms, limits.hard_ms),
            self.config.poll_interval,
        )?;
        self.time_flags = keeper.flags();
        self.nodes = 0;
        self.node_budget = limits.max_nodes;
        self.can_abort = false;
        self.aborted = false;

        let mut root = game_state.clone();
        let mut root_moves = MoveList::new();
        self.generator.generate_legal(&mut root, &mut root_moves)?;

        let max_depth = limits
            .max_depth
            .unwrap_or(self.config.max_depth)
            .clamp(1, self.config.max_depth.max(1))
            .min(MAX_PLY as u8);

        let mut result = SearchResult::default();

        if root_moves.is_empty() {
            result.score = if root.in_check { -MATE_SCORE } else { DRAW_SCORE };
            self.finish(&mut result, keeper.elapsed());
            return Ok(result);
        }

        for depth in 1..=max_depth {
            if depth > 1 && (self.time_flags.soft_reached() || self.stop_requested()) {
                result.stopped = self.stop_requested() || self.time_flags.hard_reached();
                break;
            }

            let iteration = self.search_root(&mut root, &mut root_moves, depth, result.best_move)?;

            if self.aborted {
                // Root moves finished before the abort were searched in full.
                // One that displaced the previous best move is kept.
                if let Some((mv, score)) = iteration.filter(|(mv, _)| result.best_move != Some(*mv)) {
                    result.best_move = Some(mv);
                    result.score = score;
                    result.pv = self.principal_variation(&root, mv, depth);
                }
                result.stopped = true;
                break;
            }
            self.can_abort = true;

            let Some((best_move, score)) = iteration else {
                break;
            };
            result.best_move = Some(best_move);
            result.score = score;
            result.reached_depth = depth;
            result.pv = self.principal_variation(&root, best_move, depth);

            let elapsed = keeper.elapsed();
            let info = IterationInfo {
                depth,
                score,
                best_move: Some(best_move),
                nodes: self.nodes,
                nps: nodes_per_second(self.nodes, elapsed),
                elapsed,
                hashfull: self.tt.hashfull(),
                pv: result.pv.clone(),
            };
            debug!("{}", info.to_info_line());
            self.emit(SearchEvent::Iteration(info));

            if root_moves.len() == 1 {
                break;
            }
            if score.abs() >= MATE_BOUND && MATE_SCORE - score.abs() <= i32::from(depth) {
                break;
            }
        }

        if result.pv.is_empty() {
            result.pv.extend(result.best_move);
        }
        self.finish(&mut result, keeper.elapsed());
        Ok(result)
    }

    fn finish(&mut self, result: &mut SearchResult, elapsed: Duration) {
        result.nodes = self.nodes;
        result.elapsed = elapsed;
        result.nps = nodes_per_second(self.nodes, result.elapsed);
        result.tt_stats = self.tt.stats();
        result.eval_stats = self.eval_cache.stats();
        self.emit(SearchEvent::BestMove {
            best_move: result.best_move,
            score: result.score,
        });
    }

    fn emit(&mut self, event: SearchEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_event(&event);
        }
    }

    #[inline]
    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Polled at every node.
    #[inline]
    fn should_abort(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        if self.can_abort
            && (self.stop_requested()
                || self.time_flags.hard_reached()
                || self.node_budget.is_some_and(|budget| self.nodes >= budget))
        {
            self.aborted = true;
        }
        self.aborted
    }

    fn search_root(
        &mut self,
        root: &mut GameState,
        root_moves: &mut MoveList,
        depth: u8,
        previous_best: Option<Move>,
    ) -> ChessResult<Option<(Move, i32)>> {
        let tt_move = previous_best.or_else(|| self.tt.peek(root.zobrist_key).and_then(|e| e.best_move));
        order_moves(root_moves.as_mut_slice(), tt_move);

        let mut alpha = -INF;
        let beta = INF;
        let mut best: Option<(Move, i32)> = None;

        for i in 0..root_moves.len() {
            let mv = root_moves[i];
            root.make_move(mv)?;
            let score = if best.is_none() {
                -self.negamax(root, depth - 1, 1, -beta, -alpha)?
            } else {
                let scout = -self.negamax(root, depth - 1, 1, -alpha - 1, -alpha)?;
                if scout > alpha && scout < beta && !self.aborted {
                    -self.negamax(root, depth - 1, 1, -beta, -alpha)?
                } else {
                    scout
                }
            };
            root.undo_move()?;

            if self.aborted {
                break;
            }

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
            alpha = alpha.max(score);
        }

        if let Some((mv, score)) = best.filter(|_| !self.aborted) {
            self.tt.put(root.zobrist_key, depth, score_to_tt(score, 0), Bound::Exact, Some(mv));
        }
        Ok(best)
    }

    fn negamax(
        &mut self,
        game_state: &mut GameState,
        depth: u8,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
    ) -> ChessResult<i32> {
        if self.should_abort() {
            return Ok(0);
        }

        if is_draw_by_rule(game_state) {
            self.nodes += 1;
            return Ok(DRAW_SCORE);
        }
        if depth == 0 {
            return self.quiescence(game_state, ply, 0, alpha, beta);
        }
        self.nodes += 1;
        if ply >= MAX_PLY {
            return Ok(self.evaluate(game_state));
        }

        // Mate-distance pruning.
        alpha = alpha.max(-MATE_SCORE + ply as i32);
        beta = beta.min(MATE_SCORE - ply as i32 - 1);
        if alpha >= beta {
            return Ok(alpha);
        }

        let key = game_state.zobrist_key;
        let tt_hit = self.tt.probe(key);
        if let Some(entry) = tt_hit {
            let rebased = TTEntry {
                score: score_from_tt(entry.score, ply),
                ..entry
            };
            if let Some(score) = rebased.cutoff_score(depth, alpha, beta) {
                return Ok(score);
            }
        }
        let tt_move = tt_hit.and_then(|entry| entry.best_move);

        let mut moves = MoveList::new();
        self.generator.generate_legal(game_state, &mut moves)?;
        if moves.is_empty() {
            return Ok(if game_state.in_check {
                -MATE_SCORE + ply as i32
            } else {
                DRAW_SCORE
            });
        }
        order_moves(moves.as_mut_slice(), tt_move);

        let alpha_orig = alpha;
        let mut best_score = -INF;
        let mut best_move = None;

        for (i, &mv) in moves.iter().enumerate() {
            game_state.make_move(mv)?;
            let score = if i == 0 {
                -self.negamax(game_state, depth - 1, ply + 1, -beta, -alpha)?
            } else {
                let scout = -self.negamax(game_state, depth - 1, ply + 1, -alpha - 1, -alpha)?;
                if scout > alpha && scout < beta && !self.aborted {
                    -self.negamax(game_state, depth - 1, ply + 1, -beta, -alpha)?
                } else {
                    scout
                }
            };
            game_state.undo_move()?;

            if self.aborted {
                return Ok(0);
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        let bound = if best_score <= alpha_orig {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt
            .put(key, depth, score_to_tt(best_score, ply), bound, best_move.or(tt_move));

        Ok(best_score)
    }

    /// Capture search below the horizon. Fail-hard: results lie in `[alpha, beta]`.
    fn quiescence(
        &mut self,
        game_state: &mut GameState,
        ply: usize,
        qdepth: u8,
        mut alpha: i32,
        beta: i32,
    ) -> ChessResult<i32> {
        if self.should_abort() {
            return Ok(0);
        }
        self.nodes += 1;

        let in_check = game_state.in_check;
        let at_limit = qdepth >= self.config.quiescence_depth || ply >= MAX_PLY;
        let mut moves = MoveList::new();
        let mut stand_pat = -INF;

        if in_check {
            // No standing pat while in check: every evasion is searched.
            self.generator.generate_legal(game_state, &mut moves)?;
            if moves.is_empty() {
                return Ok(fail_hard(-MATE_SCORE + ply as i32, alpha, beta));
            }
            if at_limit {
                let score = self.evaluate(game_state);
                return Ok(fail_hard(score, alpha, beta));
            }
        } else {
            stand_pat = self.evaluate(game_state);
            if at_limit {
                return Ok(fail_hard(stand_pat, alpha, beta));
            }
            if stand_pat >= beta {
                return Ok(beta);
            }
            alpha = alpha.max(stand_pat);
            self.generator.generate_legal_tactical(game_state, &mut moves)?;
        }
        order_moves(moves.as_mut_slice(), None);

        for &mv in moves.iter() {
            if !in_check
                && self.config.delta_pruning
                && stand_pat + capture_gain(mv) + DELTA_MARGIN <= alpha
            {
                continue;
            }

            game_state.make_move(mv)?;
            let score = -self.quiescence(game_state, ply + 1, qdepth + 1, -beta, -alpha)?;
            game_state.undo_move()?;

            if self.aborted {
                return Ok(0);
            }
            if score >= beta {
                return Ok(beta);
            }
            alpha = alpha.max(score);
        }

        Ok(alpha)
    }

    #[inline]
    fn evaluate(&mut self, game_state: &GameState) -> i32 {
        self.eval_cache.evaluate(&self.scorer, game_state)
    }

    /// Best line from the root: `best_move` followed by TT moves while they stay legal.
    fn principal_variation(&mut self, root: &GameState, best_move: Move, max_len: u8) -> Vec<Move> {
        let mut pv = vec![best_move];
        let mut state = root.clone();
        if state.make_move(best_move).is_err() {
            return pv;
        }
        let mut seen = vec![root.zobrist_key, state.zobrist_key];

        while pv.len() < usize::from(max_len) {
            let Some(mv) = self.tt.peek(state.zobrist_key).and_then(|e| e.best_move) else {
                break;
            };
            if !matches!(self.generator.is_legal_move(&mut state, mv), Ok(true)) {
                break;
            }
            if state.make_move(mv).is_err() || seen.contains(&state.zobrist_key) {
                break;
            }
            seen.push(state.zobrist_key);
            pv.push(mv);
        }
        pv
    }
}

#[inline]
fn fail_hard(score: i32, alpha: i32, beta: i32) -> i32 {
    score.max(alpha).min(beta)
}

#[inline]
fn is_draw_by_rule(game_state: &GameState) -> bool {
    game_state.is_fifty_move_draw()
        || game_state.is_threefold_repetition()
        || is_insufficient_material(game_state)
}

#[inline]
fn nodes_per_second(nodes: u64, elapsed: Duration) -> u64 {
    let ms = elapsed.as_millis() as u64;
    if ms == 0 {
        0
    } else {
        nodes.saturating_mul(1000) / ms
    }
}

#[inline]
fn piece_value(piece: PieceKind) -> i32 {
    match piece {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 20_000,
    }
}

/// Material swing of a tactical move if the capturing piece is not recaptured.
#[inline]
fn capture_gain(mv: Move) -> i32 {
    let victim = move_captured_piece(mv).map_or(0, piece_value);
    let promotion = move_promotion_piece(mv).map_or(0, |p| piece_value(p) - piece_value(PieceKind::Pawn));
    victim + promotion
}

/// TT move, then captures by MVV-LVA, then promotions, then quiet moves.
fn order_moves(moves: &mut [Move], tt_move: Option<Move>) {
    moves.sort_by_key(|mv| -move_order_score(*mv, tt_move));
}

fn move_order_score(mv: Move, tt_move: Option<Move>) -> i32 {
    if Some(mv) == tt_move {
        return 1_000_000;
    }
    let mut score = 0i32;
    if is_capture(mv) {
        let victim = move_captured_piece(mv).map_or(100, piece_value);
        let attacker = move_moved_piece(mv).map_or(0, |p| p.index() as i32);
        score += 100_000 + victim * 10 - attacker;
    }
    if let Some(promo) = move_promotion_piece(mv) {
        score += 90_000 + piece_value(promo);
    }
    score
}
