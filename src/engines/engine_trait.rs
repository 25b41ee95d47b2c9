//! Engine abstraction consumed by a game-session layer.
//!
//! A session initialises the engine with the side it plays, hands it the
//! clock situation, then asks for moves. `get_next_move` blocks until the
//! engine has an answer or its stop handle is raised.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::errors::ChessResult;
use crate::game_state::chess_types::{Color, Move};
use crate::game_state::game_state::GameState;

/// Clock and limit information for the next move request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameContext {
    pub light_time_ms: Option<u64>,
    pub dark_time_ms: Option<u64>,
    pub light_increment_ms: Option<u64>,
    pub dark_increment_ms: Option<u64>,
    pub moves_to_go: Option<u16>,
    /// Fixed time per move; overrides the clocks.
    pub move_time_ms: Option<u64>,
    pub depth: Option<u8>,
    /// Node budget; checked once depth 1 is complete.
    pub nodes: Option<u64>,
}

impl GameContext {
    pub fn fixed_depth(depth: u8) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn fixed_move_time(ms: u64) -> Self {
        Self {
            move_time_ms: Some(ms),
            ..Self::default()
        }
    }

    /// Remaining time and increment for `color`.
    pub fn clock_for(&self, color: Color) -> (Option<u64>, Option<u64>) {
        match color {
            Color::Light => (self.light_time_ms, self.light_increment_ms),
            Color::Dark => (self.dark_time_ms, self.dark_increment_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// `None` only when the position has no legal move.
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub info_lines: Vec<String>,
}

pub trait Engine: Send {
    fn name(&self) -> &str;

    /// Start a new game playing `side`.
    fn init(&mut self, side: Color);

    fn set_game(&mut self, context: GameContext);

    fn set_option(&mut self, name: &str, value: &str) -> ChessResult<()>;

    /// Raising this flag makes a pending `get_next_move` return early.
    fn stop_handle(&self) -> Arc<AtomicBool>;

    fn get_next_move(&mut self, game_state: &GameState) -> ChessResult<EngineOutput>;
}
