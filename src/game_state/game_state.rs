//! Core incremental board state representation.
//!
//! `GameState` is the central model for the engine. It stores a 64-cell
//! mailbox next to piece bitboards and occupancy caches, turn/state flags,
//! clocks, the incremental position key, and the history stack used by
//! make/undo. Every placement or removal goes through `put_piece` /
//! `remove_piece` so the caches never drift apart.

use std::fmt;

use crate::errors::ChessResult;
use crate::game_state::chess_rules::{
    is_insufficient_material, FIFTY_MOVE_HALFMOVES, STARTING_POSITION_FEN,
};
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_apply::{make_move_in_place, unmake_move_in_place};
use crate::move_generation::legal_move_checks::is_square_attacked;
use crate::move_generation::legal_move_generator::MoveGenerator;
use crate::search::zobrist::piece_square_key;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;
use crate::utils::render_game_state::render_game_state;

/// Result of asking a position whether the game continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl GameStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// Incremental game state optimized for fast move making/undoing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    // --- Board ---
    pub mailbox: [Option<Piece>; 64],
    // [color][piece_kind]
    pub pieces: [[u64; 6]; 2],
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,
    pub king_squares: [Option<Square>; 2],

    // --- Side and state flags ---
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,
    pub in_check: bool,

    // --- Clocks / move counters ---
    pub halfmove_clock: u16,
    pub fullmove_number: u16,

    // --- Incremental hashing ---
    pub zobrist_key: u64,

    // --- Repetition support, newest key last (includes the current one) ---
    pub repetition_history: Vec<u64>,

    // --- Make/undo stack ---
    pub undo_stack: Vec<UndoState>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            mailbox: [None; 64],
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,
            king_squares: [None; 2],

            side_to_move: Color::Light,
            castling_rights: 0,
            en_passant_square: None,
            in_check: false,

            halfmove_clock: 0,
            fullmove_number: 1,

            zobrist_key: 0,
            repetition_history: Vec::new(),
            undo_stack: Vec::new(),
        }
    }
}

impl GameState {
    /// Empty board, light to move. Used while a position is being built.
    #[inline]
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn new_game() -> Self {
        match parse_fen(STARTING_POSITION_FEN) {
            Ok(game) => game,
            Err(err) => unreachable!("starting FEN must parse: {err}"),
        }
    }

    #[inline]
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        parse_fen(fen)
    }

    /// Replace this position with the one described by `fen`.
    ///
    /// The FEN is parsed into a separate value first, so `self` is untouched
    /// when parsing fails.
    pub fn set_fen(&mut self, fen: &str) -> ChessResult<()> {
        let parsed = parse_fen(fen)?;
        *self = parsed;
        Ok(())
    }

    #[inline]
    pub fn get_fen(&self) -> String {
        generate_fen(self)
    }

    #[inline]
    pub fn get_key_hash(&self) -> u64 {
        self.zobrist_key
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square as usize]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.king_squares[color.index()]
    }

    /// True when the side to move is in check.
    #[inline]
    pub fn has_check(&self) -> bool {
        self.in_check
    }

    #[inline]
    pub fn is_attacked(&self, square: Square, by_color: Color) -> bool {
        is_square_attacked(self, square, by_color)
    }

    /// Plies played since this state was created from FEN.
    #[inline]
    pub fn ply(&self) -> usize {
        self.undo_stack.len()
    }

    #[inline]
    pub fn last_move(&self) -> Option<&UndoState> {
        self.undo_stack.last()
    }

    /// Place a piece on an empty square, keeping every cache and the key in sync.
    pub fn put_piece(&mut self, square: Square, piece: Piece) {
        debug_assert!(self.mailbox[square as usize].is_none(), "square {square} occupied");
        let (color, kind) = piece;
        let mask = square_mask(square);
        self.mailbox[square as usize] = Some(piece);
        self.pieces[color.index()][kind.index()] |= mask;
        self.occupancy_by_color[color.index()] |= mask;
        self.occupancy_all |= mask;
        if kind == PieceKind::King {
            self.king_squares[color.index()] = Some(square);
        }
        self.zobrist_key ^= piece_square_key(color, kind, square);
    }

    /// Remove and return the piece on `square`.
    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.mailbox[square as usize].take()?;
        let (color, kind) = piece;
        let mask = !square_mask(square);
        self.pieces[color.index()][kind.index()] &= mask;
        self.occupancy_by_color[color.index()] &= mask;
        self.occupancy_all &= mask;
        if kind == PieceKind::King && self.king_squares[color.index()] == Some(square) {
            self.king_squares[color.index()] = None;
        }
        self.zobrist_key ^= piece_square_key(color, kind, square);
        Some(piece)
    }

    /// Apply a generated move. Illegal input is reported as an error, not a panic.
    #[inline]
    pub fn make_move(&mut self, mv: Move) -> ChessResult<()> {
        make_move_in_place(self, mv)
    }

    /// Undo the most recent move and return it.
    #[inline]
    pub fn undo_move(&mut self) -> ChessResult<Move> {
        unmake_move_in_place(self)
    }

    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_HALFMOVES
    }

    /// Current position occurred at least three times with the same side to move.
    pub fn is_threefold_repetition(&self) -> bool {
        let Some((&current, earlier)) = self.repetition_history.split_last() else {
            return false;
        };
        // Only positions since the last irreversible move can repeat.
        let window = usize::from(self.halfmove_clock).min(earlier.len());
        let occurrences = earlier[earlier.len() - window..]
            .iter()
            .rev()
            .skip(1)
            .step_by(2)
            .filter(|key| **key == current)
            .count();
        occurrences >= 2
    }

    /// Draw by rule, independent of legal-move availability.
    #[inline]
    pub fn is_rule_draw(&self) -> bool {
        self.is_fifty_move_draw() || self.is_threefold_repetition() || is_insufficient_material(self)
    }

    /// Classify the position. Checkmate and stalemate take priority over rule draws.
    pub fn status(&mut self, generator: &mut MoveGenerator) -> ChessResult<GameStatus> {
        if !generator.has_legal_move(self)? {
            return Ok(if self.in_check {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            });
        }
        if self.is_fifty_move_draw() {
            return Ok(GameStatus::FiftyMoveRule);
        }
        if self.is_threefold_repetition() {
            return Ok(GameStatus::ThreefoldRepetition);
        }
        if is_insufficient_material(self) {
            return Ok(GameStatus::InsufficientMaterial);
        }
        Ok(GameStatus::Ongoing)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", render_game_state(self))?;
        write!(f, "{}", self.get_fen())
    }
}
