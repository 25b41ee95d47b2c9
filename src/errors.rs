//! Error types shared by parsing, board mutation, search and engine layers.
//!
//! Expected game outcomes (checkmate, stalemate, draws) are never errors; they
//! are reported through `GameStatus`. The variants here describe malformed
//! input, misuse of the board API, or worker failures.

use thiserror::Error;

/// Malformed Forsyth-Edwards Notation, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 6 whitespace-separated fields, found {0}")]
    FieldCount(usize),
    #[error("piece placement: {0}")]
    Placement(String),
    #[error("side to move: {0}")]
    SideToMove(String),
    #[error("castling availability: {0}")]
    Castling(String),
    #[error("en-passant square: {0}")]
    EnPassant(String),
    #[error("halfmove clock: {0}")]
    HalfmoveClock(String),
    #[error("fullmove number: {0}")]
    FullmoveNumber(String),
    #[error("king placement: {0}")]
    Kings(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("invalid FEN: {0}")]
    Fen(#[from] FenError),

    #[error("invalid square '{0}'")]
    InvalidSquare(String),

    #[error("invalid move notation '{0}'")]
    InvalidNotation(String),

    /// A move that was not produced by the generator reached `make_move`.
    #[error("illegal move {notation}: {reason}")]
    IllegalMove { notation: String, reason: String },

    #[error("no move to undo")]
    EmptyHistory,

    #[error("engine plays {expected:?} but {actual:?} is to move")]
    NotEngineTurn {
        expected: crate::game_state::chess_types::Color,
        actual: crate::game_state::chess_types::Color,
    },

    #[error("invalid value for option {name}: {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("worker thread failed: {0}")]
    Worker(String),
}

pub type ChessResult<T> = Result<T, ChessError>;

#[cfg(test)]
mod tests {
    use super::{ChessError, FenError};

    #[test]
    fn fen_errors_name_the_offending_field() {
        let err: ChessError = FenError::Castling("unexpected character 'X'".to_owned()).into();
        let text = err.to_string();
        assert!(text.contains("castling availability"), "got: {text}");
        assert!(text.contains('X'));
    }
}
