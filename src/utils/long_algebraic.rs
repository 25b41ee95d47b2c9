//! Move notation.
//!
//! Two forms are supported:
//! - coordinate notation (`e2e4`, `e7e8q`), used for input and engine output;
//! - long algebraic notation (`e2-e4`, `e4xd5`, `Ng1-f3`, `O-O`, `e7-e8Q`,
//!   `Qd1-h5+`, `Qh5xf7++`), used for logs and move lists.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::{chess_types::*, game_state::GameState, undo_state::TerminalKind};
use crate::move_generation::legal_move_generator::MoveGenerator;
use crate::moves::move_descriptions::*;
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

/// Check annotation appended to long algebraic notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMark {
    None,
    Check,
    Mate,
}

impl CheckMark {
    fn suffix(self) -> &'static str {
        match self {
            CheckMark::None => "",
            CheckMark::Check => "+",
            CheckMark::Mate => "++",
        }
    }
}

pub fn move_to_coordinate(mv: Move) -> String {
    let mut out = square_to_algebraic(move_from(mv));
    out.push_str(&square_to_algebraic(move_to(mv)));
    if let Some(promo) = move_promotion_piece(mv) {
        out.push(promo.letter().to_ascii_lowercase());
    }
    out
}

/// Resolve coordinate notation against the legal moves of `game_state`.
pub fn parse_coordinate_move(text: &str, game_state: &mut GameState) -> ChessResult<Move> {
    let text = text.trim();
    if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
        return Err(ChessError::InvalidNotation(text.to_owned()));
    }

    let from = algebraic_to_square(&text[0..2])?;
    let to = algebraic_to_square(&text[2..4])?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(ch) => match PieceKind::from_letter(ch) {
            Some(kind) if PROMOTION_PIECES.contains(&kind) => Some(kind),
            _ => return Err(ChessError::InvalidNotation(text.to_owned())),
        },
    };

    let mut generator = MoveGenerator::new();
    generator
        .legal_moves(game_state)?
        .iter()
        .copied()
        .find(|mv| move_from(*mv) == from && move_to(*mv) == to && move_promotion_piece(*mv) == promotion)
        .ok_or_else(|| ChessError::IllegalMove {
            notation: text.to_owned(),
            reason: "not a legal move in this position".to_owned(),
        })
}

pub fn move_to_long_algebraic(mv: Move, mark: CheckMark) -> String {
    let from = move_from(mv);
    let to = move_to(mv);

    let mut out = if move_kind(mv) == MoveKind::Castling {
        if file_of(to) > file_of(from) {
            "O-O".to_owned()
        } else {
            "O-O-O".to_owned()
        }
    } else {
        let mut text = String::new();
        if let Some(kind) = move_moved_piece(mv).filter(|kind| *kind != PieceKind::Pawn) {
            text.push(kind.letter());
        }
        text.push_str(&square_to_algebraic(from));
        text.push(if is_capture(mv) { 'x' } else { '-' });
        text.push_str(&square_to_algebraic(to));
        if let Some(promo) = move_promotion_piece(mv) {
            text.push(promo.letter());
        }
        text
    };

    out.push_str(mark.suffix());
    out
}

/// Long algebraic notation with the check suffix worked out by playing the move.
pub fn annotate_long_algebraic(game_state: &mut GameState, mv: Move) -> ChessResult<String> {
    game_state.make_move(mv)?;
    let mark = if !game_state.has_check() {
        Ok(CheckMark::None)
    } else {
        MoveGenerator::new()
            .has_legal_move(game_state)
            .map(|any| if any { CheckMark::Check } else { CheckMark::Mate })
    };
    game_state.undo_move()?;
    Ok(move_to_long_algebraic(mv, mark?))
}

/// Notation for the latest history entry, using its recorded flags.
pub fn last_move_long_algebraic(game_state: &GameState) -> Option<String> {
    let record = game_state.last_move()?;
    let mark = match (record.gives_check, record.terminal) {
        (true, Some(TerminalKind::Checkmate)) => CheckMark::Mate,
        (true, _) => CheckMark::Check,
        _ => CheckMark::None,
    };
    Some(move_to_long_algebraic(record.mv, mark))
}
