//! Packed move encoding.
//!
//! Layout (low to high bits): from (6), to (6), moved piece (3), captured
//! piece (3), promotion piece (3), then one bit per special flag. A move is a
//! plain `u64` value: copyable, allocation-free, and safe to store in tables.

use crate::game_state::chess_types::{Move, PieceKind, Square};

const FROM_SHIFT: u64 = 0;
const TO_SHIFT: u64 = 6;
const MOVED_PIECE_SHIFT: u64 = 12;
const CAPTURED_PIECE_SHIFT: u64 = 15;
const PROMOTION_PIECE_SHIFT: u64 = 18;

const SQUARE_MASK: u64 = 0x3F;
const PIECE_MASK: u64 = 0x7;
pub const NO_PIECE_CODE: u64 = 0x7;

pub const FLAG_CAPTURE: u64 = 1u64 << 21;
pub const FLAG_DOUBLE_PAWN_PUSH: u64 = 1u64 << 22;
pub const FLAG_EN_PASSANT: u64 = 1u64 << 23;
pub const FLAG_CASTLING: u64 = 1u64 << 24;

/// Move category, derived from the flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Normal,
    DoublePawnPush,
    EnPassant,
    Castling,
    Promotion,
}

#[inline]
pub fn pack_move_description(
    from: Square,
    to: Square,
    moved_piece: PieceKind,
    captured_piece: Option<PieceKind>,
    promotion_piece: Option<PieceKind>,
    flags: u64,
) -> Move {
    let mut out = 0u64;
    out |= (from as u64) << FROM_SHIFT;
    out |= (to as u64) << TO_SHIFT;
    out |= piece_kind_to_code(moved_piece) << MOVED_PIECE_SHIFT;
    out |= captured_piece.map_or(NO_PIECE_CODE, piece_kind_to_code) << CAPTURED_PIECE_SHIFT;
    out |= promotion_piece.map_or(NO_PIECE_CODE, piece_kind_to_code) << PROMOTION_PIECE_SHIFT;
    out |= flags;
    out
}

#[inline]
pub fn move_from(mv: Move) -> Square {
    ((mv >> FROM_SHIFT) & SQUARE_MASK) as Square
}

#[inline]
pub fn move_to(mv: Move) -> Square {
    ((mv >> TO_SHIFT) & SQUARE_MASK) as Square
}

#[inline]
pub fn move_moved_piece(mv: Move) -> Option<PieceKind> {
    piece_kind_from_code((mv >> MOVED_PIECE_SHIFT) & PIECE_MASK)
}

#[inline]
pub fn move_captured_piece(mv: Move) -> Option<PieceKind> {
    piece_kind_from_code((mv >> CAPTURED_PIECE_SHIFT) & PIECE_MASK)
}

#[inline]
pub fn move_promotion_piece(mv: Move) -> Option<PieceKind> {
    piece_kind_from_code((mv >> PROMOTION_PIECE_SHIFT) & PIECE_MASK)
}

#[inline]
pub fn is_capture(mv: Move) -> bool {
    mv & FLAG_CAPTURE != 0
}

#[inline]
pub fn is_promotion(mv: Move) -> bool {
    (mv >> PROMOTION_PIECE_SHIFT) & PIECE_MASK != NO_PIECE_CODE
}

/// Captures and promotions: the moves quiescence search looks at.
#[inline]
pub fn is_tactical(mv: Move) -> bool {
    is_capture(mv) || is_promotion(mv)
}

pub fn move_kind(mv: Move) -> MoveKind {
    if mv & FLAG_CASTLING != 0 {
        MoveKind::Castling
    } else if mv & FLAG_EN_PASSANT != 0 {
        MoveKind::EnPassant
    } else if mv & FLAG_DOUBLE_PAWN_PUSH != 0 {
        MoveKind::DoublePawnPush
    } else if is_promotion(mv) {
        MoveKind::Promotion
    } else {
        MoveKind::Normal
    }
}

#[inline]
pub fn piece_kind_to_code(piece_kind: PieceKind) -> u64 {
    piece_kind.index() as u64
}

#[inline]
pub fn piece_kind_from_code(code: u64) -> Option<PieceKind> {
    match code {
        0 => Some(PieceKind::Pawn),
        1 => Some(PieceKind::Knight),
        2 => Some(PieceKind::Bishop),
        3 => Some(PieceKind::Rook),
        4 => Some(PieceKind::Queen),
        5 => Some(PieceKind::King),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_capture_keeps_every_field() {
        let mv = pack_move_description(
            52,
            61,
            PieceKind::Pawn,
            Some(PieceKind::Rook),
            Some(PieceKind::Knight),
            FLAG_CAPTURE,
        );
        assert_eq!(move_from(mv), 52);
        assert_eq!(move_to(mv), 61);
        assert_eq!(move_moved_piece(mv), Some(PieceKind::Pawn));
        assert_eq!(move_captured_piece(mv), Some(PieceKind::Rook));
        assert_eq!(move_promotion_piece(mv), Some(PieceKind::Knight));
        assert_eq!(move_kind(mv), MoveKind::Promotion);
        assert!(is_tactical(mv));
    }

    #[test]
    fn quiet_move_has_no_optional_pieces() {
        let mv = pack_move_description(6, 21, PieceKind::Knight, None, None, 0);
        assert_eq!(move_captured_piece(mv), None);
        assert_eq!(move_promotion_piece(mv), None);
        assert_eq!(move_kind(mv), MoveKind::Normal);
        assert!(!is_tactical(mv));
    }

    #[test]
    fn special_flags_map_to_kinds() {
        let castle = pack_move_description(4, 6, PieceKind::King, None, None, FLAG_CASTLING);
        let push = pack_move_description(12, 28, PieceKind::Pawn, None, None, FLAG_DOUBLE_PAWN_PUSH);
        let ep = pack_move_description(
            36,
            43,
            PieceKind::Pawn,
            Some(PieceKind::Pawn),
            None,
            FLAG_CAPTURE | FLAG_EN_PASSANT,
        );
        assert_eq!(move_kind(castle), MoveKind::Castling);
        assert_eq!(move_kind(push), MoveKind::DoublePawnPush);
        assert_eq!(move_kind(ep), MoveKind::EnPassant);
    }
}
