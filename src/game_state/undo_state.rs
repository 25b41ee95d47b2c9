use crate::game_state::chess_types::*;

/// Outcome recorded on a history entry once the generator finds no replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Checkmate,
    Stalemate,
}

/// Single history record for `make_move` / `undo_move`.
///
/// Holds everything needed to restore the position exactly, plus the flags
/// notation and perft read back from the last move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoState {
    pub mv: Move,
    pub moved_piece: PieceKind,
    pub captured_piece: Option<PieceKind>,
    /// Differs from the destination square only for en-passant captures.
    pub captured_square: Square,

    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,
    pub prev_fullmove_number: u16,
    pub prev_zobrist_key: u64,
    pub prev_in_check: bool,

    pub was_en_passant: bool,
    pub was_castling: bool,
    pub gives_check: bool,
    pub terminal: Option<TerminalKind>,
}
