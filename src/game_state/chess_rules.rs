//! Canonical chess-rule constants and rule predicates.
//!
//! Holds the standard starting FEN, castling geometry, the castling-rights
//! spoiler table, and the draw rules that do not need move generation.

use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Plies without capture or pawn move after which the game is drawn.
pub const FIFTY_MOVE_HALFMOVES: u16 = 100;

/// Fixed squares involved in one castling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingLane {
    pub color: Color,
    pub right: CastlingRights,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// Squares between king and rook that must be empty.
    pub must_be_empty: u64,
    /// Square the king crosses; it must not be attacked.
    pub king_passes: Square,
}

pub const CASTLING_LANES: [CastlingLane; 4] = [
    CastlingLane {
        color: Color::Light,
        right: CASTLE_LIGHT_KINGSIDE,
        king_from: 4,
        king_to: 6,
        rook_from: 7,
        rook_to: 5,
        must_be_empty: (1 << 5) | (1 << 6),
        king_passes: 5,
    },
    CastlingLane {
        color: Color::Light,
        right: CASTLE_LIGHT_QUEENSIDE,
        king_from: 4,
        king_to: 2,
        rook_from: 0,
        rook_to: 3,
        must_be_empty: (1 << 1) | (1 << 2) | (1 << 3),
        king_passes: 3,
    },
    CastlingLane {
        color: Color::Dark,
        right: CASTLE_DARK_KINGSIDE,
        king_from: 60,
        king_to: 62,
        rook_from: 63,
        rook_to: 61,
        must_be_empty: (1 << 61) | (1 << 62),
        king_passes: 61,
    },
    CastlingLane {
        color: Color::Dark,
        right: CASTLE_DARK_QUEENSIDE,
        king_from: 60,
        king_to: 58,
        rook_from: 56,
        rook_to: 59,
        must_be_empty: (1 << 57) | (1 << 58) | (1 << 59),
        king_passes: 59,
    },
];

/// Lane whose king move is `from -> to`, if any.
#[inline]
pub fn castling_lane_for_king_move(from: Square, to: Square) -> Option<&'static CastlingLane> {
    CASTLING_LANES
        .iter()
        .find(|lane| lane.king_from == from && lane.king_to == to)
}

/// Rights lost when a piece leaves or arrives on each square.
///
/// Applying `rights &= !CASTLING_SPOILERS[from] & !CASTLING_SPOILERS[to]` on
/// every move covers king moves, rook moves, and rooks captured at home.
pub const CASTLING_SPOILERS: [CastlingRights; 64] = build_castling_spoilers();

const fn build_castling_spoilers() -> [CastlingRights; 64] {
    let mut table = [0; 64];
    table[0] = CASTLE_LIGHT_QUEENSIDE;
    table[4] = CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE;
    table[7] = CASTLE_LIGHT_KINGSIDE;
    table[56] = CASTLE_DARK_QUEENSIDE;
    table[60] = CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE;
    table[63] = CASTLE_DARK_KINGSIDE;
    table
}

const LIGHT_SQUARES: u64 = 0x55AA_55AA_55AA_55AA;

/// True when neither side can possibly deliver mate.
///
/// Covers K v K, K+minor v K and K+B v K+B with bishops on one square colour.
pub fn is_insufficient_material(game_state: &GameState) -> bool {
    let heavy_or_pawn = |color: Color| {
        let p = &game_state.pieces[color.index()];
        p[PieceKind::Pawn.index()] | p[PieceKind::Rook.index()] | p[PieceKind::Queen.index()]
    };
    if heavy_or_pawn(Color::Light) | heavy_or_pawn(Color::Dark) != 0 {
        return false;
    }

    let knights = game_state.pieces[0][PieceKind::Knight.index()]
        | game_state.pieces[1][PieceKind::Knight.index()];
    let light_bishops = game_state.pieces[0][PieceKind::Bishop.index()];
    let dark_bishops = game_state.pieces[1][PieceKind::Bishop.index()];
    let bishops = light_bishops | dark_bishops;
    let minors = knights.count_ones() + bishops.count_ones();

    if minors <= 1 {
        return true;
    }

    // Only bishops left, one per side, on the same square colour.
    knights == 0
        && light_bishops.count_ones() == 1
        && dark_bishops.count_ones() == 1
        && ((bishops & LIGHT_SQUARES) == 0 || (bishops & !LIGHT_SQUARES) == 0)
}
