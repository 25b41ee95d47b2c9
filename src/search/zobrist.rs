//! Zobrist hashing for position identity, repetition tracking and the
//! transposition table.
//!
//! Keys come from a seeded `StdRng`, so hashes are identical across runs.
//! The en-passant file only enters the key when the side to move has a pawn
//! that could capture onto the target square; positions that differ only by
//! an unusable en-passant square therefore share one key.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::leaper_attacks::pawn_attacks;

const ZOBRIST_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for color in &mut piece_square {
        for piece in color {
            for sq in piece {
                *sq = rng.random();
            }
        }
    }

    let side_to_move = rng.random();

    // Castling keys are per right, combined by xor for any mask.
    let single_rights: [u64; 4] = [rng.random(), rng.random(), rng.random(), rng.random()];
    let mut castling = [0u64; 16];
    for (mask, key) in castling.iter_mut().enumerate() {
        *key = single_rights
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << *bit) != 0)
            .fold(0, |acc, (_, k)| acc ^ k);
    }

    let mut en_passant_file = [0u64; 8];
    for key in &mut en_passant_file {
        *key = rng.random();
    }

    ZobristTables {
        piece_square,
        side_to_move,
        castling,
        en_passant_file,
    }
}

#[inline]
pub fn piece_square_key(color: Color, piece: PieceKind, square: Square) -> u64 {
    tables().piece_square[color.index()][piece.index()][square as usize]
}

#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    tables().castling[(castling_rights & CASTLE_ALL) as usize]
}

#[inline]
pub fn en_passant_file_key(file: u8) -> u64 {
    tables().en_passant_file[file as usize]
}

/// Xored in while dark is to move.
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// True when the side to move has a pawn able to capture onto the en-passant target.
#[inline]
pub fn en_passant_is_capturable(game_state: &GameState) -> bool {
    let Some(ep_square) = game_state.en_passant_square else {
        return false;
    };
    let side = game_state.side_to_move;
    let capturers = pawn_attacks(side.opposite(), ep_square);
    capturers & game_state.pieces[side.index()][PieceKind::Pawn.index()] != 0
}

/// En-passant term currently contained in the key (zero when not capturable).
#[inline]
pub fn en_passant_key_contribution(game_state: &GameState) -> u64 {
    match game_state.en_passant_square {
        Some(ep_square) if en_passant_is_capturable(game_state) => {
            en_passant_file_key(file_of(ep_square))
        }
        _ => 0,
    }
}

/// Full key from scratch. Make/undo maintain the same value incrementally.
pub fn compute_zobrist_key(game_state: &GameState) -> u64 {
    let mut key = 0u64;

    for (square, cell) in game_state.mailbox.iter().enumerate() {
        if let Some((color, piece)) = cell {
            key ^= piece_square_key(*color, *piece, square as Square);
        }
    }

    if game_state.side_to_move == Color::Dark {
        key ^= side_to_move_key();
    }

    key ^= castling_key(game_state.castling_rights);
    key ^= en_passant_key_contribution(game_state);

    key
}
