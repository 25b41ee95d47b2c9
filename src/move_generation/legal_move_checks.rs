//! Attack detection.
//!
//! A square is attacked when any of the attacker's pawn, knight, king or
//! slider vectors reaches it. Each vector is tested from the target square
//! outward, which is equivalent and needs one table lookup per piece kind.

use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::leaper_attacks::{king_attacks, knight_attacks, pawn_attacks};
use crate::moves::slider_attacks::{bishop_attacks, rook_attacks};

#[inline]
pub fn is_king_in_check(game_state: &GameState, color: Color) -> bool {
    let Some(king_sq) = game_state.king_square(color) else {
        return false;
    };
    is_square_attacked(game_state, king_sq, color.opposite())
}

pub fn is_square_attacked(game_state: &GameState, square: Square, attacker_color: Color) -> bool {
    attackers_to(game_state, square, attacker_color, game_state.occupancy_all) != 0
}

/// Bitboard of `attacker_color` pieces attacking `square` under `occupancy`.
pub fn attackers_to(
    game_state: &GameState,
    square: Square,
    attacker_color: Color,
    occupancy: u64,
) -> u64 {
    let theirs = &game_state.pieces[attacker_color.index()];

    // A pawn of colour C on X attacks S exactly when a pawn of the other colour on S attacks X.
    let pawns = pawn_attacks(attacker_color.opposite(), square) & theirs[PieceKind::Pawn.index()];
    let knights = knight_attacks(square) & theirs[PieceKind::Knight.index()];
    let kings = king_attacks(square) & theirs[PieceKind::King.index()];

    let queens = theirs[PieceKind::Queen.index()];
    let diagonal = bishop_attacks(square, occupancy) & (theirs[PieceKind::Bishop.index()] | queens);
    let straight = rook_attacks(square, occupancy) & (theirs[PieceKind::Rook.index()] | queens);

    pawns | knights | kings | diagonal | straight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_attack_vector_is_detected() {
        // Light: pawn d4, knight b1, rook h5, bishop a8, king e1.
        let game = GameState::from_fen("B3k3/8/8/7R/3P4/8/8/1N2K3 b - - 0 1")
            .expect("FEN should parse");
        let light = Color::Light;
        assert!(is_square_attacked(&game, 36, light)); // e5 by pawn
        assert!(is_square_attacked(&game, 18, light)); // c3 by knight
        assert!(is_square_attacked(&game, 32, light)); // a5 by rook
        assert!(is_square_attacked(&game, 35, light)); // d5 by bishop
        assert!(is_square_attacked(&game, 13, light)); // f2 by king
        assert!(!is_square_attacked(&game, 20, light)); // e3
    }

    #[test]
    fn sliders_are_blocked_by_first_piece() {
        let game = GameState::from_fen("4k3/8/8/8/8/8/8/R2nK3 w - - 0 1").expect("FEN should parse");
        // Rook a1 sees d1 but not e1 behind the knight.
        assert!(is_square_attacked(&game, 3, Color::Light));
        assert!(!is_square_attacked(&game, 4, Color::Light));
        assert!(!is_square_attacked(&game, 4, Color::Dark));
    }

    #[test]
    fn check_follows_king_cache() {
        let game = GameState::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").expect("FEN should parse");
        assert!(is_king_in_check(&game, Color::Light));
        assert!(game.has_check());
        assert!(!is_king_in_check(&game, Color::Dark));
    }
}
