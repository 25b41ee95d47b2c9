//! Knight and slider pseudo-legal moves.

use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_shared::push_targets;
use crate::moves::leaper_attacks::knight_attacks;
use crate::moves::move_list::MoveList;
use crate::moves::slider_attacks::{bishop_attacks, queen_attacks, rook_attacks};

pub fn generate_knight_moves(game_state: &GameState, target_mask: u64, out: &mut MoveList) {
    let side = game_state.side_to_move;
    let mut knights = game_state.pieces[side.index()][PieceKind::Knight.index()];
    while knights != 0 {
        let from = knights.trailing_zeros() as Square;
        push_targets(game_state, from, PieceKind::Knight, knight_attacks(from) & target_mask, out);
        knights &= knights - 1;
    }
}

/// Bishops, rooks and queens. Rays end at the first occupied square.
pub fn generate_slider_moves(game_state: &GameState, target_mask: u64, out: &mut MoveList) {
    let side = game_state.side_to_move;
    let occupancy = game_state.occupancy_all;

    for kind in [PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen] {
        let mut sliders = game_state.pieces[side.index()][kind.index()];
        while sliders != 0 {
            let from = sliders.trailing_zeros() as Square;
            let attacks = match kind {
                PieceKind::Bishop => bishop_attacks(from, occupancy),
                PieceKind::Rook => rook_attacks(from, occupancy),
                _ => queen_attacks(from, occupancy),
            };
            push_targets(game_state, from, kind, attacks & target_mask, out);
            sliders &= sliders - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_knights_have_four_moves() {
        let game = GameState::new_game();
        let mut out = MoveList::new();
        let not_own = !game.occupancy_by_color[Color::Light.index()];
        generate_knight_moves(&game, not_own, &mut out);
        assert_eq!(out.len(), 4);
        generate_slider_moves(&game, not_own, &mut out);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn queen_rays_skip_own_king() {
        let game = GameState::from_fen("8/7k/8/8/3Q4/8/8/K7 w - - 0 1").expect("FEN should parse");
        let mut out = MoveList::new();
        let not_own = !game.occupancy_by_color[Color::Light.index()];
        generate_slider_moves(&game, not_own, &mut out);
        // a1 holds the own king and is excluded.
        assert_eq!(out.len(), 26);
    }
}
