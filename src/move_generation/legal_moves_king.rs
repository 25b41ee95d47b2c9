use crate::game_state::chess_rules::CASTLING_LANES;
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_checks::is_square_attacked;
use crate::move_generation::legal_move_shared::push_targets;
use crate::moves::leaper_attacks::king_attacks;
use crate::moves::move_descriptions::{pack_move_description, FLAG_CASTLING};
use crate::moves::move_list::MoveList;

pub fn generate_king_moves(
    game_state: &GameState,
    target_mask: u64,
    include_castling: bool,
    out: &mut MoveList,
) {
    let side = game_state.side_to_move;
    let Some(from) = game_state.king_square(side) else {
        return;
    };

    push_targets(game_state, from, PieceKind::King, king_attacks(from) & target_mask, out);

    if include_castling {
        generate_castling_moves(game_state, from, out);
    }
}

/// Castling needs the right, an empty path, the rook at home, and the king's
/// start and transit squares free of attack. The destination is left to the
/// legality filter.
fn generate_castling_moves(game_state: &GameState, king_from: Square, out: &mut MoveList) {
    let side = game_state.side_to_move;
    if game_state.in_check || game_state.castling_rights & castling_rights_of(side) == 0 {
        return;
    }

    let enemy = side.opposite();
    for lane in CASTLING_LANES.iter().filter(|lane| lane.color == side) {
        if lane.king_from != king_from
            || game_state.castling_rights & lane.right == 0
            || game_state.occupancy_all & lane.must_be_empty != 0
            || game_state.piece_at(lane.rook_from) != Some((side, PieceKind::Rook))
            || is_square_attacked(game_state, lane.king_passes, enemy)
        {
            continue;
        }
        out.push(pack_move_description(
            lane.king_from,
            lane.king_to,
            PieceKind::King,
            None,
            None,
            FLAG_CASTLING,
        ));
    }
}
