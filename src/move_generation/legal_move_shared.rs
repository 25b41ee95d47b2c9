use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::move_descriptions::{pack_move_description, FLAG_CAPTURE};
use crate::moves::move_list::MoveList;

/// Kind of the opponent piece on `square`, if any.
#[inline]
pub fn enemy_piece_on(game_state: &GameState, square: Square) -> Option<PieceKind> {
    match game_state.piece_at(square) {
        Some((color, kind)) if color != game_state.side_to_move => Some(kind),
        _ => None,
    }
}

/// Push one move per target bit, flagging captures from the mailbox.
///
/// `targets` must already exclude squares held by the moving side.
#[inline]
pub fn push_targets(
    game_state: &GameState,
    from: Square,
    moved_piece: PieceKind,
    mut targets: u64,
    out: &mut MoveList,
) {
    while targets != 0 {
        let to = targets.trailing_zeros() as Square;
        let captured = enemy_piece_on(game_state, to);
        let flags = if captured.is_some() { FLAG_CAPTURE } else { 0 };
        out.push(pack_move_description(from, to, moved_piece, captured, None, flags));
        targets &= targets - 1;
    }
}
