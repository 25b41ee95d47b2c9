use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_shared::enemy_piece_on;
use crate::moves::leaper_attacks::pawn_attacks;
use crate::moves::move_descriptions::{
    pack_move_description, FLAG_CAPTURE, FLAG_DOUBLE_PAWN_PUSH, FLAG_EN_PASSANT,
};
use crate::moves::move_list::MoveList;

/// Pawn pushes, captures, en passant and promotions.
///
/// With `include_quiet == false` only captures and promotions are produced.
/// `capture_mask` restricts which enemy squares may be taken.
pub fn generate_pawn_moves(
    game_state: &GameState,
    capture_mask: u64,
    include_quiet: bool,
    out: &mut MoveList,
) {
    let side = game_state.side_to_move;
    let empty = !game_state.occupancy_all;
    let enemies = game_state.occupancy_by_color[side.opposite().index()] & capture_mask;
    let (start_rank, promotion_rank) = match side {
        Color::Light => (1, 7),
        Color::Dark => (6, 0),
    };

    let mut pawns = game_state.pieces[side.index()][PieceKind::Pawn.index()];
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;

        let one_step = (from as i8 + side.pawn_push()) as Square;
        if empty & square_mask(one_step) != 0 {
            if rank_of(one_step) == promotion_rank {
                push_promotions(from, one_step, None, 0, out);
            } else if include_quiet {
                out.push(pack_move_description(from, one_step, PieceKind::Pawn, None, None, 0));
                let two_step = (one_step as i8 + side.pawn_push()) as Square;
                if rank_of(from) == start_rank && empty & square_mask(two_step) != 0 {
                    out.push(pack_move_description(
                        from,
                        two_step,
                        PieceKind::Pawn,
                        None,
                        None,
                        FLAG_DOUBLE_PAWN_PUSH,
                    ));
                }
            }
        }

        let attacks = pawn_attacks(side, from);
        let mut captures = attacks & enemies;
        while captures != 0 {
            let to = captures.trailing_zeros() as Square;
            captures &= captures - 1;
            let captured = enemy_piece_on(game_state, to);
            if rank_of(to) == promotion_rank {
                push_promotions(from, to, captured, FLAG_CAPTURE, out);
            } else {
                out.push(pack_move_description(from, to, PieceKind::Pawn, captured, None, FLAG_CAPTURE));
            }
        }

        if let Some(ep_square) = game_state.en_passant_square {
            if attacks & square_mask(ep_square) != 0 {
                out.push(pack_move_description(
                    from,
                    ep_square,
                    PieceKind::Pawn,
                    Some(PieceKind::Pawn),
                    None,
                    FLAG_CAPTURE | FLAG_EN_PASSANT,
                ));
            }
        }
    }
}

fn push_promotions(
    from: Square,
    to: Square,
    captured: Option<PieceKind>,
    flags: u64,
    out: &mut MoveList,
) {
    for promo in PROMOTION_PIECES {
        out.push(pack_move_description(from, to, PieceKind::Pawn, captured, Some(promo), flags));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::move_descriptions::{move_kind, MoveKind};

    #[test]
    fn starting_pawns_push_once_and_twice() {
        let game = GameState::new_game();
        let mut out = MoveList::new();
        generate_pawn_moves(&game, u64::MAX, true, &mut out);
        assert_eq!(out.len(), 16);
        let doubles = out
            .iter()
            .filter(|mv| move_kind(**mv) == MoveKind::DoublePawnPush)
            .count();
        assert_eq!(doubles, 8);
    }

    #[test]
    fn tactical_mode_keeps_captures_and_promotions() {
        let game = GameState::from_fen("3rk3/2P5/8/3pP3/8/8/8/4K3 w - d6 0 1")
            .expect("FEN should parse");
        let mut out = MoveList::new();
        generate_pawn_moves(&game, u64::MAX, false, &mut out);
        // c7-c8 and c7xd8 with four pieces each, plus e5xd6 en passant.
        assert_eq!(out.len(), 9);
        assert_eq!(
            out.iter().filter(|mv| move_kind(**mv) == MoveKind::EnPassant).count(),
            1
        );

        out.clear();
        generate_pawn_moves(&game, u64::MAX, true, &mut out);
        // Adds the quiet e5-e6 push.
        assert_eq!(out.len(), 10);
    }
}
