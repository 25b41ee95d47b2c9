//! In-place make/unmake.
//!
//! `make_move_in_place` validates the structural shape of the move before
//! touching the position, so a rejected move leaves the state unchanged.
//! King safety is not checked here; that is the generator's legality probe.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_rules::{castling_lane_for_king_move, CastlingLane, CASTLING_SPOILERS};
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::moves::move_descriptions::{move_from, move_promotion_piece, move_to};
use crate::search::zobrist::{castling_key, en_passant_key_contribution, side_to_move_key};
use crate::utils::long_algebraic::move_to_coordinate;

/// Resolved shape of a move against the current board.
struct MovePlan {
    from: Square,
    to: Square,
    moved_piece: PieceKind,
    placed_piece: PieceKind,
    captured: Option<(PieceKind, Square)>,
    castling: Option<&'static CastlingLane>,
    en_passant: bool,
}

fn illegal(mv: Move, reason: &str) -> ChessError {
    ChessError::IllegalMove {
        notation: move_to_coordinate(mv),
        reason: reason.to_owned(),
    }
}

fn plan_move(game_state: &GameState, mv: Move) -> ChessResult<MovePlan> {
    let from = move_from(mv);
    let to = move_to(mv);
    let side = game_state.side_to_move;

    if from == to {
        return Err(illegal(mv, "source and destination are the same square"));
    }
    let (owner, moved_piece) = game_state
        .piece_at(from)
        .ok_or_else(|| illegal(mv, "no piece on the source square"))?;
    if owner != side {
        return Err(illegal(mv, "piece on the source square belongs to the opponent"));
    }

    let mut captured = match game_state.piece_at(to) {
        Some((color, _)) if color == side => {
            return Err(illegal(mv, "destination holds a piece of the moving side"))
        }
        Some((_, PieceKind::King)) => return Err(illegal(mv, "kings cannot be captured")),
        Some((_, kind)) => Some((kind, to)),
        None => None,
    };

    let mut en_passant = false;
    let mut castling = None;
    let promotion = move_promotion_piece(mv);
    let last_rank = match side {
        Color::Light => 7,
        Color::Dark => 0,
    };

    match moved_piece {
        PieceKind::Pawn => {
            if file_of(from) != file_of(to)
                && captured.is_none()
                && game_state.en_passant_square == Some(to)
            {
                let victim_square = (to as i8 - side.pawn_push()) as Square;
                match game_state.piece_at(victim_square) {
                    Some((color, PieceKind::Pawn)) if color != side => {
                        captured = Some((PieceKind::Pawn, victim_square));
                        en_passant = true;
                    }
                    _ => return Err(illegal(mv, "no pawn to capture en passant")),
                }
            }
            let promotes = rank_of(to) == last_rank;
            match promotion {
                Some(PieceKind::Pawn) | Some(PieceKind::King) => {
                    return Err(illegal(mv, "invalid promotion piece"))
                }
                Some(_) if !promotes => {
                    return Err(illegal(mv, "promotion away from the last rank"))
                }
                None if promotes => return Err(illegal(mv, "pawn on the last rank must promote")),
                _ => {}
            }
        }
        PieceKind::King if from.abs_diff(to) == 2 => {
            let lane = castling_lane_for_king_move(from, to)
                .filter(|lane| lane.color == side)
                .ok_or_else(|| illegal(mv, "king moves two squares off its castling lane"))?;
            if game_state.castling_rights & lane.right == 0 {
                return Err(illegal(mv, "castling right already lost"));
            }
            if game_state.piece_at(lane.rook_from) != Some((side, PieceKind::Rook)) {
                return Err(illegal(mv, "castling rook is missing"));
            }
            castling = Some(lane);
        }
        _ => {}
    }
    if moved_piece != PieceKind::Pawn && promotion.is_some() {
        return Err(illegal(mv, "only pawns promote"));
    }

    Ok(MovePlan {
        from,
        to,
        moved_piece,
        placed_piece: promotion.unwrap_or(moved_piece),
        captured,
        castling,
        en_passant,
    })
}

/// Apply `mv` to `game_state`, pushing an undo record.
pub fn make_move_in_place(game_state: &mut GameState, mv: Move) -> ChessResult<()> {
    let plan = plan_move(game_state, mv)?;
    let side = game_state.side_to_move;

    let mut undo = UndoState {
        mv,
        moved_piece: plan.moved_piece,
        captured_piece: plan.captured.map(|(kind, _)| kind),
        captured_square: plan.captured.map_or(plan.to, |(_, square)| square),
        prev_castling_rights: game_state.castling_rights,
        prev_en_passant_square: game_state.en_passant_square,
        prev_halfmove_clock: game_state.halfmove_clock,
        prev_fullmove_number: game_state.fullmove_number,
        prev_zobrist_key: game_state.zobrist_key,
        prev_in_check: game_state.in_check,
        was_en_passant: plan.en_passant,
        was_castling: plan.castling.is_some(),
        gives_check: false,
        terminal: None,
    };

    // En passant is valid for one reply only.
    game_state.zobrist_key ^= en_passant_key_contribution(game_state);
    game_state.en_passant_square = None;

    if let Some((_, square)) = plan.captured {
        game_state.remove_piece(square);
    }

    if let Some(lane) = plan.castling {
        if let Some(rook) = game_state.remove_piece(lane.rook_from) {
            game_state.put_piece(lane.rook_to, rook);
        }
    }

    game_state.remove_piece(plan.from);
    game_state.put_piece(plan.to, (side, plan.placed_piece));

    let old_rights = game_state.castling_rights;
    let new_rights =
        old_rights & !CASTLING_SPOILERS[plan.from as usize] & !CASTLING_SPOILERS[plan.to as usize];
    if new_rights != old_rights {
        game_state.zobrist_key ^= castling_key(old_rights) ^ castling_key(new_rights);
        game_state.castling_rights = new_rights;
    }

    if plan.moved_piece == PieceKind::Pawn || plan.captured.is_some() {
        game_state.halfmove_clock = 0;
    } else {
        game_state.halfmove_clock = game_state.halfmove_clock.saturating_add(1);
    }
    if side == Color::Dark {
        game_state.fullmove_number = game_state.fullmove_number.saturating_add(1);
    }

    game_state.side_to_move = side.opposite();
    game_state.zobrist_key ^= side_to_move_key();

    if plan.moved_piece == PieceKind::Pawn && plan.from.abs_diff(plan.to) == 16 {
        game_state.en_passant_square = Some((plan.from + plan.to) / 2);
        game_state.zobrist_key ^= en_passant_key_contribution(game_state);
    }

    game_state.in_check = is_king_in_check(game_state, game_state.side_to_move);
    undo.gives_check = game_state.in_check;

    game_state.repetition_history.push(game_state.zobrist_key);
    game_state.undo_stack.push(undo);
    Ok(())
}

/// Revert the most recent move and return it.
pub fn unmake_move_in_place(game_state: &mut GameState) -> ChessResult<Move> {
    let undo = game_state.undo_stack.pop().ok_or(ChessError::EmptyHistory)?;
    game_state.repetition_history.pop();

    let mover = game_state.side_to_move.opposite();
    let from = move_from(undo.mv);
    let to = move_to(undo.mv);

    game_state.remove_piece(to);
    game_state.put_piece(from, (mover, undo.moved_piece));

    if let Some(captured) = undo.captured_piece {
        game_state.put_piece(undo.captured_square, (mover.opposite(), captured));
    }

    if undo.was_castling {
        if let Some(lane) = castling_lane_for_king_move(from, to) {
            if let Some(rook) = game_state.remove_piece(lane.rook_to) {
                game_state.put_piece(lane.rook_from, rook);
            }
        }
    }

    game_state.side_to_move = mover;
    game_state.castling_rights = undo.prev_castling_rights;
    game_state.en_passant_square = undo.prev_en_passant_square;
    game_state.halfmove_clock = undo.prev_halfmove_clock;
    game_state.fullmove_number = undo.prev_fullmove_number;
    game_state.in_check = undo.prev_in_check;
    game_state.zobrist_key = undo.prev_zobrist_key;

    Ok(undo.mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::legal_move_generator::MoveGenerator;
    use crate::moves::move_list::MoveList;
    use crate::search::zobrist::compute_zobrist_key;
    use crate::utils::long_algebraic::parse_coordinate_move;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn play(game: &mut GameState, lan: &str) {
        let mv = parse_coordinate_move(lan, game).expect("move should parse");
        game.make_move(mv).expect("move should apply");
    }

    #[test]
    fn en_passant_capture_and_restore() {
        let mut game = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1")
            .expect("FEN should parse");
        let before = game.clone();
        play(&mut game, "e5d6");

        assert_eq!(game.piece_at(43), Some((Color::Light, PieceKind::Pawn)));
        assert_eq!(game.piece_at(35), None);
        let record = game.last_move().expect("history entry");
        assert!(record.was_en_passant);
        assert_eq!(record.captured_square, 35);

        game.undo_move().expect("undo should succeed");
        assert_eq!(game, before);
        assert_eq!(game.piece_at(35), Some((Color::Dark, PieceKind::Pawn)));
    }

    #[test]
    fn castling_moves_rook_and_revokes_rights() {
        let mut game = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .expect("FEN should parse");
        let before = game.clone();
        play(&mut game, "e1g1");

        assert_eq!(game.piece_at(6), Some((Color::Light, PieceKind::King)));
        assert_eq!(game.piece_at(5), Some((Color::Light, PieceKind::Rook)));
        assert_eq!(game.piece_at(7), None);
        assert_eq!(game.castling_rights, CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);
        assert_eq!(game.zobrist_key, compute_zobrist_key(&game));

        game.undo_move().expect("undo should succeed");
        assert_eq!(game, before);
    }

    #[test]
    fn capturing_home_rook_removes_that_right() {
        let mut game = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .expect("FEN should parse");
        play(&mut game, "a1a8");
        assert_eq!(game.castling_rights, CASTLE_LIGHT_KINGSIDE | CASTLE_DARK_KINGSIDE);
        assert_eq!(game.halfmove_clock, 0);
    }

    #[test]
    fn promotion_replaces_pawn_and_undo_restores_it() {
        let mut game = GameState::from_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 3 40")
            .expect("FEN should parse");
        let before = game.clone();
        play(&mut game, "a7b8q");
        assert_eq!(game.piece_at(57), Some((Color::Light, PieceKind::Queen)));
        assert_eq!(game.halfmove_clock, 0);
        assert!(game.has_check());

        game.undo_move().expect("undo should succeed");
        assert_eq!(game, before);
    }

    #[test]
    fn halfmove_clock_is_restored_not_recomputed() {
        let mut game = GameState::from_fen("4k3/8/8/8/8/8/3p4/4K2R w K - 17 30")
            .expect("FEN should parse");
        play(&mut game, "e1d2");
        assert_eq!(game.halfmove_clock, 0);
        game.undo_move().expect("undo should succeed");
        assert_eq!(game.halfmove_clock, 17);
        assert_eq!(game.get_fen(), "4k3/8/8/8/8/8/3p4/4K2R w K - 17 30");
    }

    #[test]
    fn structurally_invalid_moves_leave_state_untouched() {
        let mut game = GameState::new_game();
        let before = game.clone();
        let mut generator = MoveGenerator::new();
        let mut dark_moves = MoveList::new();
        let mut dark_to_move = game.clone();
        dark_to_move.side_to_move = Color::Dark;
        generator.generate_pseudo_legal(&dark_to_move, &mut dark_moves);
        let dark_move = dark_moves[0];

        assert!(matches!(
            game.make_move(dark_move),
            Err(ChessError::IllegalMove { .. })
        ));
        assert_eq!(game, before);
        assert!(matches!(game.undo_move(), Err(ChessError::EmptyHistory)));
    }

    #[test]
    fn random_playouts_round_trip_exactly() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut generator = MoveGenerator::new();
        let mut legal = MoveList::new();

        for _ in 0..20 {
            let mut game = GameState::new_game();
            let mut snapshots = vec![game.clone()];
            for _ in 0..60 {
                generator
                    .generate_legal(&mut game, &mut legal)
                    .expect("generation should succeed");
                if legal.is_empty() {
                    break;
                }
                let mv = legal[rng.random_range(0..legal.len())];
                game.make_move(mv).expect("legal move should apply");
                assert_eq!(game.zobrist_key, compute_zobrist_key(&game));
                snapshots.push(game.clone());
            }
            snapshots.pop();
            while let Some(expected) = snapshots.pop() {
                game.undo_move().expect("undo should succeed");
                assert_eq!(game, expected);
            }
        }
    }
}
