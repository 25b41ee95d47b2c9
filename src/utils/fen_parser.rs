//! FEN-to-GameState parser.
//!
//! Builds a fresh `GameState` (mailbox, bitboards, rights, clocks, key) from
//! a Forsyth-Edwards Notation string and validates it before handing it out.
//! Every failure names the offending field.

use crate::errors::{ChessResult, FenError};
use crate::game_state::chess_rules::CASTLING_LANES;
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::search::zobrist::compute_zobrist_key;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> ChessResult<GameState> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let [board, side, castling, en_passant, halfmove, fullmove] = fields[..] else {
        return Err(FenError::FieldCount(fields.len()).into());
    };

    let mut game_state = GameState::new_empty();
    parse_board(board, &mut game_state)?;
    validate_kings(&game_state)?;

    game_state.side_to_move = parse_side_to_move(side)?;
    game_state.castling_rights = parse_castling_rights(castling, &game_state)?;
    game_state.en_passant_square = parse_en_passant_square(en_passant, &game_state)?;
    game_state.halfmove_clock = halfmove
        .parse::<u16>()
        .map_err(|_| FenError::HalfmoveClock(format!("'{halfmove}' is not a non-negative integer")))?;
    game_state.fullmove_number = fullmove
        .parse::<u16>()
        .map_err(|_| FenError::FullmoveNumber(format!("'{fullmove}' is not a non-negative integer")))?
        .max(1);

    if is_king_in_check(&game_state, game_state.side_to_move.opposite()) {
        return Err(FenError::Kings("the side not to move is in check".to_owned()).into());
    }

    game_state.in_check = is_king_in_check(&game_state, game_state.side_to_move);
    game_state.zobrist_key = compute_zobrist_key(&game_state);
    game_state.repetition_history.push(game_state.zobrist_key);

    Ok(game_state)
}

fn parse_board(board: &str, game_state: &mut GameState) -> Result<(), FenError> {
    let ranks: Vec<&str> = board.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::Placement(format!("expected 8 ranks, found {}", ranks.len())));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(FenError::Placement(format!("invalid empty-square count '{ch}'")));
                }
                file += empty_count as u8;
                if file > 8 {
                    break;
                }
                continue;
            }

            let piece = piece_from_fen_char(ch)
                .ok_or_else(|| FenError::Placement(format!("invalid piece character '{ch}'")))?;
            if file >= 8 {
                file += 1;
                break;
            }
            if piece.1 == PieceKind::Pawn && (rank == 0 || rank == 7) {
                return Err(FenError::Placement(format!(
                    "pawn on back rank {}",
                    rank + 1
                )));
            }

            game_state.put_piece(square_at(file, rank), piece);
            file += 1;
        }

        if file != 8 {
            return Err(FenError::Placement(format!(
                "rank {} does not describe exactly 8 files",
                rank + 1
            )));
        }
    }

    Ok(())
}

fn validate_kings(game_state: &GameState) -> Result<(), FenError> {
    for color in [Color::Light, Color::Dark] {
        let kings = game_state.pieces[color.index()][PieceKind::King.index()].count_ones();
        if kings != 1 {
            return Err(FenError::Kings(format!("{color:?} has {kings} kings, expected 1")));
        }
    }
    Ok(())
}

fn parse_side_to_move(side: &str) -> Result<Color, FenError> {
    match side {
        "w" => Ok(Color::Light),
        "b" => Ok(Color::Dark),
        _ => Err(FenError::SideToMove(format!("expected 'w' or 'b', found '{side}'"))),
    }
}

/// Rights are only accepted when the king and the matching rook stand on
/// their original squares.
fn parse_castling_rights(castling: &str, game_state: &GameState) -> Result<CastlingRights, FenError> {
    if castling == "-" {
        return Ok(0);
    }
    if castling.is_empty() {
        return Err(FenError::Castling("empty field".to_owned()));
    }

    let mut rights: CastlingRights = 0;
    for ch in castling.chars() {
        let right = match ch {
            'K' => CASTLE_LIGHT_KINGSIDE,
            'Q' => CASTLE_LIGHT_QUEENSIDE,
            'k' => CASTLE_DARK_KINGSIDE,
            'q' => CASTLE_DARK_QUEENSIDE,
            _ => return Err(FenError::Castling(format!("unexpected character '{ch}'"))),
        };
        if rights & right != 0 {
            return Err(FenError::Castling(format!("duplicate right '{ch}'")));
        }

        let Some(lane) = CASTLING_LANES.iter().find(|lane| lane.right == right) else {
            return Err(FenError::Castling(format!("unknown right '{ch}'")));
        };
        if game_state.piece_at(lane.king_from) != Some((lane.color, PieceKind::King))
            || game_state.piece_at(lane.rook_from) != Some((lane.color, PieceKind::Rook))
        {
            return Err(FenError::Castling(format!(
                "right '{ch}' needs king and rook on their original squares"
            )));
        }
        rights |= right;
    }

    Ok(rights)
}

/// The target must sit behind a pawn that just made a double push.
fn parse_en_passant_square(en_passant: &str, game_state: &GameState) -> Result<Option<Square>, FenError> {
    if en_passant == "-" {
        return Ok(None);
    }

    let square = algebraic_to_square(en_passant)
        .map_err(|_| FenError::EnPassant(format!("'{en_passant}' is not a square")))?;

    let mover = game_state.side_to_move.opposite();
    let expected_rank = match mover {
        Color::Light => 2,
        Color::Dark => 5,
    };
    if rank_of(square) != expected_rank {
        return Err(FenError::EnPassant(format!(
            "'{en_passant}' is not on rank {}",
            expected_rank + 1
        )));
    }

    let pawn_square = (square as i8 + mover.pawn_push()) as Square;
    if game_state.piece_at(pawn_square) != Some((mover, PieceKind::Pawn))
        || game_state.piece_at(square).is_some()
    {
        return Err(FenError::EnPassant(format!(
            "no double-pushed pawn in front of '{en_passant}'"
        )));
    }

    Ok(Some(square))
}

fn piece_from_fen_char(ch: char) -> Option<Piece> {
    let color = if ch.is_ascii_uppercase() {
        Color::Light
    } else {
        Color::Dark
    };
    PieceKind::from_letter(ch).map(|kind| (color, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ChessError;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;

    fn fen_error(fen: &str) -> FenError {
        match parse_fen(fen) {
            Err(ChessError::Fen(err)) => err,
            other => panic!("expected FEN error for '{fen}', got {other:?}"),
        }
    }

    #[test]
    fn starting_position_populates_every_cache() {
        let game_state = parse_fen(STARTING_POSITION_FEN).expect("starting FEN should parse");
        assert_eq!(game_state.side_to_move, Color::Light);
        assert_eq!(game_state.fullmove_number, 1);
        assert_eq!(game_state.halfmove_clock, 0);
        assert_eq!(game_state.castling_rights, CASTLE_ALL);
        assert_eq!(game_state.occupancy_all.count_ones(), 32);
        assert_eq!(game_state.king_square(Color::Dark), Some(60));
        assert_eq!(game_state.piece_at(3), Some((Color::Light, PieceKind::Queen)));
        assert_eq!(game_state.repetition_history, vec![game_state.zobrist_key]);
        assert!(!game_state.in_check);
    }

    #[test]
    fn each_field_reports_its_own_error() {
        assert_eq!(fen_error("8/8/8/8/8/8/8/8 w - -"), FenError::FieldCount(4));
        assert!(matches!(
            fen_error("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            FenError::Placement(_)
        ));
        assert!(matches!(
            fen_error("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNRR w KQkq - 0 1"),
            FenError::Placement(_)
        ));
        assert!(matches!(
            fen_error("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            FenError::SideToMove(_)
        ));
        assert!(matches!(
            fen_error("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkz - 0 1"),
            FenError::Castling(_)
        ));
        assert!(matches!(
            fen_error("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e3 0 1"),
            FenError::EnPassant(_)
        ));
        assert!(matches!(
            fen_error("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - -1 1"),
            FenError::HalfmoveClock(_)
        ));
        assert!(matches!(
            fen_error("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 one"),
            FenError::FullmoveNumber(_)
        ));
        assert!(matches!(fen_error("8/8/8/8/8/8/8/4K3 w - - 0 1"), FenError::Kings(_)));
    }

    #[test]
    fn rejects_structurally_impossible_positions() {
        // Castling right without the rook at home.
        assert!(matches!(
            fen_error("4k3/8/8/8/8/8/8/4K3 w K - 0 1"),
            FenError::Castling(_)
        ));
        // Pawn on the first rank.
        assert!(matches!(
            fen_error("4k3/8/8/8/8/8/8/P3K3 w - - 0 1"),
            FenError::Placement(_)
        ));
        // Light to move while dark's king is attacked.
        assert!(matches!(
            fen_error("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1"),
            FenError::Kings(_)
        ));
    }

    #[test]
    fn accepts_real_en_passant_target() {
        let game = parse_fen("rnbqkbnr/pppp1ppp/8/8/3Pp3/8/PPP1PPPP/RNBQKBNR b KQkq d3 0 2")
            .expect("FEN should parse");
        assert_eq!(game.en_passant_square, Some(19));
    }
}
