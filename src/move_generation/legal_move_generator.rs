//! Full legal move generation pipeline.
//!
//! Piece-wise pseudo-legal generation fills a scratch list; each candidate is
//! then made, tested for own-king safety, and unmade. That probe is the only
//! legality rule. The last full legal list is cached per position so repeated
//! queries on an unchanged board skip regeneration.
//!
//! Each search thread or perft worker owns its own `MoveGenerator`.

use crate::errors::ChessResult;
use crate::game_state::undo_state::TerminalKind;
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_apply::{make_move_in_place, unmake_move_in_place};
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_moves_king::generate_king_moves;
use crate::move_generation::legal_moves_pawn::generate_pawn_moves;
use crate::move_generation::legal_moves_pieces::{generate_knight_moves, generate_slider_moves};
use crate::moves::move_list::MoveList;

/// Identifies the board a cached list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheTag {
    key: u64,
    occupancy: u64,
}

impl CacheTag {
    #[inline]
    fn of(game_state: &GameState) -> Self {
        Self {
            key: game_state.zobrist_key,
            occupancy: game_state.occupancy_all,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoveGenerator {
    pseudo: MoveList,
    cached_tag: Option<CacheTag>,
    cached_legal: MoveList,
}

impl MoveGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pseudo-legal move for the side to move.
    pub fn generate_pseudo_legal(&self, game_state: &GameState, out: &mut MoveList) {
        out.clear();
        push_pseudo_legal(game_state, true, out);
    }

    /// Fill `out` with the legal moves of `game_state`.
    ///
    /// The position is temporarily modified by the legality probe and is
    /// restored before returning. When no move is legal the latest history
    /// entry is marked as checkmate or stalemate.
    pub fn generate_legal(&mut self, game_state: &mut GameState, out: &mut MoveList) -> ChessResult<()> {
        self.refresh_cache(game_state)?;
        out.copy_from(self.cached_legal.as_slice());
        Ok(())
    }

    /// Legal captures and promotions only. Not cached.
    pub fn generate_legal_tactical(
        &mut self,
        game_state: &mut GameState,
        out: &mut MoveList,
    ) -> ChessResult<()> {
        self.pseudo.clear();
        push_pseudo_legal(game_state, false, &mut self.pseudo);
        out.clear();
        for i in 0..self.pseudo.len() {
            let mv = self.pseudo[i];
            if leaves_king_safe(game_state, mv)? {
                out.push(mv);
            }
        }
        Ok(())
    }

    /// Cached legal move list for `game_state`.
    pub fn legal_moves(&mut self, game_state: &mut GameState) -> ChessResult<&[Move]> {
        self.refresh_cache(game_state)?;
        Ok(self.cached_legal.as_slice())
    }

    pub fn is_legal_move(&mut self, game_state: &mut GameState, mv: Move) -> ChessResult<bool> {
        Ok(self.legal_moves(game_state)?.contains(&mv))
    }

    /// Stops at the first legal move found.
    pub fn has_legal_move(&mut self, game_state: &mut GameState) -> ChessResult<bool> {
        if self.cached_tag == Some(CacheTag::of(game_state)) {
            return Ok(!self.cached_legal.is_empty());
        }
        self.pseudo.clear();
        push_pseudo_legal(game_state, true, &mut self.pseudo);
        for i in 0..self.pseudo.len() {
            if leaves_king_safe(game_state, self.pseudo[i])? {
                return Ok(true);
            }
        }
        mark_terminal(game_state);
        Ok(false)
    }

    fn refresh_cache(&mut self, game_state: &mut GameState) -> ChessResult<()> {
        let tag = CacheTag::of(game_state);
        if self.cached_tag != Some(tag) {
            self.pseudo.clear();
            push_pseudo_legal(game_state, true, &mut self.pseudo);
            self.cached_tag = None;
            self.cached_legal.clear();
            for i in 0..self.pseudo.len() {
                let mv = self.pseudo[i];
                if leaves_king_safe(game_state, mv)? {
                    self.cached_legal.push(mv);
                }
            }
            self.cached_tag = Some(tag);
        }
        if self.cached_legal.is_empty() {
            mark_terminal(game_state);
        }
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.cached_tag = None;
        self.cached_legal.clear();
    }
}

fn push_pseudo_legal(game_state: &GameState, include_quiet: bool, out: &mut MoveList) {
    let side = game_state.side_to_move;
    let enemy_king = game_state.pieces[side.opposite().index()][PieceKind::King.index()];
    let enemy_targets = game_state.occupancy_by_color[side.opposite().index()] & !enemy_king;
    let target_mask = if include_quiet {
        !game_state.occupancy_by_color[side.index()] & !enemy_king
    } else {
        enemy_targets
    };

    generate_pawn_moves(game_state, !enemy_king, include_quiet, out);
    generate_knight_moves(game_state, target_mask, out);
    generate_slider_moves(game_state, target_mask, out);
    generate_king_moves(game_state, target_mask, include_quiet, out);
}

fn leaves_king_safe(game_state: &mut GameState, mv: Move) -> ChessResult<bool> {
    let mover = game_state.side_to_move;
    make_move_in_place(game_state, mv)?;
    let safe = !is_king_in_check(game_state, mover);
    unmake_move_in_place(game_state)?;
    Ok(safe)
}

fn mark_terminal(game_state: &mut GameState) {
    let in_check = game_state.in_check;
    if let Some(last) = game_state.undo_stack.last_mut() {
        last.terminal = Some(if in_check {
            TerminalKind::Checkmate
        } else {
            TerminalKind::Stalemate
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::legal_move_checks::is_square_attacked;
    use crate::moves::move_descriptions::{is_tactical, move_from, move_to};
    use crate::utils::long_algebraic::parse_coordinate_move;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn legal_count(fen: &str) -> usize {
        let mut game = GameState::from_fen(fen).expect("FEN should parse");
        let mut generator = MoveGenerator::new();
        let mut out = MoveList::new();
        generator.generate_legal(&mut game, &mut out).expect("generation should succeed");
        out.len()
    }

    #[test]
    fn known_positions_have_reference_move_counts() {
        assert_eq!(legal_count("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), 20);
        assert_eq!(
            legal_count("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
            48
        );
        assert_eq!(legal_count("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"), 14);
        assert_eq!(
            legal_count("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1"),
            6
        );
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        // Bishop on e2 is pinned by the rook on e8.
        let mut game = GameState::from_fen("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1")
            .expect("FEN should parse");
        let mut generator = MoveGenerator::new();
        let mut out = MoveList::new();
        generator.generate_legal(&mut game, &mut out).expect("generation should succeed");
        assert!(out.iter().all(|mv| move_from(*mv) != 12));
    }

    #[test]
    fn en_passant_exposing_king_is_rejected() {
        // Capturing d6 would open the fifth rank to the h5 rook.
        let mut game = GameState::from_fen("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1")
            .expect("FEN should parse");
        let mut generator = MoveGenerator::new();
        let mut pseudo = MoveList::new();
        generator.generate_pseudo_legal(&game, &mut pseudo);
        let en_passant = pseudo
            .iter()
            .copied()
            .find(|mv| move_to(*mv) == 43)
            .expect("pseudo-legal en passant");
        assert!(!generator.is_legal_move(&mut game, en_passant).expect("legality query"));
    }

    #[test]
    fn cache_follows_make_and_undo() {
        let mut game = GameState::new_game();
        let mut generator = MoveGenerator::new();
        assert_eq!(generator.legal_moves(&mut game).expect("moves").len(), 20);
        let mv = parse_coordinate_move("e2e4", &mut game).expect("move should parse");
        game.make_move(mv).expect("move should apply");
        assert_eq!(generator.legal_moves(&mut game).expect("moves").len(), 20);
        game.undo_move().expect("undo should succeed");
        assert!(generator.is_legal_move(&mut game, mv).expect("legality query"));
    }

    #[test]
    fn tactical_moves_are_a_subset_of_legal_moves() {
        let mut game = GameState::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .expect("FEN should parse");
        let mut generator = MoveGenerator::new();
        let mut tactical = MoveList::new();
        let mut legal = MoveList::new();
        generator
            .generate_legal_tactical(&mut game, &mut tactical)
            .expect("generation should succeed");
        generator.generate_legal(&mut game, &mut legal).expect("generation should succeed");

        assert_eq!(tactical.len(), 8);
        assert!(tactical.iter().all(|mv| legal.contains(*mv) && is_tactical(*mv)));
        assert_eq!(legal.iter().filter(|mv| is_tactical(**mv)).count(), tactical.len());
    }

    #[test]
    fn mate_marks_the_history_entry() {
        let mut game = GameState::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1")
            .expect("FEN should parse");
        let mv = parse_coordinate_move("a1a8", &mut game).expect("move should parse");
        game.make_move(mv).expect("move should apply");
        let mut generator = MoveGenerator::new();
        assert!(!generator.has_legal_move(&mut game).expect("query"));
        assert_eq!(
            game.last_move().and_then(|undo| undo.terminal),
            Some(TerminalKind::Checkmate)
        );
    }

    #[test]
    fn random_playouts_never_leave_own_king_attacked() {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let mut generator = MoveGenerator::new();
        let mut legal = MoveList::new();

        for _ in 0..25 {
            let mut game = GameState::new_game();
            for _ in 0..80 {
                generator.generate_legal(&mut game, &mut legal).expect("generation should succeed");
                if legal.is_empty() || game.is_rule_draw() {
                    break;
                }
                for mv in legal.iter().copied() {
                    let mover = game.side_to_move;
                    game.make_move(mv).expect("legal move should apply");
                    let king = game.king_square(mover).expect("king on board");
                    assert!(!is_square_attacked(&game, king, mover.opposite()));
                    game.undo_move().expect("undo should succeed");
                }
                let mv = legal[rng.random_range(0..legal.len())];
                game.make_move(mv).expect("legal move should apply");
            }
        }
    }
}
