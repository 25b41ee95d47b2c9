//! Static evaluation.
//!
//! `MaterialScorer` counts material only. `StandardScorer` adds
//! piece-square tables and a mobility term. Both return centipawns for the
//! side to move. `EvalCache` memoizes scores by position key.

use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::leaper_attacks::{king_attacks, knight_attacks, pawn_attacks};
use crate::moves::slider_attacks::{bishop_attacks, queen_attacks, rook_attacks};

pub trait BoardScorer: Send + Sync {
    /// Score from the perspective of the side to move.
    fn score(&self, game_state: &GameState) -> i32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl MaterialScorer {
    #[inline]
    pub const fn piece_value(piece: PieceKind) -> i32 {
        match piece {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 0,
        }
    }

    #[inline]
    fn material_balance_light_minus_dark(game_state: &GameState) -> i32 {
        ALL_PIECE_KINDS
            .iter()
            .map(|&piece| {
                let light = game_state.pieces[Color::Light.index()][piece.index()].count_ones() as i32;
                let dark = game_state.pieces[Color::Dark.index()][piece.index()].count_ones() as i32;
                (light - dark) * Self::piece_value(piece)
            })
            .sum()
    }
}

impl BoardScorer for MaterialScorer {
    fn score(&self, game_state: &GameState) -> i32 {
        from_side_to_move(game_state, Self::material_balance_light_minus_dark(game_state))
    }
}

/// Material, piece-square bonuses and a light mobility term.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScorer;

impl StandardScorer {
    const MOBILITY_WEIGHT: i32 = 2;

    fn positional_term(game_state: &GameState) -> i32 {
        let mut score = 0i32;
        for color in [Color::Light, Color::Dark] {
            let sign = if color == Color::Light { 1 } else { -1 };
            for piece in ALL_PIECE_KINDS {
                let mut bb = game_state.pieces[color.index()][piece.index()];
                while bb != 0 {
                    let sq = bb.trailing_zeros() as Square;
                    score += sign * piece_square_bonus(piece, color, sq);
                    bb &= bb - 1;
                }
            }
        }
        score
    }

    fn mobility_term(game_state: &GameState) -> i32 {
        let light = mobility_for_color(game_state, Color::Light);
        let dark = mobility_for_color(game_state, Color::Dark);
        (light - dark) * Self::MOBILITY_WEIGHT
    }
}

impl BoardScorer for StandardScorer {
    fn score(&self, game_state: &GameState) -> i32 {
        let light_minus_dark = MaterialScorer::material_balance_light_minus_dark(game_state)
            + Self::positional_term(game_state)
            + Self::mobility_term(game_state);
        from_side_to_move(game_state, light_minus_dark)
    }
}

#[inline]
fn from_side_to_move(game_state: &GameState, light_minus_dark: i32) -> i32 {
    match game_state.side_to_move {
        Color::Light => light_minus_dark,
        Color::Dark => -light_minus_dark,
    }
}

fn mobility_for_color(game_state: &GameState, color: Color) -> i32 {
    let occ = game_state.occupancy_all;
    let own_occ = game_state.occupancy_by_color[color.index()];
    let mut m = 0i32;

    for piece in ALL_PIECE_KINDS {
        let mut bb = game_state.pieces[color.index()][piece.index()];
        while bb != 0 {
            let sq = bb.trailing_zeros() as Square;
            let reach = match piece {
                PieceKind::Pawn => pawn_attacks(color, sq),
                PieceKind::Knight => knight_attacks(sq),
                PieceKind::Bishop => bishop_attacks(sq, occ),
                PieceKind::Rook => rook_attacks(sq, occ),
                PieceKind::Queen => queen_attacks(sq, occ),
                PieceKind::King => king_attacks(sq),
            };
            m += (reach & !own_occ).count_ones() as i32;
            bb &= bb - 1;
        }
    }

    m
}

// Piece-square tables, a1 first, from Light's side of the board.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10,-20,-20, 10, 10,  5,
     5, -5,-10,  0,  0,-10, -5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5,  5, 10, 25, 25, 10,  5,  5,
    10, 10, 20, 30, 30, 20, 10, 10,
    50, 50, 50, 50, 50, 50, 50, 50,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     5, 10, 10, 10, 10, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -10,  5,  5,  5,  5,  5,  0,-10,
     0,  0,  5,  5,  5,  5,  0, -5,
    -5,  0,  5,  5,  5,  5,  0, -5,
   -10,  0,  5,  5,  5,  5,  0,-10,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_TABLE: [i32; 64] = [
    20, 30, 10,  0,  0, 10, 30, 20,
    20, 20,  0,  0,  0,  0, 20, 20,
   -10,-20,-20,-20,-20,-20,-20,-10,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
];

#[inline]
fn piece_square_bonus(piece: PieceKind, color: Color, sq: Square) -> i32 {
    // Dark reads the tables rank-mirrored.
    let idx = match color {
        Color::Light => sq as usize,
        Color::Dark => (sq ^ 56) as usize,
    };
    let table = match piece {
        PieceKind::Pawn => &PAWN_TABLE,
        PieceKind::Knight => &KNIGHT_TABLE,
        PieceKind::Bishop => &BISHOP_TABLE,
        PieceKind::Rook => &ROOK_TABLE,
        PieceKind::Queen => &QUEEN_TABLE,
        PieceKind::King => &KING_TABLE,
    };
    table[idx]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalCacheStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

#[derive(Debug, Clone, Copy)]
struct EvalCacheEntry {
    key: u64,
    score: i32,
}

/// Fixed-size evaluation cache keyed by position key.
///
/// Colliding keys simply overwrite the slot; a probe only answers when the
/// stored key matches exactly.
#[derive(Debug, Clone)]
pub struct EvalCache {
    entries: Vec<Option<EvalCacheEntry>>,
    stats: EvalCacheStats,
}

impl EvalCache {
    pub fn new(entry_count: usize) -> Self {
        Self {
            entries: vec![None; entry_count.max(1)],
            stats: EvalCacheStats::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    #[inline]
    pub fn stats(&self) -> EvalCacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.stats = EvalCacheStats::default();
    }

    #[inline]
    fn idx(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    pub fn probe(&mut self, key: u64) -> Option<i32> {
        self.stats.probes += 1;
        let hit = self.entries[self.idx(key)]
            .filter(|entry| entry.key == key)
            .map(|entry| entry.score);
        if hit.is_some() {
            self.stats.hits += 1;
        }
        hit
    }

    pub fn store(&mut self, key: u64, score: i32) {
        self.stats.stores += 1;
        let idx = self.idx(key);
        self.entries[idx] = Some(EvalCacheEntry { key, score });
    }

    /// Cached score for `game_state`, computing and storing it on a miss.
    pub fn evaluate<S: BoardScorer + ?Sized>(&mut self, scorer: &S, game_state: &GameState) -> i32 {
        let key = game_state.zobrist_key;
        if let Some(score) = self.probe(key) {
            return score;
        }
        let score = scorer.score(game_state);
        self.store(key, score);
        score
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardScorer, EvalCache, MaterialScorer, StandardScorer};
    use crate::game_state::game_state::GameState;

    #[test]
    fn material_scorer_reflects_side_to_move_perspective() {
        let light_to_move =
            GameState::from_fen("4k3/8/8/8/8/8/8/4KQ2 w - - 0 1").expect("FEN should parse");
        let dark_to_move =
            GameState::from_fen("4k3/8/8/8/8/8/8/4KQ2 b - - 0 1").expect("FEN should parse");

        let scorer = MaterialScorer;
        assert_eq!(scorer.score(&light_to_move), 900);
        assert_eq!(scorer.score(&dark_to_move), -900);
        assert_eq!(scorer.score(&GameState::new_game()), 0);
    }

    #[test]
    fn standard_scorer_rewards_central_knight() {
        let center =
            GameState::from_fen("4k3/8/8/3N4/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let rim = GameState::from_fen("4k3/8/8/8/8/8/N7/4K3 w - - 0 1").expect("FEN should parse");
        let scorer = StandardScorer;
        assert!(
            scorer.score(&center) > scorer.score(&rim),
            "central knight should score better"
        );
    }

    #[test]
    fn standard_scorer_is_symmetric_at_the_start() {
        assert_eq!(StandardScorer.score(&GameState::new_game()), 0);
    }

    #[test]
    fn piece_square_tables_mirror_by_rank() {
        let mirrored =
            GameState::from_fen("4k3/8/8/4p3/4P3/8/8/4K3 w - - 0 1").expect("FEN should parse");
        assert_eq!(StandardScorer.score(&mirrored), 0);

        let advanced =
            GameState::from_fen("4k3/4P3/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let home = GameState::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").expect("FEN should parse");
        assert!(StandardScorer.score(&advanced) > StandardScorer.score(&home));
    }

    #[test]
    fn eval_cache_hits_only_on_matching_key() {
        let game = GameState::from_fen("4k3/8/8/8/8/8/8/4KQ2 w - - 0 1").expect("FEN should parse");
        let mut cache = EvalCache::new(16);
        assert!(cache.is_empty());

        assert_eq!(cache.evaluate(&MaterialScorer, &game), 900);
        assert_eq!(cache.evaluate(&MaterialScorer, &game), 900);
        let stats = cache.stats();
        assert_eq!((stats.probes, stats.hits, stats.stores), (2, 1, 1));

        // Same slot, different key.
        assert_eq!(cache.probe(game.zobrist_key.wrapping_add(16)), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.probe(game.zobrist_key), None);
    }
}
