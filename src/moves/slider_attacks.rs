//! Sliding-piece attacks from precomputed directional rays.
//!
//! Each ray is the full empty-board line from a square in one direction. With
//! blockers present, the ray is cut at the first occupied square (which stays
//! in the attack set) by masking off the ray continuing from that blocker.

use crate::game_state::chess_types::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    North,
    East,
    NorthEast,
    NorthWest,
    South,
    West,
    SouthWest,
    SouthEast,
}

const DIRECTION_STEPS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (1, 1),
    (-1, 1),
    (0, -1),
    (-1, 0),
    (-1, -1),
    (1, -1),
];

const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthWest,
    Direction::SouthEast,
];

/// Indexed `[direction][square]`.
const RAYS: [[u64; 64]; 8] = build_rays();

pub const ROOK_RAYS: [u64; 64] = union_rays(&ROOK_DIRECTIONS);
pub const BISHOP_RAYS: [u64; 64] = union_rays(&BISHOP_DIRECTIONS);

impl Direction {
    #[inline]
    const fn index(self) -> usize {
        self as usize
    }

    /// Rays growing towards higher square indices.
    #[inline]
    const fn is_ascending(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::NorthEast | Direction::NorthWest
        )
    }
}

#[inline]
fn ray_attacks(direction: Direction, square: Square, occupancy: u64) -> u64 {
    let ray = RAYS[direction.index()][square as usize];
    let blockers = ray & occupancy;
    if blockers == 0 {
        return ray;
    }
    let first = if direction.is_ascending() {
        blockers.trailing_zeros()
    } else {
        63 - blockers.leading_zeros()
    };
    ray & !RAYS[direction.index()][first as usize]
}

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    ROOK_DIRECTIONS
        .iter()
        .fold(0, |acc, dir| acc | ray_attacks(*dir, square, occupancy))
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    BISHOP_DIRECTIONS
        .iter()
        .fold(0, |acc, dir| acc | ray_attacks(*dir, square, occupancy))
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}

const fn build_rays() -> [[u64; 64]; 8] {
    let mut table = [[0u64; 64]; 8];
    let mut dir = 0usize;

    while dir < 8 {
        let (file_step, rank_step) = DIRECTION_STEPS[dir];
        let mut sq = 0usize;
        while sq < 64 {
            let mut file = (sq % 8) as i32 + file_step;
            let mut rank = (sq / 8) as i32 + rank_step;
            let mut ray = 0u64;
            while file >= 0 && file < 8 && rank >= 0 && rank < 8 {
                ray |= 1u64 << (rank * 8 + file);
                file += file_step;
                rank += rank_step;
            }
            table[dir][sq] = ray;
            sq += 1;
        }
        dir += 1;
    }

    table
}

const fn union_rays(directions: &[Direction; 4]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let mut i = 0usize;
        while i < 4 {
            table[sq] |= RAYS[directions[i].index()][sq];
            i += 1;
        }
        sq += 1;
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const D4: Square = 27;

    #[test]
    fn empty_board_ray_sizes() {
        assert_eq!(ROOK_RAYS[D4 as usize].count_ones(), 14);
        assert_eq!(BISHOP_RAYS[D4 as usize].count_ones(), 13);
        assert_eq!(queen_attacks(D4, 0).count_ones(), 27);
    }

    #[test]
    fn rook_ray_stops_at_first_blocker() {
        let blocker_on_a4 = 1u64 << 24;
        let attacks = rook_attacks(0, blocker_on_a4);
        assert_ne!(attacks & (1u64 << 24), 0);
        assert_eq!(attacks & (1u64 << 32), 0);
        assert_ne!(attacks & (1u64 << 7), 0);
    }

    #[test]
    fn descending_rays_pick_nearest_blocker() {
        // Blockers on d2 and d1: d4 rook reaches d3 and d2 only.
        let occupancy = (1u64 << 11) | (1u64 << 3);
        let attacks = rook_attacks(D4, occupancy);
        assert_ne!(attacks & (1u64 << 19), 0);
        assert_ne!(attacks & (1u64 << 11), 0);
        assert_eq!(attacks & (1u64 << 3), 0);

        // Bishop from d4 blocked on b2 never reaches a1.
        let attacks = bishop_attacks(D4, 1u64 << 9);
        assert_ne!(attacks & (1u64 << 9), 0);
        assert_eq!(attacks & 1, 0);
    }

    #[test]
    fn queen_is_union_of_rook_and_bishop() {
        let blockers = (1u64 << 43) | (1u64 << 30);
        let attacks = queen_attacks(D4, blockers);
        assert_ne!(attacks & (1u64 << 43), 0);
        assert_ne!(attacks & (1u64 << 30), 0);
        assert_eq!(attacks & (1u64 << 51), 0);
        assert_eq!(attacks & (1u64 << 31), 0);
    }
}
