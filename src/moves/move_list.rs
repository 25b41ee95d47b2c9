//! Fixed-capacity move buffer.
//!
//! `MoveList` is an array with head/tail cursors: pushes go to the tail,
//! `pop` takes from the tail (stack) and `pop_front` from the head (queue).
//! `clear` only resets the cursors, so one list can be reused for the whole
//! lifetime of a generator or search without reallocating.

use std::ops::Index;

use crate::game_state::chess_types::Move;

/// Upper bound on legal moves in any chess position is 218.
pub const MAX_MOVES: usize = 256;

#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    head: usize,
    tail: usize,
}

impl MoveList {
    pub const fn new() -> Self {
        Self {
            moves: [0; MAX_MOVES],
            head: 0,
            tail: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.tail < MAX_MOVES, "move list overflow");
        self.moves[self.tail] = mv;
        self.tail += 1;
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Move> {
        if self.is_empty() {
            return None;
        }
        self.tail -= 1;
        Some(self.moves[self.tail])
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<Move> {
        if self.is_empty() {
            return None;
        }
        let mv = self.moves[self.head];
        self.head += 1;
        Some(mv)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tail == self.head
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[self.head..self.tail]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[self.head..self.tail]
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    /// Replace the contents with `moves`.
    pub fn copy_from(&mut self, moves: &[Move]) {
        self.clear();
        self.moves[..moves.len()].copy_from_slice(moves);
        self.tail = moves.len();
    }

    pub fn to_vec(&self) -> Vec<Move> {
        self.as_slice().to_vec()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behaves_as_stack_and_queue() {
        let mut list = MoveList::new();
        for mv in [10, 20, 30, 40] {
            list.push(mv);
        }
        assert_eq!(list.len(), 4);
        assert_eq!(list.pop_front(), Some(10));
        assert_eq!(list.pop(), Some(40));
        assert_eq!(list.as_slice(), &[20, 30]);
        assert_eq!(list[1], 30);
        assert!(list.contains(20));
        assert!(!list.contains(10));
    }

    #[test]
    fn clear_reuses_storage() {
        let mut list = MoveList::new();
        list.push(1);
        list.pop_front();
        assert!(list.is_empty());
        assert_eq!(list.pop(), None);
        list.clear();
        list.copy_from(&[7, 8, 9]);
        assert_eq!(list.to_vec(), vec![7, 8, 9]);
    }
}
