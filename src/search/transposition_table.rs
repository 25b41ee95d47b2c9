//! Fixed-size transposition table keyed by Zobrist hash.
//!
//! Direct indexing (`key mod capacity`) with depth-gated replacement: a slot is
//! overwritten when the stored depth is not greater than the new depth.

use crate::game_state::chess_types::Move;

/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_BOUND: i32 = 29_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    pub key: u64,
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

impl TTEntry {
    /// Score usable at `depth` inside the `(alpha, beta)` window, if any.
    pub fn cutoff_score(&self, depth: u8, alpha: i32, beta: i32) -> Option<i32> {
        if self.depth < depth {
            return None;
        }
        match self.bound {
            Bound::Exact => Some(self.score),
            Bound::Lower if self.score >= beta => Some(self.score),
            Bound::Upper if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TTStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    stats: TTStats,
}

impl TranspositionTable {
    pub fn new(entry_count: usize) -> Self {
        Self {
            entries: vec![None; entry_count.max(1)],
            stats: TTStats::default(),
        }
    }

    pub fn new_with_mb(size_mb: usize) -> Self {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let entry_size = std::mem::size_of::<Option<TTEntry>>().max(1);
        Self::new(bytes / entry_size)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.stats = TTStats::default();
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
    pub fn stats(&self) -> TTStats {
        self.stats
    }

    /// Occupied slots per thousand.
    pub fn hashfull(&self) -> u32 {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        (used * 1000 / sample) as u32
    }

    #[inline]
    fn idx(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    pub fn probe(&mut self, key: u64) -> Option<TTEntry> {
        self.stats.probes += 1;
        let hit = self.entries[self.idx(key)].filter(|e| e.key == key);
        if hit.is_some() {
            self.stats.hits += 1;
        }
        hit
    }

    /// Read-only lookup that leaves the statistics alone.
    pub fn peek(&self, key: u64) -> Option<TTEntry> {
        self.entries[self.idx(key)].filter(|e| e.key == key)
    }

    pub fn store(&mut self, entry: TTEntry) {
        let idx = self.idx(entry.key);
        let replace = match self.entries[idx] {
            None => true,
            Some(existing) => existing.depth <= entry.depth,
        };

        if replace {
            self.stats.stores += 1;
            self.entries[idx] = Some(entry);
        } else {
            self.stats.rejected += 1;
        }
    }

    pub fn put(&mut self, key: u64, depth: u8, score: i32, bound: Bound, best_move: Option<Move>) {
        self.store(TTEntry {
            key,
            depth,
            score,
            bound,
            best_move,
        });
    }
}

/// Convert a root-relative mate score to a node-relative one before storing.
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score + ply as i32
    } else if score <= -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`].
#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score - ply as i32
    } else if score <= -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}
