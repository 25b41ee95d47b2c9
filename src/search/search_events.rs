//! Progress events pushed by the search to whoever is listening.
//!
//! The search knows nothing about its consumers: anything implementing
//! `SearchObserver` (a closure, a channel sender) can be attached.

use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::game_state::chess_types::Move;
use crate::search::transposition_table::MATE_BOUND;
use crate::utils::long_algebraic::move_to_coordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationInfo {
    pub depth: u8,
    pub score: i32,
    pub best_move: Option<Move>,
    pub nodes: u64,
    pub nps: u64,
    pub elapsed: Duration,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

impl IterationInfo {
    /// `depth 5 score cp 34 nodes 81234 nps 402000 time 202 hashfull 12 pv e2e4 e7e5`
    pub fn to_info_line(&self) -> String {
        let mut line = format!(
            "depth {} score {} nodes {} nps {} time {} hashfull {}",
            self.depth,
            format_score(self.score),
            self.nodes,
            self.nps,
            self.elapsed.as_millis(),
            self.hashfull
        );
        if !self.pv.is_empty() {
            line.push_str(" pv");
            for mv in &self.pv {
                line.push(' ');
                line.push_str(&move_to_coordinate(*mv));
            }
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// One iterative-deepening depth finished.
    Iteration(IterationInfo),
    /// The search is over.
    BestMove { best_move: Option<Move>, score: i32 },
}

pub trait SearchObserver: Send {
    fn on_event(&mut self, event: &SearchEvent);
}

impl<F> SearchObserver for F
where
    F: FnMut(&SearchEvent) + Send,
{
    fn on_event(&mut self, event: &SearchEvent) {
        self(event)
    }
}

/// Forwards events over a channel. A hung-up receiver is ignored.
pub struct ChannelObserver(pub Sender<SearchEvent>);

impl SearchObserver for ChannelObserver {
    fn on_event(&mut self, event: &SearchEvent) {
        let _ = self.0.send(event.clone());
    }
}

/// `cp N`, or `mate N` in moves (negative when getting mated).
pub fn format_score(score: i32) -> String {
    if score.abs() >= MATE_BOUND {
        let plies = crate::search::iterative_deepening::MATE_SCORE - score.abs();
        let moves = (plies + 1) / 2;
        if score > 0 {
            format!("mate {moves}")
        } else {
            format!("mate -{moves}")
        }
    } else {
        format!("cp {score}")
    }
}
