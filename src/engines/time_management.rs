//! Turns clock data into soft/hard search budgets.
//!
//! The session passes raw clock data through `GameContext`; the engine
//! decides the per-move allocation here.

use crate::engines::engine_trait::GameContext;
use crate::game_state::game_state::GameState;
use crate::search::iterative_deepening::SearchLimits;

/// The hard limit may stretch this far past the soft target.
const HARD_LIMIT_FACTOR: u64 = 3;

pub fn search_limits_for(game_state: &GameState, context: &GameContext, move_overhead_ms: u64) -> SearchLimits {
    let max_depth = context.depth;
    let max_nodes = context.nodes;

    if let Some(move_time) = context.move_time_ms {
        let budget = move_time.saturating_sub(move_overhead_ms).max(1);
        return SearchLimits {
            max_depth,
            soft_ms: Some(budget),
            hard_ms: Some(budget),
            max_nodes,
        };
    }

    let (remaining, increment) = context.clock_for(game_state.side_to_move);
    let Some(remaining) = remaining else {
        return SearchLimits {
            max_depth,
            soft_ms: None,
            hard_ms: None,
            max_nodes,
        };
    };

    let usable = remaining.saturating_sub(move_overhead_ms).max(1);
    let soft = adaptive_budget_ms(game_state, usable, increment, context.moves_to_go);
    let hard = soft
        .saturating_mul(HARD_LIMIT_FACTOR)
        .min((usable / 4).max(1))
        .max(soft);

    SearchLimits {
        max_depth,
        soft_ms: Some(soft),
        hard_ms: Some(hard),
        max_nodes,
    }
}

fn adaptive_budget_ms(
    game_state: &GameState,
    remaining_ms: u64,
    inc_ms: Option<u64>,
    movestogo: Option<u16>,
) -> u64 {
    let ply = u64::from(game_state.fullmove_number.saturating_sub(1)) * 2;
    let expected_moves_left = if let Some(mtg) = movestogo {
        u64::from(mtg.max(1))
    } else if ply < 20 {
        40
    } else if ply < 60 {
        28
    } else {
        18
    };

    let reserve = (remaining_ms / 25).clamp(remaining_ms.min(100), remaining_ms);
    let usable = remaining_ms.saturating_sub(reserve);
    let base = usable / expected_moves_left;
    let inc_bonus = inc_ms.unwrap_or(0).saturating_mul(3) / 4;
    let panic = if remaining_ms < 2_000 {
        remaining_ms / 12
    } else {
        0
    };
    let target = base.saturating_add(inc_bonus).saturating_add(panic);

    let min_budget = if remaining_ms < 1_000 { 5 } else { 15 };
    let max_budget = (remaining_ms / 4).max(1);
    target.clamp(min_budget.min(max_budget), max_budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_move_time_subtracts_overhead() {
        let game = GameState::new_game();
        let limits = search_limits_for(&game, &GameContext::fixed_move_time(500), 30);
        assert_eq!(limits.soft_ms, Some(470));
        assert_eq!(limits.hard_ms, Some(470));
        assert_eq!(limits.max_depth, None);
    }

    #[test]
    fn no_clock_means_depth_only() {
        let game = GameState::new_game();
        let limits = search_limits_for(&game, &GameContext::fixed_depth(5), 30);
        assert_eq!(limits, SearchLimits::depth(5));

        let budgeted = GameContext {
            nodes: Some(20_000),
            ..GameContext::fixed_depth(5)
        };
        assert_eq!(search_limits_for(&game, &budgeted, 30).max_nodes, Some(20_000));
    }

    #[test]
    fn clock_budget_uses_side_to_move_and_stays_bounded() {
        let game = GameState::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .expect("FEN should parse");
        let context = GameContext {
            light_time_ms: Some(1_000),
            dark_time_ms: Some(60_000),
            dark_increment_ms: Some(1_000),
            ..GameContext::default()
        };
        let limits = search_limits_for(&game, &context, 0);
        let soft = limits.soft_ms.expect("soft budget");
        let hard = limits.hard_ms.expect("hard budget");

        // 60 s clock, 40 moves expected, 1 s increment.
        assert!((1_500..=3_000).contains(&soft), "soft {soft}");
        assert!(hard >= soft && hard <= 15_000, "hard {hard}");
    }

    #[test]
    fn tiny_clock_never_exceeds_a_quarter() {
        let game = GameState::new_game();
        let context = GameContext {
            light_time_ms: Some(40),
            ..GameContext::default()
        };
        let limits = search_limits_for(&game, &context, 0);
        assert!(limits.hard_ms.expect("hard") <= 10);
        assert!(limits.soft_ms.expect("soft") >= 1);
    }
}
