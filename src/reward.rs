//! Scalar reward for one side of a finished match.

use crate::sim::{MatchResult, Outcome, Side, SideView};

pub const WIN_BONUS: f64 = 3.0;
pub const DRAW_BONUS: f64 = 1.0;
pub const LOSS_PENALTY: f64 = -1.0;
pub const GOAL_DIFF_WEIGHT: f64 = 0.5;
pub const POSSESSION_WEIGHT: f64 = 2.0;
pub const SHOT_WEIGHT: f64 = 0.1;

/// Reward for `side` in `result`.
pub fn reward(result: &MatchResult, side: Side) -> f64 {
    reward_for(&result.view(side))
}

pub fn reward_for(view: &SideView) -> f64 {
    let outcome = match view.outcome {
        Outcome::Win => WIN_BONUS,
        Outcome::Draw => DRAW_BONUS,
        Outcome::Loss => LOSS_PENALTY,
    };
    let goal_diff = f64::from(view.goals_for) - f64::from(view.goals_against);
    outcome
        + GOAL_DIFF_WEIGHT * goal_diff
        + POSSESSION_WEIGHT * (view.possession - 0.5)
        + SHOT_WEIGHT * f64::from(view.shots)
}
