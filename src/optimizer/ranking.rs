use serde::{Deserialize, Serialize};

use crate::catalog::Tactic;
use crate::optimizer::stats::TacticStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTactic {
    pub tactic: Tactic,
    pub key: String,
    pub avg_reward: f64,
    pub win_rate: f64,
    pub avg_goals_for: f64,
    pub avg_goals_against: f64,
    pub sample_count: u64,
}

impl RankedTactic {
    pub fn new(tactic: Tactic, stats: &TacticStats) -> Self {
        Self {
            tactic,
            key: tactic.key(),
            avg_reward: stats.avg_reward(),
            win_rate: stats.win_rate(),
            avg_goals_for: stats.avg_goals_for(),
            avg_goals_against: stats.avg_goals_against(),
            sample_count: stats.matches,
        }
    }
}

/// Ranks tactics by average reward, best first. Ties fall back to win rate, then sample
/// count, then tactic order so the ranking is independent of input order.
pub fn rank_results<I>(results: I) -> Vec<RankedTactic>
where
    I: IntoIterator<Item = (Tactic, TacticStats)>,
{
    let mut ranked: Vec<RankedTactic> = results
        .into_iter()
        .filter(|(_, stats)| stats.matches > 0)
        .map(|(tactic, stats)| RankedTactic::new(tactic, &stats))
        .collect();

    ranked.sort_by(|left, right| {
        right
            .avg_reward
            .total_cmp(&left.avg_reward)
            .then_with(|| right.win_rate.total_cmp(&left.win_rate))
            .then_with(|| right.sample_count.cmp(&left.sample_count))
            .then_with(|| left.tactic.cmp(&right.tactic))
    });

    ranked
}
