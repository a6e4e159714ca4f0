//! Per-tactic match aggregates. Additive, so partial results from any number of workers
//! can be merged in any order.

use serde::Serialize;

use crate::sim::{Outcome, SideView};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TacticStats {
    pub matches: u64,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub goals_for: u64,
    pub goals_against: u64,
    pub reward_total: f64,
}

impl TacticStats {
    pub fn record(&mut self, view: &SideView, reward: f64) {
        self.matches += 1;
        match view.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.goals_for += u64::from(view.goals_for);
        self.goals_against += u64::from(view.goals_against);
        self.reward_total += reward;
    }

    pub fn merge(&mut self, other: &TacticStats) {
        self.matches += other.matches;
        self.wins += other.wins;
        self.draws += other.draws;
        self.losses += other.losses;
        self.goals_for += other.goals_for;
        self.goals_against += other.goals_against;
        self.reward_total += other.reward_total;
    }

    fn per_match(&self, total: f64) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            total / self.matches as f64
        }
    }

    pub fn avg_reward(&self) -> f64 {
        self.per_match(self.reward_total)
    }

    pub fn win_rate(&self) -> f64 {
        self.per_match(self.wins as f64)
    }

    pub fn avg_goals_for(&self) -> f64 {
        self.per_match(self.goals_for as f64)
    }

    pub fn avg_goals_against(&self) -> f64 {
        self.per_match(self.goals_against as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(goals_for: u32, goals_against: u32, outcome: Outcome) -> SideView {
        SideView {
            goals_for,
            goals_against,
            possession: 0.5,
            shots: 0,
            outcome,
        }
    }

    #[test]
    fn empty_stats_average_to_zero() {
        let stats = TacticStats::default();
        assert_eq!(stats.avg_reward(), 0.0);
        assert_eq!(stats.win_rate(), 0.0);
    }

    #[test]
    fn merge_is_order_independent() {
        let mut a = TacticStats::default();
        a.record(&view(2, 0, Outcome::Win), 4.0);
        let mut b = TacticStats::default();
        b.record(&view(0, 1, Outcome::Loss), -1.5);
        b.record(&view(1, 1, Outcome::Draw), 1.0);

        let mut ab = a;
        ab.merge(&b);
        let mut ba = b;
        ba.merge(&a);
        assert_eq!(ab, ba);
        assert_eq!(ab.matches, 3);
        assert!((ab.win_rate() - 1.0 / 3.0).abs() < 1e-12);
        assert!((ab.avg_goals_for() - 1.0).abs() < 1e-12);
    }
}
