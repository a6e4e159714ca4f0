//! Round-robin evaluation of a contiguous shard of the tactic space against the whole space.

use std::collections::HashMap;
use std::ops::Range;

use rand::Rng;

use crate::catalog::{Tactic, TacticSpace};
use crate::error::SearchError;
use crate::optimizer::stats::TacticStats;
use crate::parallel::CancelToken;
use crate::reward::reward;
use crate::sim::{simulate_match_with, Side};

/// Shard tactics evaluated between progress reports.
pub const PROGRESS_INTERVAL: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShardProgress {
    pub completed: u64,
    pub total: u64,
    pub matches_played: u64,
    /// Highest average reward among the shard tactics finished so far.
    pub best_avg_reward: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ShardOutcome {
    pub stats: HashMap<Tactic, TacticStats>,
    pub matches_played: u64,
}

/// Plays every tactic with an index in `shard` against every tactic in `space`,
/// `matches_per_pair` times each, from the shard tactic's (home) perspective.
pub fn evaluate_shard<R, F>(
    space: &TacticSpace,
    shard: Range<usize>,
    matches_per_pair: u32,
    rng: &mut R,
    cancel: &CancelToken,
    mut on_progress: F,
) -> Result<ShardOutcome, SearchError>
where
    R: Rng + ?Sized,
    F: FnMut(&ShardProgress) -> Result<(), SearchError>,
{
    let shard = shard.start.min(space.len())..shard.end.min(space.len());
    let total = shard.len() as u64;
    let mut outcome = ShardOutcome::default();
    let mut best_avg_reward: Option<f64> = None;

    for (done, index) in shard.clone().enumerate() {
        cancel.check()?;
        let Some(tactic) = space.get(index) else {
            continue;
        };
        let stats = outcome.stats.entry(tactic).or_default();
        for opponent in space.iter() {
            for _ in 0..matches_per_pair {
                let result = simulate_match_with(&tactic, &opponent, rng);
                stats.record(&result.view(Side::Home), reward(&result, Side::Home));
            }
        }
        let avg_reward = stats.avg_reward();
        best_avg_reward = Some(best_avg_reward.map_or(avg_reward, |best| best.max(avg_reward)));
        outcome.matches_played += space.len() as u64 * u64::from(matches_per_pair);

        let completed = done + 1;
        if completed % PROGRESS_INTERVAL == 0 || completed == shard.len() {
            on_progress(&ShardProgress {
                completed: completed as u64,
                total,
                matches_played: outcome.matches_played,
                best_avg_reward,
            })?;
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttackStyle, DefenderType, DefenseStyle, Formation, ForwardType, MidfielderType};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn tiny_space() -> TacticSpace {
        TacticSpace {
            formations: vec![Formation::F442, Formation::F433],
            attack_strategies: vec![AttackStyle::Possession, AttackStyle::LongBall],
            defense_strategies: vec![DefenseStyle::Retreat],
            forward_archetypes: vec![ForwardType::Speed],
            midfielder_archetypes: vec![MidfielderType::Box2Box],
            defender_archetypes: vec![DefenderType::Stopper],
        }
    }

    #[test]
    fn shard_plays_every_opponent_matches_per_pair_times() {
        let space = tiny_space();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut reports = Vec::new();
        let outcome = evaluate_shard(&space, 2..5, 3, &mut rng, &CancelToken::new(), |p| {
            reports.push(*p);
            Ok(())
        })
        .expect("shard completes");
        assert_eq!(outcome.stats.len(), 3);
        assert_eq!(outcome.matches_played, 3 * 8 * 3);
        for stats in outcome.stats.values() {
            assert_eq!(stats.matches, 8 * 3);
            assert_eq!(stats.wins + stats.draws + stats.losses, stats.matches);
        }
        assert_eq!(reports.last().map(|p| p.completed), Some(3));
    }

    #[test]
    fn cancelled_shard_returns_cancelled() {
        let space = tiny_space();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = SmallRng::seed_from_u64(2);
        let result = evaluate_shard(&space, 0..8, 1, &mut rng, &cancel, |_| Ok(()));
        assert!(matches!(result, Err(SearchError::Cancelled)));
    }
}
