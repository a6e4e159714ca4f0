//! Tabular Q-learning where both the state and the action are tactics: the state is the
//! tactic currently in use and the action is the tactic to play next.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Tactic, TacticSpace};
use crate::error::SearchError;
use crate::optimizer::qtable::{Action, QTable, State};
use crate::optimizer::ranking::{rank_results, RankedTactic};
use crate::optimizer::stats::TacticStats;
use crate::reward::reward;
use crate::sim::{simulate_match_with, MatchResult, Outcome, Side};

/// Episodes in the "recent" window of [`AgentStats`].
pub const RECENT_WINDOW: usize = 50;
/// Episodes per point of the rolling win-rate curve.
pub const ROLLING_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QLearningConfig {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Starting exploration rate.
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    /// Maximum state rows kept; `None` lets the table grow without bound.
    pub table_capacity: Option<usize>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.05,
            table_capacity: Some(4096),
        }
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        let invalid = |message: &str| Err(SearchError::InvalidConfig(message.to_string()));
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return invalid("alpha must be within (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return invalid("gamma must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return invalid("epsilon must be within [0, 1]");
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return invalid("epsilonDecay must be within (0, 1]");
        }
        if !(0.0..=self.epsilon).contains(&self.epsilon_min) {
            return invalid("epsilonMin must be within [0, epsilon]");
        }
        if self.table_capacity == Some(0) {
            return invalid("tableCapacity must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// 1-based.
    pub episode: usize,
    pub state: Tactic,
    pub action: Tactic,
    pub opponent: Tactic,
    /// The action's tactic played at home.
    pub result: MatchResult,
    pub reward: f64,
    /// Exploration rate after this episode's decay.
    pub epsilon: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionValue {
    pub tactic: Tactic,
    pub q_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestStrategy {
    pub tactic: Tactic,
    pub q_value: f64,
    pub best_episode: Option<Episode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub total_episodes: usize,
    pub epsilon: f64,
    pub table_states: usize,
    pub table_entries: usize,
    pub recent_win_rate: f64,
    pub recent_avg_reward: f64,
    pub reward_history: Vec<f64>,
    pub rolling_win_rate: Vec<f64>,
}

pub struct QLearningAgent {
    config: QLearningConfig,
    space: TacticSpace,
    table: QTable,
    epsilon: f64,
    history: Vec<Episode>,
}

impl QLearningAgent {
    pub fn new(config: QLearningConfig, space: TacticSpace) -> Result<Self, SearchError> {
        config.validate()?;
        space.validate()?;
        Ok(Self {
            table: QTable::new(config.table_capacity),
            epsilon: config.epsilon,
            config,
            space,
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn space(&self) -> &TacticSpace {
        &self.space
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn history(&self) -> &[Episode] {
        &self.history
    }

    /// Epsilon-greedy choice for `state`.
    pub fn select_action<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> Action {
        if rng.random::<f64>() < self.epsilon {
            return Action(self.space.random(rng));
        }
        self.table
            .greedy_action(state, &self.space)
            .unwrap_or_else(|| Action(self.space.random(rng)))
    }

    /// Best known action for `state`, ignoring exploration.
    pub fn greedy_action(&self, state: &State) -> Option<Action> {
        self.table.greedy_action(state, &self.space)
    }

    /// Plays one episode from `state` and applies the Q-learning update.
    pub fn step<R: Rng + ?Sized>(&mut self, state: State, rng: &mut R) -> &Episode {
        let action = self.select_action(&state, rng);
        let opponent = self.space.random(rng);
        let result = simulate_match_with(&action.0, &opponent, rng);
        let gained = reward(&result, Side::Home);

        let next = State(action.0);
        let next_best = self.table.max_value(&next, self.space.len());
        let current = self.table.get(&state, &action);
        let updated = current + self.config.alpha * (gained + self.config.gamma * next_best - current);
        self.table.set(state, action, updated);

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        let episode = Episode {
            episode: self.history.len() + 1,
            state: state.0,
            action: action.0,
            opponent,
            result,
            reward: gained,
            epsilon: self.epsilon,
        };
        self.history.push(episode);
        &self.history[self.history.len() - 1]
    }

    /// Runs `episodes` chained steps. The first state continues from the last recorded
    /// action, or is drawn at random for a fresh agent.
    pub fn train<R: Rng + ?Sized>(&mut self, episodes: usize, rng: &mut R) {
        let mut state = match self.history.last() {
            Some(last) => State(last.action),
            None => State(self.space.random(rng)),
        };
        for _ in 0..episodes {
            state = State(self.step(state, rng).action);
        }
    }

    /// Highest stored value anywhere in the table, with the best single episode.
    pub fn best_strategy(&self) -> Option<BestStrategy> {
        let (_, action, q_value) = self
            .table
            .iter()
            .max_by(|left, right| left.2.total_cmp(&right.2))?;
        let best_episode = self
            .history
            .iter()
            .max_by(|left, right| left.reward.total_cmp(&right.reward))
            .cloned();
        Some(BestStrategy {
            tactic: action.0,
            q_value,
            best_episode,
        })
    }

    /// Actions ranked by their highest value over all states.
    pub fn strategy_ranking(&self, top_n: usize) -> Vec<ActionValue> {
        let mut best: HashMap<Action, f64> = HashMap::new();
        for (_, action, value) in self.table.iter() {
            best.entry(*action)
                .and_modify(|current| *current = current.max(value))
                .or_insert(value);
        }
        let mut ranked: Vec<ActionValue> = best
            .into_iter()
            .map(|(action, q_value)| ActionValue {
                tactic: action.0,
                q_value,
            })
            .collect();
        ranked.sort_by(|left, right| {
            right
                .q_value
                .total_cmp(&left.q_value)
                .then_with(|| left.tactic.cmp(&right.tactic))
        });
        ranked.truncate(top_n);
        ranked
    }

    /// Per-action aggregates over the episode history, ranked by average reward.
    pub fn episode_ranking(&self) -> Vec<RankedTactic> {
        let mut per_action: HashMap<Tactic, TacticStats> = HashMap::new();
        for episode in &self.history {
            per_action
                .entry(episode.action)
                .or_default()
                .record(&episode.result.view(Side::Home), episode.reward);
        }
        rank_results(per_action)
    }

    pub fn stats(&self) -> AgentStats {
        let won = |episode: &Episode| episode.result.view(Side::Home).outcome == Outcome::Win;
        let recent = &self.history[self.history.len().saturating_sub(RECENT_WINDOW)..];
        let (recent_win_rate, recent_avg_reward) = if recent.is_empty() {
            (0.0, 0.0)
        } else {
            let n = recent.len() as f64;
            (
                recent.iter().filter(|episode| won(episode)).count() as f64 / n,
                recent.iter().map(|episode| episode.reward).sum::<f64>() / n,
            )
        };
        let rolling_win_rate = self
            .history
            .chunks(ROLLING_WINDOW)
            .map(|window| {
                window.iter().filter(|episode| won(episode)).count() as f64 / window.len() as f64
            })
            .collect();
        AgentStats {
            total_episodes: self.history.len(),
            epsilon: self.epsilon,
            table_states: self.table.len(),
            table_entries: self.table.entries(),
            recent_win_rate,
            recent_avg_reward,
            reward_history: self.history.iter().map(|episode| episode.reward).collect(),
            rolling_win_rate,
        }
    }

    /// Forgets everything learned and restores the configured exploration rate.
    pub fn reset(&mut self) {
        self.table.clear();
        self.history.clear();
        self.epsilon = self.config.epsilon;
    }

    /// Applies new hyper-parameters. The exploration rate restarts from the new `epsilon`
    /// and the table is shrunk if the new capacity is smaller.
    pub fn update_params(&mut self, config: QLearningConfig) -> Result<(), SearchError> {
        config.validate()?;
        self.table.set_capacity(config.table_capacity);
        self.epsilon = config.epsilon;
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn agent() -> QLearningAgent {
        QLearningAgent::new(QLearningConfig::default(), TacticSpace::full()).expect("valid config")
    }

    #[test]
    fn update_rule_moves_value_towards_reward() {
        let mut agent = agent();
        let mut rng = SmallRng::seed_from_u64(10);
        let state = State(agent.space().random(&mut rng));
        let episode = agent.step(state, &mut rng).clone();
        // Fresh table: Q = 0 + alpha * (r + gamma * 0 - 0).
        let stored = agent.table().get(&state, &Action(episode.action));
        assert!((stored - 0.1 * episode.reward).abs() < 1e-12);
    }

    #[test]
    fn epsilon_decays_monotonically_to_floor() {
        let mut agent = agent();
        let mut rng = SmallRng::seed_from_u64(11);
        agent.train(700, &mut rng);
        let epsilons: Vec<f64> = agent.history().iter().map(|e| e.epsilon).collect();
        assert!(epsilons.windows(2).all(|pair| pair[1] <= pair[0]));
        assert!(agent.epsilon() >= 0.05 && agent.epsilon() < 1.0);
        assert!((agent.epsilon() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn training_chains_states_from_previous_actions() {
        let mut agent = agent();
        let mut rng = SmallRng::seed_from_u64(12);
        agent.train(10, &mut rng);
        let history = agent.history();
        assert!(history
            .windows(2)
            .all(|pair| pair[1].state == pair[0].action));
    }

    #[test]
    fn zero_epsilon_picks_greedy_action() {
        let config = QLearningConfig {
            epsilon: 0.0,
            epsilon_min: 0.0,
            ..QLearningConfig::default()
        };
        let space = TacticSpace::full();
        let agent = QLearningAgent::new(config, space.clone()).expect("valid config");
        let mut rng = SmallRng::seed_from_u64(13);
        let state = State(space.random(&mut rng));
        let first = space.get(0).expect("non-empty");
        assert_eq!(agent.select_action(&state, &mut rng), Action(first));
    }

    #[test]
    fn stats_ranking_and_reset() {
        let mut agent = agent();
        let mut rng = SmallRng::seed_from_u64(14);
        agent.train(60, &mut rng);
        let stats = agent.stats();
        assert_eq!(stats.total_episodes, 60);
        assert_eq!(stats.reward_history.len(), 60);
        assert_eq!(stats.rolling_win_rate.len(), 3);
        assert!((0.0..=1.0).contains(&stats.recent_win_rate));
        assert!(agent.best_strategy().is_some());
        let ranking = agent.strategy_ranking(5);
        assert!(ranking.len() <= 5);
        assert!(ranking.windows(2).all(|pair| pair[0].q_value >= pair[1].q_value));

        agent.reset();
        assert!(agent.history().is_empty());
        assert!(agent.table().is_empty());
        assert_eq!(agent.epsilon(), 1.0);
        assert!(agent.best_strategy().is_none());
    }

    #[test]
    fn update_params_validates() {
        let mut agent = agent();
        let bad = QLearningConfig {
            alpha: 0.0,
            ..QLearningConfig::default()
        };
        assert!(agent.update_params(bad).is_err());
        let smaller = QLearningConfig {
            table_capacity: Some(1),
            epsilon: 0.5,
            ..QLearningConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(15);
        agent.train(5, &mut rng);
        agent.update_params(smaller).expect("valid params");
        assert_eq!(agent.table().len(), 1);
        assert_eq!(agent.epsilon(), 0.5);
    }
}
