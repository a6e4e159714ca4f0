pub mod exhaustive;
pub mod genetic;
pub mod qlearning;
pub mod qtable;
pub mod ranking;
pub mod stats;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::catalog::{RawTactic, Tactic, TacticSpace};
use crate::error::{SearchError, TacticError};
use crate::optimizer::qlearning::{AgentStats, QLearningAgent, QLearningConfig};
use crate::optimizer::ranking::RankedTactic;
use crate::sim::{simulate_match, MatchResult};

/// Entries in a training report's ranking.
pub const TRAINING_RANKING_SIZE: usize = 15;

/// Validates both sides before any simulation work, then plays one match.
pub fn run_single_match(home: RawTactic, away: RawTactic) -> Result<MatchResult, TacticError> {
    let home = Tactic::try_from(home)?;
    let away = Tactic::try_from(away)?;
    Ok(simulate_match(&home, &away))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub total_episodes: usize,
    pub ranking: Vec<RankedTactic>,
    pub best_tactic: Option<RankedTactic>,
    /// What the agent would play next from its last state with exploration off.
    pub greedy_tactic: Option<Tactic>,
    pub stats: AgentStats,
}

impl TrainingReport {
    pub fn from_agent(agent: &QLearningAgent) -> Self {
        let mut ranking = agent.episode_ranking();
        ranking.truncate(TRAINING_RANKING_SIZE);
        let greedy_tactic = agent
            .history()
            .last()
            .and_then(|last| agent.greedy_action(&qtable::State(last.action)))
            .map(|action| action.0);
        Self {
            total_episodes: agent.history().len(),
            best_tactic: ranking.first().cloned(),
            ranking,
            greedy_tactic,
            stats: agent.stats(),
        }
    }
}

/// Trains a fresh agent for `episodes` chained episodes and summarises the run.
pub fn run_online_training(
    episodes: usize,
    config: QLearningConfig,
    space: TacticSpace,
) -> Result<TrainingReport, SearchError> {
    let mut agent = QLearningAgent::new(config, space)?;
    agent.train(episodes, &mut SmallRng::from_rng(&mut rand::rng()));
    tracing::info!(
        episodes,
        epsilon = agent.epsilon(),
        states = agent.table().len(),
        "online training finished"
    );
    Ok(TrainingReport::from_agent(&agent))
}
