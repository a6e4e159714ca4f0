//! Island-model genetic search over tactics.
//!
//! One [`Island`] owns its population and runs on a single worker:
//! evaluate against freshly sampled opponents, keep the elites, then fill the rest by
//! tournament selection, uniform crossover and per-gene mutation. The final population
//! is evaluated but not bred again.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Gene, Tactic, TacticSpace};
use crate::error::SearchError;
use crate::optimizer::stats::TacticStats;
use crate::parallel::CancelToken;
use crate::reward::reward;
use crate::sim::{simulate_match_with, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Opponents sampled per individual per generation; one match each.
    pub opponents_per_eval: usize,
    pub elite_count: usize,
    pub tournament_size: usize,
    /// Probability of taking each gene from the second parent.
    pub crossover_rate: f64,
    /// Probability of redrawing each gene after crossover.
    pub mutation_rate: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 20,
            opponents_per_eval: 20,
            elite_count: 5,
            tournament_size: 3,
            crossover_rate: 0.5,
            mutation_rate: 0.1,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        let invalid = |message: &str| Err(SearchError::InvalidConfig(message.to_string()));
        if self.population_size == 0 {
            return invalid("populationSize must be at least 1");
        }
        if self.generations == 0 {
            return invalid("generations must be at least 1");
        }
        if self.opponents_per_eval == 0 {
            return invalid("opponentsPerEval must be at least 1");
        }
        if self.elite_count > self.population_size {
            return invalid("eliteCount cannot exceed populationSize");
        }
        if self.tournament_size == 0 {
            return invalid("tournamentSize must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return invalid("crossoverRate must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid("mutationRate must be within [0, 1]");
        }
        Ok(())
    }

    /// Individual evaluations performed by one island over a full run.
    pub fn total_evaluations(&self) -> u64 {
        (self.generations * self.population_size) as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub tactic: Tactic,
    pub fitness: f64,
    /// Results from the most recent evaluation only.
    pub stats: TacticStats,
}

impl Individual {
    fn unevaluated(tactic: Tactic) -> Self {
        Self {
            tactic,
            fitness: f64::NEG_INFINITY,
            stats: TacticStats::default(),
        }
    }
}

/// Emitted after every evaluated generation.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// 1-based.
    pub generation: usize,
    pub completed_evaluations: u64,
    pub total_evaluations: u64,
    pub matches_played: u64,
    pub generation_best: Individual,
    /// Fitness of every individual after evaluation, in population order.
    pub fitness_by_rank: Vec<f64>,
    /// Running maximum over every generation so far.
    pub best_fitness_so_far: f64,
}

#[derive(Debug, Clone)]
pub struct IslandOutcome {
    /// Sorted best first.
    pub population: Vec<Individual>,
    pub best: Individual,
    pub matches_played: u64,
}

impl IslandOutcome {
    /// Final population keyed by tactic; duplicates have their stats summed.
    pub fn population_stats(&self) -> HashMap<Tactic, TacticStats> {
        let mut merged: HashMap<Tactic, TacticStats> = HashMap::new();
        for individual in &self.population {
            merged
                .entry(individual.tactic)
                .or_default()
                .merge(&individual.stats);
        }
        merged
    }
}

#[derive(Debug, Clone)]
pub struct Island {
    config: GeneticConfig,
    space: TacticSpace,
    population: Vec<Individual>,
    best: Option<Individual>,
    generation: usize,
    matches_played: u64,
}

impl Island {
    pub fn new<R: Rng + ?Sized>(
        config: GeneticConfig,
        space: TacticSpace,
        rng: &mut R,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        space.validate()?;
        let population = (0..config.population_size)
            .map(|_| Individual::unevaluated(space.random(rng)))
            .collect();
        Ok(Self {
            config,
            space,
            population,
            best: None,
            generation: 0,
            matches_played: 0,
        })
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn matches_played(&self) -> u64 {
        self.matches_played
    }

    /// Plays every individual against freshly drawn opponents and sorts best first.
    pub fn evaluate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<(), SearchError> {
        for individual in &mut self.population {
            cancel.check()?;
            let mut stats = TacticStats::default();
            for _ in 0..self.config.opponents_per_eval {
                let opponent = self.space.random(rng);
                let result = simulate_match_with(&individual.tactic, &opponent, rng);
                stats.record(&result.view(Side::Home), reward(&result, Side::Home));
            }
            individual.fitness = stats.avg_reward();
            individual.stats = stats;
            self.matches_played += stats.matches;
        }
        self.population
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        self.generation += 1;

        if let Some(leader) = self.population.first() {
            let improved = self
                .best
                .as_ref()
                .map_or(true, |best| leader.fitness > best.fitness);
            if improved {
                self.best = Some(leader.clone());
            }
        }
        Ok(())
    }

    /// Replaces the population with the next generation. Expects a sorted population.
    pub fn breed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let size = self.config.population_size;
        let mut next: Vec<Individual> = self
            .population
            .iter()
            .take(self.config.elite_count)
            .cloned()
            .collect();

        while next.len() < size {
            let (Some(first), Some(second)) = (self.tournament_select(rng), self.tournament_select(rng))
            else {
                break;
            };
            let mut child = first.tactic;
            for gene in Gene::ALL {
                if rng.random::<f64>() < self.config.crossover_rate {
                    child = child.with_gene_from(&second.tactic, gene);
                }
            }
            for gene in Gene::ALL {
                if rng.random::<f64>() < self.config.mutation_rate {
                    child = self.space.redraw_gene(child, gene, rng);
                }
            }
            next.push(Individual::unevaluated(child));
        }
        self.population = next;
    }

    fn tournament_select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Individual> {
        self.population
            .choose_multiple(rng, self.config.tournament_size)
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Runs every generation, calling `on_generation` after each evaluation. An error from
    /// the callback or a tripped `cancel` stops the run.
    pub fn run<R, F>(
        mut self,
        rng: &mut R,
        cancel: &CancelToken,
        mut on_generation: F,
    ) -> Result<IslandOutcome, SearchError>
    where
        R: Rng + ?Sized,
        F: FnMut(&GenerationReport) -> Result<(), SearchError>,
    {
        let generations = self.config.generations;
        for generation in 0..generations {
            self.evaluate(rng, cancel)?;
            let (Some(leader), Some(best)) = (self.population.first(), self.best.as_ref()) else {
                return Err(SearchError::InvalidConfig("empty population".to_string()));
            };
            on_generation(&GenerationReport {
                generation: generation + 1,
                completed_evaluations: ((generation + 1) * self.config.population_size) as u64,
                total_evaluations: self.config.total_evaluations(),
                matches_played: self.matches_played,
                generation_best: leader.clone(),
                fitness_by_rank: self.population.iter().map(|individual| individual.fitness).collect(),
                best_fitness_so_far: best.fitness,
            })?;
            if generation + 1 < generations {
                self.breed(rng);
            }
        }
        let best = self
            .best
            .take()
            .ok_or_else(|| SearchError::InvalidConfig("empty population".to_string()))?;
        Ok(IslandOutcome {
            population: self.population,
            best,
            matches_played: self.matches_played,
        })
    }
}
