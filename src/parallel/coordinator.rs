//! Fans a search out to rayon workers and folds their messages back in.
//!
//! Workers own their state and talk to the coordinator only through a bounded channel:
//! progress reports while running, then exactly one `Finished` message carrying either a
//! complete partial result or an error. The coordinator merges partial results and
//! forwards aggregated progress; it is the only code in a search that awaits.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::catalog::{Tactic, TacticSpace};
use crate::error::SearchError;
use crate::optimizer::exhaustive::evaluate_shard;
use crate::optimizer::genetic::{GeneticConfig, Island};
use crate::optimizer::ranking::{rank_results, RankedTactic};
use crate::optimizer::stats::TacticStats;
use crate::parallel::pool::{WorkerPool, DEFAULT_MAX_WORKERS};
use crate::parallel::progress::{ProgressEvent, ProgressTracker};
use crate::parallel::{batch_ranges, CancelToken};

/// Ranking entries included in a finished search's summary.
pub const DEFAULT_RANKING_SIZE: usize = 30;
/// Per-worker slack in the progress channel before workers block.
const CHANNEL_SLOTS_PER_WORKER: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Independent GA islands, final populations merged.
    #[default]
    Population,
    /// Every tactic against every tactic, sharded across workers.
    Exhaustive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    pub mode: SearchMode,
    /// `None` runs one worker per logical CPU.
    pub workers: Option<usize>,
    /// Upper bound on workers; set from the process configuration, not from requests.
    #[serde(skip)]
    pub max_workers: usize,
    /// Exhaustive mode only.
    pub matches_per_pair: u32,
    pub ranking_size: usize,
    /// Population mode only.
    pub genetic: GeneticConfig,
    pub space: TacticSpace,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Population,
            workers: None,
            max_workers: DEFAULT_MAX_WORKERS,
            matches_per_pair: 1,
            ranking_size: DEFAULT_RANKING_SIZE,
            genetic: GeneticConfig::default(),
            space: TacticSpace::full(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.workers == Some(0) {
            return Err(SearchError::InvalidConfig("workers must be at least 1".to_string()));
        }
        if self.matches_per_pair == 0 {
            return Err(SearchError::InvalidConfig(
                "matchesPerPair must be at least 1".to_string(),
            ));
        }
        if self.ranking_size == 0 {
            return Err(SearchError::InvalidConfig(
                "rankingSize must be at least 1".to_string(),
            ));
        }
        self.space.validate()?;
        self.genetic.validate()
    }

    pub fn pool(&self) -> WorkerPool {
        match self.workers {
            Some(n) => WorkerPool::with_workers(n, self.max_workers),
            None => WorkerPool::default_workers(self.max_workers),
        }
    }
}

/// Progress as reported by one worker, in that worker's own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerReport {
    pub completed: u64,
    pub total: u64,
    pub best_fitness: Option<f64>,
}

/// A worker's complete partial result.
#[derive(Debug, Clone, Default)]
pub struct WorkerOutput {
    pub stats: HashMap<Tactic, TacticStats>,
    pub matches_played: u64,
}

enum WorkerMessage {
    Progress {
        worker_id: usize,
        report: WorkerReport,
    },
    Finished {
        worker_id: usize,
        result: Result<WorkerOutput, SearchError>,
    },
}

/// Handle a running worker uses to talk to the coordinator.
pub struct WorkerContext {
    worker_id: usize,
    sender: mpsc::Sender<WorkerMessage>,
    cancel: CancelToken,
}

impl WorkerContext {
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Sends a progress report, blocking while the channel is full. Fails once the search
    /// has been cancelled or the coordinator is gone.
    pub fn report(&self, report: WorkerReport) -> Result<(), SearchError> {
        self.cancel.check()?;
        self.sender
            .blocking_send(WorkerMessage::Progress {
                worker_id: self.worker_id,
                report,
            })
            .map_err(|_| SearchError::Cancelled)
    }
}

/// Work that can be split across a fixed number of workers.
pub trait WorkerJob: Send + Sync + 'static {
    fn worker_count(&self) -> usize;

    /// Units `worker_id` is expected to report against.
    fn expected_units(&self, worker_id: usize) -> u64;

    fn run(&self, ctx: &WorkerContext) -> Result<WorkerOutput, SearchError>;
}

/// One GA island per worker.
#[derive(Debug, Clone)]
pub struct PopulationJob {
    pub config: GeneticConfig,
    pub space: TacticSpace,
    pub islands: usize,
}

impl WorkerJob for PopulationJob {
    fn worker_count(&self) -> usize {
        self.islands
    }

    fn expected_units(&self, _worker_id: usize) -> u64 {
        self.config.total_evaluations() * self.config.opponents_per_eval as u64
    }

    fn run(&self, ctx: &WorkerContext) -> Result<WorkerOutput, SearchError> {
        let mut rng = SmallRng::from_rng(&mut rand::rng());
        let island = Island::new(self.config.clone(), self.space.clone(), &mut rng)?;
        let total = self.expected_units(ctx.worker_id());
        let outcome = island.run(&mut rng, ctx.cancel_token(), |report| {
            ctx.report(WorkerReport {
                completed: report.matches_played,
                total,
                best_fitness: Some(report.best_fitness_so_far),
            })
        })?;
        tracing::debug!(
            worker_id = ctx.worker_id(),
            best_fitness = outcome.best.fitness,
            best = %outcome.best.tactic,
            "island finished"
        );
        Ok(WorkerOutput {
            stats: outcome.population_stats(),
            matches_played: outcome.matches_played,
        })
    }
}

/// Contiguous shards of the enumerated space, one per worker.
#[derive(Debug, Clone)]
pub struct ExhaustiveJob {
    pub space: TacticSpace,
    pub shards: Vec<(usize, usize)>,
    pub matches_per_pair: u32,
}

impl ExhaustiveJob {
    pub fn new(space: TacticSpace, workers: usize, matches_per_pair: u32) -> Self {
        let shards = batch_ranges(space.len(), workers);
        Self {
            space,
            shards,
            matches_per_pair,
        }
    }
}

impl WorkerJob for ExhaustiveJob {
    fn worker_count(&self) -> usize {
        self.shards.len()
    }

    fn expected_units(&self, worker_id: usize) -> u64 {
        self.shards
            .get(worker_id)
            .map_or(0, |(start, end)| (end - start) as u64)
    }

    fn run(&self, ctx: &WorkerContext) -> Result<WorkerOutput, SearchError> {
        let (start, end) = self.shards.get(ctx.worker_id()).copied().ok_or_else(|| {
            SearchError::InvalidConfig(format!("no shard for worker {}", ctx.worker_id()))
        })?;
        let mut rng = SmallRng::from_rng(&mut rand::rng());
        let outcome = evaluate_shard(
            &self.space,
            start..end,
            self.matches_per_pair,
            &mut rng,
            ctx.cancel_token(),
            |progress| {
                ctx.report(WorkerReport {
                    completed: progress.completed,
                    total: progress.total,
                    best_fitness: progress.best_avg_reward,
                })
            },
        )?;
        Ok(WorkerOutput {
            stats: outcome.stats,
            matches_played: outcome.matches_played,
        })
    }
}

/// Merged result of every worker.
#[derive(Debug, Clone, Default)]
pub struct JobOutcome {
    pub stats: HashMap<Tactic, TacticStats>,
    pub matches_played: u64,
    pub worker_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub mode: SearchMode,
    /// Every evaluated tactic, best first.
    pub ranking: Vec<RankedTactic>,
    pub total_matches: u64,
    pub worker_count: usize,
    pub elapsed_seconds: f64,
    pub best_tactic: Option<RankedTactic>,
}

impl SearchOutcome {
    pub fn top(&self, n: usize) -> &[RankedTactic] {
        &self.ranking[..n.min(self.ranking.len())]
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Keeps the first real failure; a later non-cancellation error replaces a cancellation.
fn record_failure(slot: &mut Option<SearchError>, err: SearchError) {
    match slot {
        None => *slot = Some(err),
        Some(SearchError::Cancelled) if !matches!(err, SearchError::Cancelled) => *slot = Some(err),
        Some(_) => {}
    }
}

/// Runs `job` on a dedicated pool with one thread per worker.
///
/// `on_progress` receives one aggregated event per worker report. If it fails, or any
/// worker fails, `cancel` is tripped so the remaining workers stop early and the first
/// failure is returned.
pub async fn run_job<F>(
    job: Arc<dyn WorkerJob>,
    cancel: &CancelToken,
    mut on_progress: F,
) -> Result<JobOutcome, SearchError>
where
    F: FnMut(&ProgressEvent) -> Result<(), SearchError>,
{
    let workers = job.worker_count();
    if workers == 0 {
        return Err(SearchError::InvalidConfig("search has no work to split".to_string()));
    }
    let pool = WorkerPool::with_workers(workers, workers).build()?;
    let (sender, mut receiver) = mpsc::channel(workers * CHANNEL_SLOTS_PER_WORKER);
    let totals: Vec<u64> = (0..workers).map(|id| job.expected_units(id)).collect();
    let mut tracker = ProgressTracker::new(&totals);

    for worker_id in 0..workers {
        let job = Arc::clone(&job);
        let ctx = WorkerContext {
            worker_id,
            sender: sender.clone(),
            cancel: cancel.clone(),
        };
        pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| job.run(&ctx)))
                .unwrap_or_else(|payload| {
                    Err(SearchError::WorkerFailure {
                        worker_id,
                        reason: panic_reason(payload.as_ref()),
                    })
                });
            // The coordinator only drops the receiver after every sender is gone.
            let _ = ctx
                .sender
                .blocking_send(WorkerMessage::Finished { worker_id, result });
        });
    }
    drop(sender);

    let mut finished = vec![false; workers];
    let mut merged: HashMap<Tactic, TacticStats> = HashMap::new();
    let mut matches_played = 0u64;
    let mut failure: Option<SearchError> = None;

    while let Some(message) = receiver.recv().await {
        match message {
            WorkerMessage::Progress { worker_id, report } => {
                if failure.is_some() {
                    continue;
                }
                let event =
                    tracker.update(worker_id, report.completed, report.total, report.best_fitness);
                if let Err(err) = on_progress(&event) {
                    tracing::warn!(error = %err, "progress consumer failed; stopping workers");
                    cancel.cancel();
                    record_failure(&mut failure, err);
                }
            }
            WorkerMessage::Finished { worker_id, result } => {
                if let Some(flag) = finished.get_mut(worker_id) {
                    *flag = true;
                }
                match result {
                    Ok(output) => {
                        tracker.finish(worker_id);
                        matches_played += output.matches_played;
                        for (tactic, stats) in output.stats {
                            merged.entry(tactic).or_default().merge(&stats);
                        }
                    }
                    Err(err) => {
                        if !matches!(err, SearchError::Cancelled) {
                            tracing::error!(worker_id, error = %err, "worker failed");
                        }
                        cancel.cancel();
                        record_failure(&mut failure, err);
                    }
                }
            }
        }
    }

    if let Some(worker_id) = finished.iter().position(|done| !done) {
        record_failure(
            &mut failure,
            SearchError::WorkerFailure {
                worker_id,
                reason: "exited without a result".to_string(),
            },
        );
    }
    if let Some(err) = failure {
        return Err(err);
    }
    Ok(JobOutcome {
        stats: merged,
        matches_played,
        worker_count: workers,
    })
}

/// Runs a whole search described by `config` and ranks the merged results.
pub async fn run_search<F>(
    config: &SearchConfig,
    cancel: &CancelToken,
    on_progress: F,
) -> Result<SearchOutcome, SearchError>
where
    F: FnMut(&ProgressEvent) -> Result<(), SearchError>,
{
    config.validate()?;
    let started = Instant::now();
    let workers = config.pool().worker_count();
    let job: Arc<dyn WorkerJob> = match config.mode {
        SearchMode::Population => Arc::new(PopulationJob {
            config: config.genetic.clone(),
            space: config.space.clone(),
            islands: workers,
        }),
        SearchMode::Exhaustive => Arc::new(ExhaustiveJob::new(
            config.space.clone(),
            workers,
            config.matches_per_pair,
        )),
    };
    tracing::info!(
        mode = ?config.mode,
        workers = job.worker_count(),
        space = config.space.len(),
        "search started"
    );

    let outcome = match run_job(job, cancel, on_progress).await {
        Ok(outcome) => outcome,
        Err(SearchError::Cancelled) => {
            tracing::info!("search cancelled");
            return Err(SearchError::Cancelled);
        }
        Err(err) => return Err(err),
    };
    let ranking = rank_results(outcome.stats);
    let elapsed_seconds = started.elapsed().as_secs_f64();
    tracing::info!(
        elapsed_seconds,
        total_matches = outcome.matches_played,
        ranked = ranking.len(),
        "search finished"
    );
    Ok(SearchOutcome {
        mode: config.mode,
        best_tactic: ranking.first().cloned(),
        ranking,
        total_matches: outcome.matches_played,
        worker_count: outcome.worker_count,
        elapsed_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_validation() {
        let config = SearchConfig::default();
        assert_eq!(config.mode, SearchMode::Population);
        assert_eq!(config.ranking_size, 30);
        assert!(config.validate().is_ok());
        let bad = SearchConfig {
            matches_per_pair: 0,
            ..SearchConfig::default()
        };
        assert!(matches!(bad.validate(), Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn config_parses_camel_case_json() {
        let config: SearchConfig = serde_json::from_str(
            r#"{"mode":"exhaustive","matchesPerPair":2,"workers":3,"genetic":{"populationSize":10}}"#,
        )
        .expect("config parses");
        assert_eq!(config.mode, SearchMode::Exhaustive);
        assert_eq!(config.matches_per_pair, 2);
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.genetic.population_size, 10);
        assert_eq!(config.genetic.generations, 20);
        assert_eq!(config.max_workers, DEFAULT_MAX_WORKERS);
    }

    #[test]
    fn panic_payloads_become_reasons() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_reason(payload.as_ref()), "panicked: boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_reason(payload.as_ref()), "panicked: bang");
    }

    #[test]
    fn real_failures_outrank_cancellation() {
        let mut slot = None;
        record_failure(&mut slot, SearchError::Cancelled);
        record_failure(&mut slot, SearchError::StreamWrite);
        record_failure(&mut slot, SearchError::Cancelled);
        assert!(matches!(slot, Some(SearchError::StreamWrite)));
    }
}
