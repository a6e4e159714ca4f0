use std::collections::HashSet;
use std::sync::Arc;

use futures_util::StreamExt;

use tactician::catalog::{
    AttackStyle, DefenderType, DefenseStyle, Formation, ForwardType, MidfielderType, TacticSpace,
};
use tactician::error::SearchError;
use tactician::optimizer::genetic::GeneticConfig;
use tactician::parallel::{
    run_job, run_search, CancelToken, ProgressEvent, SearchConfig, SearchMode, WorkerContext,
    WorkerJob, WorkerOutput, WorkerReport,
};
use tactician::server::stream::{search_event_stream, SearchEvent};

fn tiny_space() -> TacticSpace {
    TacticSpace {
        formations: vec![Formation::F442, Formation::F433],
        attack_strategies: vec![AttackStyle::Possession, AttackStyle::LongBall],
        defense_strategies: vec![DefenseStyle::Retreat, DefenseStyle::HighPress],
        forward_archetypes: vec![ForwardType::Speed],
        midfielder_archetypes: vec![MidfielderType::Box2Box],
        defender_archetypes: vec![DefenderType::Stopper],
    }
}

fn population_config(workers: usize) -> SearchConfig {
    SearchConfig {
        mode: SearchMode::Population,
        workers: Some(workers),
        genetic: GeneticConfig {
            population_size: 4,
            generations: 20,
            opponents_per_eval: 2,
            elite_count: 1,
            ..GeneticConfig::default()
        },
        space: tiny_space(),
        ..SearchConfig::default()
    }
}

#[tokio::test]
async fn exhaustive_search_plays_every_pair() {
    let space = tiny_space();
    let config = SearchConfig {
        mode: SearchMode::Exhaustive,
        workers: Some(3),
        matches_per_pair: 2,
        space: space.clone(),
        ..SearchConfig::default()
    };
    let mut events = Vec::new();
    let outcome = run_search(&config, &CancelToken::new(), |event| {
        events.push(*event);
        Ok(())
    })
    .await
    .expect("search completes");

    let n = space.len() as u64;
    assert_eq!(outcome.total_matches, n * n * 2);
    assert_eq!(outcome.worker_count, 3);
    assert_eq!(outcome.ranking.len(), space.len());
    let distinct: HashSet<_> = outcome.ranking.iter().map(|entry| entry.tactic).collect();
    assert_eq!(distinct.len(), space.len());
    for entry in &outcome.ranking {
        assert_eq!(entry.sample_count, n * 2);
    }
    assert_eq!(outcome.best_tactic.as_ref(), outcome.ranking.first());
    let last = events.last().expect("at least one progress event");
    assert_eq!(last.percent_complete, 100.0);
}

#[tokio::test]
async fn population_search_reports_once_per_island_generation() {
    let config = population_config(4);
    let mut events: Vec<ProgressEvent> = Vec::new();
    let outcome = run_search(&config, &CancelToken::new(), |event| {
        events.push(*event);
        Ok(())
    })
    .await
    .expect("search completes");

    assert_eq!(events.len(), 4 * 20);
    for pair in events.windows(2) {
        assert!(pair[1].percent_complete >= pair[0].percent_complete);
        assert!(pair[1].completed_units >= pair[0].completed_units);
    }
    assert!(events.iter().all(|event| event.percent_complete <= 100.0));

    assert_eq!(outcome.worker_count, 4);
    assert_eq!(outcome.total_matches, 4 * 20 * 4 * 2);
    let best = outcome.best_tactic.expect("islands produce a best tactic");
    assert!(tiny_space().contains(&best.tactic));
    assert!(outcome
        .ranking
        .iter()
        .any(|entry| entry.tactic == best.tactic));
}

#[tokio::test]
async fn cancelled_search_returns_cancelled() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = run_search(&population_config(2), &cancel, |_| Ok(())).await;
    assert!(matches!(result, Err(SearchError::Cancelled)));
}

#[tokio::test]
async fn failing_progress_consumer_stops_the_search() {
    let result = run_search(&population_config(2), &CancelToken::new(), |_| {
        Err(SearchError::StreamWrite)
    })
    .await;
    assert!(matches!(result, Err(SearchError::StreamWrite)));
}

struct PanickingJob;

impl WorkerJob for PanickingJob {
    fn worker_count(&self) -> usize {
        3
    }

    fn expected_units(&self, _worker_id: usize) -> u64 {
        10
    }

    fn run(&self, ctx: &WorkerContext) -> Result<WorkerOutput, SearchError> {
        if ctx.worker_id() == 1 {
            panic!("worker exploded");
        }
        ctx.report(WorkerReport {
            completed: 10,
            total: 10,
            best_fitness: Some(1.0),
        })?;
        Ok(WorkerOutput::default())
    }
}

#[tokio::test]
async fn worker_panic_fails_the_whole_job() {
    let cancel = CancelToken::new();
    let result = run_job(Arc::new(PanickingJob), &cancel, |_| Ok(())).await;
    match result {
        Err(SearchError::WorkerFailure { worker_id, reason }) => {
            assert_eq!(worker_id, 1);
            assert!(reason.contains("worker exploded"));
        }
        other => panic!("expected worker failure, got {other:?}"),
    }
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn event_stream_ends_with_a_single_done_record() {
    let config = SearchConfig {
        mode: SearchMode::Exhaustive,
        workers: Some(2),
        ranking_size: 3,
        space: tiny_space(),
        ..SearchConfig::default()
    };
    let events: Vec<SearchEvent> = search_event_stream(config).collect().await;

    let (last, rest) = events.split_last().expect("stream is not empty");
    assert!(rest.iter().all(|event| matches!(event, SearchEvent::Progress(_))));
    let SearchEvent::Done(summary) = last else {
        panic!("expected done, got {last:?}");
    };
    assert_eq!(summary.ranking.len(), 3);
    assert_eq!(summary.total_matches, 64);
    assert_eq!(summary.worker_count, 2);
    assert!(summary.elapsed_seconds >= 0.0);
}
