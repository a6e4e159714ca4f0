//! Global progress over a set of workers that report at their own cadence.

use std::time::Instant;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// 0–100.
    pub percent_complete: f64,
    pub completed_units: u64,
    pub total_units: u64,
    pub elapsed_seconds: f64,
    pub best_fitness_so_far: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct WorkerProgress {
    completed: u64,
    total: u64,
}

/// Percent complete is `sum(completed) / sum(total)` over all workers, using each
/// worker's latest report. Reports may arrive in any order and at any cadence; a
/// worker's completed count never moves backwards.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    workers: Vec<WorkerProgress>,
    best_fitness: Option<f64>,
    started: Instant,
}

impl ProgressTracker {
    /// `totals[i]` is the expected work for worker `i`.
    pub fn new(totals: &[u64]) -> Self {
        Self {
            workers: totals
                .iter()
                .map(|&total| WorkerProgress { completed: 0, total })
                .collect(),
            best_fitness: None,
            started: Instant::now(),
        }
    }

    pub fn update(
        &mut self,
        worker_id: usize,
        completed: u64,
        total: u64,
        best_fitness: Option<f64>,
    ) -> ProgressEvent {
        if worker_id >= self.workers.len() {
            self.workers.resize(worker_id + 1, WorkerProgress::default());
        }
        let worker = &mut self.workers[worker_id];
        worker.total = total.max(worker.total);
        worker.completed = completed.max(worker.completed).min(worker.total);
        if let Some(fitness) = best_fitness {
            self.best_fitness = Some(self.best_fitness.map_or(fitness, |best| best.max(fitness)));
        }
        self.snapshot()
    }

    /// Marks `worker_id` as done regardless of what it last reported.
    pub fn finish(&mut self, worker_id: usize) {
        if let Some(worker) = self.workers.get_mut(worker_id) {
            worker.completed = worker.total;
        }
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.best_fitness
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn snapshot(&self) -> ProgressEvent {
        let completed_units: u64 = self.workers.iter().map(|w| w.completed).sum();
        let total_units: u64 = self.workers.iter().map(|w| w.total).sum();
        let percent_complete = if total_units == 0 {
            0.0
        } else {
            completed_units as f64 * 100.0 / total_units as f64
        };
        ProgressEvent {
            percent_complete,
            completed_units,
            total_units,
            elapsed_seconds: self.elapsed_seconds(),
            best_fitness_so_far: self.best_fitness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_sum_over_sum() {
        let mut tracker = ProgressTracker::new(&[100, 300]);
        tracker.update(0, 50, 100, None);
        let event = tracker.update(1, 150, 300, Some(1.5));
        assert_eq!(event.completed_units, 200);
        assert_eq!(event.total_units, 400);
        assert!((event.percent_complete - 50.0).abs() < 1e-12);
        assert_eq!(event.best_fitness_so_far, Some(1.5));
    }

    #[test]
    fn ragged_and_stale_reports_are_tolerated() {
        let mut tracker = ProgressTracker::new(&[10, 10]);
        tracker.update(1, 8, 10, Some(2.0));
        tracker.update(1, 3, 10, Some(0.5));
        let event = tracker.update(0, 20, 10, None);
        assert_eq!(event.completed_units, 18);
        assert_eq!(event.best_fitness_so_far, Some(2.0));
        assert!(event.percent_complete <= 100.0);
    }

    #[test]
    fn finish_completes_a_silent_worker() {
        let mut tracker = ProgressTracker::new(&[5, 5]);
        tracker.finish(0);
        tracker.finish(1);
        assert!((tracker.snapshot().percent_complete - 100.0).abs() < 1e-12);
    }
}
