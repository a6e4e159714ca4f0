//! Newline-delimited JSON framing for long-running searches.
//!
//! A search streams zero or more `progress` records followed by exactly one terminal
//! record (`done`, `error` or `cancelled`). Progress is coalesced: a slow reader sees
//! the latest snapshot rather than a backlog.

use futures_util::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use crate::error::SearchError;
use crate::optimizer::ranking::RankedTactic;
use crate::parallel::{run_search, CancelToken, ProgressEvent, SearchConfig, SearchMode, SearchOutcome};

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub mode: SearchMode,
    pub ranking: Vec<RankedTactic>,
    pub total_matches: u64,
    pub worker_count: usize,
    pub elapsed_seconds: f64,
    pub best_tactic: Option<RankedTactic>,
}

impl SearchSummary {
    pub fn new(outcome: &SearchOutcome, ranking_size: usize) -> Self {
        Self {
            mode: outcome.mode,
            ranking: outcome.top(ranking_size).to_vec(),
            total_matches: outcome.total_matches,
            worker_count: outcome.worker_count,
            elapsed_seconds: outcome.elapsed_seconds,
            best_tactic: outcome.best_tactic.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchEvent {
    Progress(ProgressEvent),
    Done(SearchSummary),
    Error { message: String },
    Cancelled { message: String },
}

impl SearchEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }

    /// One JSON record followed by `\n`.
    pub fn encode_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Terminal record for a finished search.
    pub fn from_result(result: Result<SearchOutcome, SearchError>, ranking_size: usize) -> Self {
        match result {
            Ok(outcome) => Self::Done(SearchSummary::new(&outcome, ranking_size)),
            Err(SearchError::Cancelled) => Self::Cancelled {
                message: SearchError::Cancelled.to_string(),
            },
            Err(err) => Self::Error {
                message: err.to_string(),
            },
        }
    }
}

/// Incremental NDJSON reader. Chunks may split records anywhere, including inside a
/// multi-byte character; only complete lines are decoded.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and decodes every record it completes. Blank lines are skipped.
    pub fn push<T: DeserializeOwned>(&mut self, chunk: &[u8]) -> Result<Vec<T>, serde_json::Error> {
        self.buffer.extend_from_slice(chunk);
        let mut records = Vec::new();
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = line.trim_ascii();
            if !line.is_empty() {
                records.push(serde_json::from_slice(line)?);
            }
        }
        Ok(records)
    }

    /// Decodes a final record that was not newline-terminated, if any.
    pub fn finish<T: DeserializeOwned>(self) -> Result<Option<T>, serde_json::Error> {
        let rest = self.buffer.trim_ascii();
        if rest.is_empty() {
            Ok(None)
        } else {
            serde_json::from_slice(rest).map(Some)
        }
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Trips the search's cancel token if the consumer goes away before the terminal event.
struct CancelOnDrop {
    cancel: CancelToken,
    armed: bool,
}

impl CancelOnDrop {
    fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("search stream dropped before completion; cancelling search");
            self.cancel.cancel();
        }
    }
}

enum StreamState {
    Running {
        task: JoinHandle<Result<SearchOutcome, SearchError>>,
        progress: watch::Receiver<Option<ProgressEvent>>,
        ranking_size: usize,
        guard: CancelOnDrop,
    },
    Finished,
}

enum Wake {
    Joined(Result<Result<SearchOutcome, SearchError>, JoinError>),
    Progress(Result<(), watch::error::RecvError>),
}

fn terminal_event(
    joined: Result<Result<SearchOutcome, SearchError>, JoinError>,
    ranking_size: usize,
) -> SearchEvent {
    match joined {
        Ok(result) => SearchEvent::from_result(result, ranking_size),
        Err(err) => {
            tracing::error!(error = %err, "search task did not complete");
            SearchEvent::Error {
                message: format!("search task failed: {err}"),
            }
        }
    }
}

async fn next_event(state: StreamState) -> Option<(SearchEvent, StreamState)> {
    let StreamState::Running {
        mut task,
        mut progress,
        ranking_size,
        guard,
    } = state
    else {
        return None;
    };

    loop {
        let wake = tokio::select! {
            biased;
            joined = &mut task => Wake::Joined(joined),
            changed = progress.changed() => Wake::Progress(changed),
        };
        match wake {
            Wake::Joined(joined) => {
                guard.disarm();
                return Some((terminal_event(joined, ranking_size), StreamState::Finished));
            }
            Wake::Progress(Ok(())) => {
                let latest = *progress.borrow_and_update();
                if let Some(event) = latest {
                    let state = StreamState::Running {
                        task,
                        progress,
                        ranking_size,
                        guard,
                    };
                    return Some((SearchEvent::Progress(event), state));
                }
            }
            Wake::Progress(Err(_)) => {
                // The sender lives inside the search task, so it is finishing.
                let joined = (&mut task).await;
                guard.disarm();
                return Some((terminal_event(joined, ranking_size), StreamState::Finished));
            }
        }
    }
}

/// Starts `config` on the runtime and returns its event stream. Dropping the stream
/// cancels the search.
pub fn search_event_stream(config: SearchConfig) -> impl Stream<Item = SearchEvent> + Send + 'static {
    let cancel = CancelToken::new();
    let (sender, progress) = watch::channel(None);
    let ranking_size = config.ranking_size;
    let worker_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        run_search(&config, &worker_cancel, |event| {
            sender
                .send(Some(*event))
                .map_err(|_| SearchError::StreamWrite)
        })
        .await
    });

    stream::unfold(
        StreamState::Running {
            task,
            progress,
            ranking_size,
            guard: CancelOnDrop::new(cancel),
        },
        next_event,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(percent: f64) -> SearchEvent {
        SearchEvent::Progress(ProgressEvent {
            percent_complete: percent,
            completed_units: 1,
            total_units: 2,
            elapsed_seconds: 0.5,
            best_fitness_so_far: Some(1.25),
        })
    }

    #[test]
    fn progress_lines_are_tagged_and_newline_terminated() {
        let line = progress(50.0).encode_line().expect("encodes");
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).expect("json");
        assert_eq!(value["type"], "progress");
        assert_eq!(value["percentComplete"], 50.0);
        assert_eq!(value["bestFitnessSoFar"], 1.25);
    }

    #[test]
    fn decoder_reassembles_records_split_across_chunks() {
        let mut bytes = progress(10.0).encode_line().expect("encodes").into_bytes();
        bytes.extend(
            SearchEvent::Error {
                message: "ünïcode failure".to_string(),
            }
            .encode_line()
            .expect("encodes")
            .into_bytes(),
        );

        let mut decoder = NdjsonDecoder::new();
        let mut events: Vec<SearchEvent> = Vec::new();
        for chunk in bytes.chunks(7) {
            events.extend(decoder.push::<SearchEvent>(chunk).expect("valid records"));
        }
        assert_eq!(decoder.pending(), 0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], progress(10.0));
        assert!(events[1].is_terminal());
        assert_eq!(
            events[1],
            SearchEvent::Error {
                message: "ünïcode failure".to_string()
            }
        );
    }

    #[test]
    fn decoder_finish_reads_unterminated_tail() {
        let mut decoder = NdjsonDecoder::new();
        let first: Vec<serde_json::Value> =
            decoder.push(b"{\"a\":1}\n\n{\"b\":").expect("first record");
        assert_eq!(first.len(), 1);
        assert!(decoder.pending() > 0);
        let second: Vec<serde_json::Value> = decoder.push(b"2}").expect("no newline yet");
        assert!(second.is_empty());
        let tail: Option<serde_json::Value> = decoder.finish().expect("tail decodes");
        assert_eq!(tail, Some(serde_json::json!({ "b": 2 })));
    }

    #[test]
    fn failed_searches_map_to_terminal_events() {
        assert!(matches!(
            SearchEvent::from_result(Err(SearchError::Cancelled), 30),
            SearchEvent::Cancelled { .. }
        ));
        let SearchEvent::Error { message } = SearchEvent::from_result(
            Err(SearchError::WorkerFailure {
                worker_id: 2,
                reason: "panicked".to_string(),
            }),
            30,
        ) else {
            panic!("expected error event");
        };
        assert_eq!(message, "worker 2 failed: panicked");
    }
}
