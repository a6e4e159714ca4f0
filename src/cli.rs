use std::io::{self, Write};

use crate::catalog::{Tactic, TacticSpace};
use crate::config::{load_search_file, AppConfig};
use crate::error::SearchError;
use crate::optimizer::qlearning::QLearningConfig;
use crate::optimizer::run_online_training;
use crate::parallel::{run_search, CancelToken, SearchConfig, SearchMode};
use crate::server;
use crate::server::stream::SearchEvent;
use crate::sim::simulate_match;

const USAGE: &str = "usage: tactician <serve|simulate|train|search>";
const SEARCH_USAGE: &str =
    "usage: tactician search [population|exhaustive] [matches_per_pair] [--workers N] [--config FILE]";

const DEFAULT_HOME: &str = "4-3-3|4-3-3|possession|forecheck|Speed|Playmaker|Cover";
const DEFAULT_AWAY: &str = "4-4-2|4-4-2|longBall|retreat|Power|Box2Box|Stopper";

/// Exit code for a search stopped by ctrl-c.
const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Simulate,
    Train,
    Search,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("simulate") => Some(Command::Simulate),
        Some("train") => Some(Command::Train),
        Some("search") => Some(Command::Search),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Train) => handle_train(args),
        Some(Command::Search) => handle_search(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_serve() -> i32 {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 2;
        }
    };
    match server::run_server(config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_simulate(args: &[String]) -> i32 {
    let home = args.get(2).map(String::as_str).unwrap_or(DEFAULT_HOME);
    let away = args.get(3).map(String::as_str).unwrap_or(DEFAULT_AWAY);

    let (home, away) = match (home.parse::<Tactic>(), away.parse::<Tactic>()) {
        (Ok(home), Ok(away)) => (home, away),
        (Err(err), _) => {
            eprintln!("invalid home tactic: {err}");
            return 1;
        }
        (_, Err(err)) => {
            eprintln!("invalid away tactic: {err}");
            return 1;
        }
    };

    let result = simulate_match(&home, &away);
    match serde_json::to_string_pretty(&result) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize match result: {err}");
            1
        }
    }
}

fn handle_train(args: &[String]) -> i32 {
    let episodes = parse_u32_arg(args.get(2), "episodes", 500);

    let report = match run_online_training(
        episodes as usize,
        QLearningConfig::default(),
        TacticSpace::full(),
    ) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("training failed: {err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&report) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize training report: {err}");
            1
        }
    }
}

/// Builds a search configuration from `search` arguments. A `--config` file supplies
/// the base; the mode and flags override it.
fn parse_search_args(args: &[String], max_workers: usize) -> Result<SearchConfig, String> {
    let mut mode = None;
    let mut workers = None;
    let mut matches_per_pair = None;
    let mut config_path = None;

    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "population" => mode = Some(SearchMode::Population),
            "exhaustive" => mode = Some(SearchMode::Exhaustive),
            "--workers" => workers = Some(flag_value(rest.next(), "--workers")?),
            "--matches-per-pair" => {
                matches_per_pair = Some(flag_value(rest.next(), "--matches-per-pair")?)
            }
            count if count.parse::<u32>().is_ok() => {
                matches_per_pair = Some(flag_value(Some(arg), "matches_per_pair")?)
            }
            "--config" => {
                config_path = Some(
                    rest.next()
                        .ok_or_else(|| "--config needs a file path".to_string())?,
                )
            }
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }

    let mut config = match config_path {
        Some(path) => load_search_file(path).map_err(|err| err.to_string())?,
        None => SearchConfig::default(),
    };
    config.max_workers = max_workers;
    if let Some(mode) = mode {
        config.mode = mode;
    }
    if let Some(workers) = workers {
        config.workers = Some(workers as usize);
    }
    if let Some(matches_per_pair) = matches_per_pair {
        config.matches_per_pair = matches_per_pair;
    }
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn flag_value(raw: Option<&String>, flag: &str) -> Result<u32, String> {
    let raw = raw.ok_or_else(|| format!("{flag} needs a value"))?;
    raw.parse::<u32>()
        .map_err(|_| format!("invalid {flag} '{raw}'"))
}

fn write_event(out: &mut impl Write, event: &SearchEvent) -> io::Result<()> {
    let line = event.encode_line().map_err(io::Error::other)?;
    out.write_all(line.as_bytes())?;
    out.flush()
}

fn handle_search(args: &[String]) -> i32 {
    let app = match AppConfig::from_env() {
        Ok(app) => app,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 2;
        }
    };
    let config = match parse_search_args(args, app.max_workers) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{SEARCH_USAGE}");
            return 2;
        }
    };
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return 1;
        }
    };

    let ranking_size = config.ranking_size;
    let cancel = CancelToken::new();
    let result = runtime.block_on(async {
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_signal.cancel();
            }
        });
        let stdout = io::stdout();
        run_search(&config, &cancel, |progress| {
            write_event(&mut stdout.lock(), &SearchEvent::Progress(*progress))
                .map_err(|_| SearchError::StreamWrite)
        })
        .await
    });

    let event = SearchEvent::from_result(result, ranking_size);
    if let Err(err) = write_event(&mut io::stdout().lock(), &event) {
        eprintln!("failed to write search result: {err}");
        return 1;
    }
    match event {
        SearchEvent::Done(_) => 0,
        SearchEvent::Cancelled { .. } => EXIT_CANCELLED,
        _ => 1,
    }
}

fn parse_u32_arg(raw: Option<&String>, name: &str, default: u32) -> u32 {
    raw.and_then(|value| value.parse::<u32>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
