use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{
    AttackStyle, DefenderType, DefenseStyle, Formation, ForwardType, MidfielderType, RawTactic,
    StatLine, TacticSpace,
};
use crate::error::{SearchError, TacticError};
use crate::optimizer::qlearning::QLearningConfig;
use crate::optimizer::{run_online_training, run_single_match};
use crate::parallel::SearchConfig;

pub const DEFAULT_EPISODES: usize = 500;
pub const MAX_EPISODES: usize = 100_000;
pub const MAX_MATCHES_PER_PAIR: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationErrorResponse {
    fn new(message: &'static str, errors: Vec<ValidationIssue>) -> Self {
        Self {
            status: "error",
            message,
            errors,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Tactic(#[from] TacticError),
    #[error("{}", .0.message)]
    Validation(ValidationErrorResponse),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("worker task failed: {0}")]
    Join(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Parse(_)
            | Self::Tactic(_)
            | Self::Validation(_)
            | Self::Search(SearchError::InvalidConfig(_)) => 400,
            Self::Search(_) | Self::Join(_) => 500,
        }
    }
}

/// Bodies are optional on every POST route; an empty body means "all defaults".
fn body_or_empty_object(body: &str) -> &str {
    if body.trim().is_empty() {
        "{}"
    } else {
        body
    }
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "tactician-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormationEntry {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StrategyEntry<P: Serialize> {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    #[serde(flatten)]
    traits: P,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArchetypeEntry {
    key: &'static str,
    name: &'static str,
    #[serde(flatten)]
    stats: StatLine,
}

fn archetype_entries<T: Copy>(
    all: &[T],
    key: fn(T) -> &'static str,
    name: fn(T) -> &'static str,
    stats: fn(T) -> StatLine,
) -> Vec<ArchetypeEntry> {
    all.iter()
        .map(|entry| ArchetypeEntry {
            key: key(*entry),
            name: name(*entry),
            stats: stats(*entry),
        })
        .collect()
}

/// Every compiled-in catalog, plus the size of the full tactic space.
pub fn catalog_payload() -> Result<String, serde_json::Error> {
    let formations: Vec<FormationEntry> = Formation::ALL
        .iter()
        .map(|formation| {
            let profile = formation.profile();
            FormationEntry {
                key: formation.key(),
                name: profile.name,
                description: profile.description,
                category: profile.category,
            }
        })
        .collect();

    let attack_strategies: Vec<_> = AttackStyle::ALL
        .iter()
        .map(|style| {
            let profile = style.profile();
            StrategyEntry {
                key: style.key(),
                name: profile.name,
                description: profile.description,
                traits: serde_json::json!({
                    "buildUp": profile.build_up,
                    "attackArea": profile.attack_area,
                }),
            }
        })
        .collect();

    let defense_strategies: Vec<_> = DefenseStyle::ALL
        .iter()
        .map(|style| {
            let profile = style.profile();
            StrategyEntry {
                key: style.key(),
                name: profile.name,
                description: profile.description,
                traits: serde_json::json!({ "lineHeight": profile.line_height }),
            }
        })
        .collect();

    serde_json::to_string_pretty(&serde_json::json!({
        "formations": formations,
        "attackStrategies": attack_strategies,
        "defenseStrategies": defense_strategies,
        "archetypes": {
            "forward": archetype_entries(ForwardType::ALL, ForwardType::key, ForwardType::name, ForwardType::stats),
            "midfielder": archetype_entries(MidfielderType::ALL, MidfielderType::key, MidfielderType::name, MidfielderType::stats),
            "defender": archetype_entries(DefenderType::ALL, DefenderType::key, DefenderType::name, DefenderType::stats),
        },
        "spaceSize": TacticSpace::full().len(),
    }))
}

#[derive(Debug, Deserialize)]
struct SingleMatchRequest {
    home: RawTactic,
    away: RawTactic,
}

/// Plays one match between two wire-format tactics.
pub fn single_match_payload(body: &str) -> Result<String, ApiError> {
    let request: SingleMatchRequest = serde_json::from_str(body)?;
    let result = run_single_match(request.home, request.away)?;
    Ok(serde_json::to_string_pretty(&result)?)
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainRequest {
    pub episodes: usize,
    pub params: QLearningConfig,
    pub space: TacticSpace,
}

impl Default for TrainRequest {
    fn default() -> Self {
        Self {
            episodes: DEFAULT_EPISODES,
            params: QLearningConfig::default(),
            space: TacticSpace::full(),
        }
    }
}

pub fn parse_train_request(body: &str) -> Result<TrainRequest, ApiError> {
    let request: TrainRequest = serde_json::from_str(body_or_empty_object(body))?;

    let mut errors = Vec::new();
    if !(1..=MAX_EPISODES).contains(&request.episodes) {
        errors.push(ValidationIssue {
            field: "episodes",
            messages: vec![format!("must be between 1 and {MAX_EPISODES}")],
        });
    }
    if let Err(err) = request.params.validate() {
        errors.push(ValidationIssue {
            field: "params",
            messages: vec![err.to_string()],
        });
    }
    if let Err(err) = request.space.validate() {
        errors.push(ValidationIssue {
            field: "space",
            messages: vec![err.to_string()],
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(ValidationErrorResponse::new(
            "Invalid training request",
            errors,
        )));
    }
    Ok(request)
}

/// Runs a fresh online-training session. Blocks for the whole run.
pub fn train_payload(body: &str) -> Result<String, ApiError> {
    let request = parse_train_request(body)?;
    let report = run_online_training(request.episodes, request.params, request.space)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Parses a search request; `max_workers` comes from the process configuration and
/// always wins over the request.
pub fn parse_search_request(body: &str, max_workers: usize) -> Result<SearchConfig, ApiError> {
    let mut config: SearchConfig = serde_json::from_str(body_or_empty_object(body))?;
    config.max_workers = max_workers;

    let mut errors = Vec::new();
    if !(1..=MAX_MATCHES_PER_PAIR).contains(&config.matches_per_pair) {
        errors.push(ValidationIssue {
            field: "matchesPerPair",
            messages: vec![format!("must be between 1 and {MAX_MATCHES_PER_PAIR}")],
        });
    }
    if config.workers == Some(0) {
        errors.push(ValidationIssue {
            field: "workers",
            messages: vec!["must be at least 1".to_string()],
        });
    }
    if config.ranking_size == 0 {
        errors.push(ValidationIssue {
            field: "rankingSize",
            messages: vec!["must be at least 1".to_string()],
        });
    }
    if let Err(err) = config.genetic.validate() {
        errors.push(ValidationIssue {
            field: "genetic",
            messages: vec![err.to_string()],
        });
    }
    if let Err(err) = config.space.validate() {
        errors.push(ValidationIssue {
            field: "space",
            messages: vec![err.to_string()],
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(ValidationErrorResponse::new(
            "Invalid search request",
            errors,
        )));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SearchMode;

    #[test]
    fn health_payload_reports_ok() {
        let payload: serde_json::Value =
            serde_json::from_str(&health_payload().expect("serializes")).expect("json");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["service"], "tactician-api");
    }

    #[test]
    fn catalog_lists_every_entry() {
        let payload: serde_json::Value =
            serde_json::from_str(&catalog_payload().expect("serializes")).expect("json");
        assert_eq!(payload["formations"].as_array().map(Vec::len), Some(6));
        assert_eq!(payload["attackStrategies"].as_array().map(Vec::len), Some(5));
        assert_eq!(payload["defenseStrategies"].as_array().map(Vec::len), Some(4));
        assert_eq!(payload["archetypes"]["forward"][0]["key"], "Speed");
        assert_eq!(payload["archetypes"]["forward"][0]["speed"], 1.2);
        assert_eq!(payload["defenseStrategies"][0]["lineHeight"], 0.7);
        assert_eq!(payload["spaceSize"], 19_440);
    }

    #[test]
    fn unknown_strategy_is_a_client_error() {
        let body = r#"{"home":{"formation":"4-4-2","attack":"possession","defense":"press"},
                       "away":{"formation":"4-3-3","attack":"longBall","defense":"retreat"}}"#;
        let err = single_match_payload(body).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("press"));
    }

    #[test]
    fn train_request_defaults_and_validation() {
        let request = parse_train_request("").expect("empty body is valid");
        assert_eq!(request.episodes, DEFAULT_EPISODES);

        let err = parse_train_request(r#"{"episodes":0,"params":{"alpha":2.0}}"#).unwrap_err();
        let ApiError::Validation(response) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = response.errors.iter().map(|issue| issue.field).collect();
        assert_eq!(fields, vec!["episodes", "params"]);
    }

    #[test]
    fn search_request_takes_worker_cap_from_server() {
        let config = parse_search_request(r#"{"mode":"exhaustive","matchesPerPair":2}"#, 3)
            .expect("valid request");
        assert_eq!(config.mode, SearchMode::Exhaustive);
        assert_eq!(config.max_workers, 3);

        let err = parse_search_request(r#"{"matchesPerPair":1000}"#, 3).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(matches!(
            parse_search_request("not json", 3),
            Err(ApiError::Parse(_))
        ));
    }
}
