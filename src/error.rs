use thiserror::Error;

/// Raised when a tactic references something outside the compiled-in catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TacticError {
    #[error("unknown {field} '{key}'")]
    UnknownKey { field: &'static str, key: String },
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("malformed tactic key '{0}': expected 7 '|'-separated fields")]
    MalformedKey(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("worker {worker_id} failed: {reason}")]
    WorkerFailure { worker_id: usize, reason: String },
    #[error("progress stream closed by consumer")]
    StreamWrite,
    #[error("search cancelled")]
    Cancelled,
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<SearchError> for ConfigError {
    fn from(err: SearchError) -> Self {
        Self::Invalid(err.to_string())
    }
}
