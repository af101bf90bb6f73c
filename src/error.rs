use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while querying Prometheus. Any of these aborts the whole batch.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request for query `{query}` failed")]
    Transport {
        query: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("query `{query}` returned HTTP {status}{}", detail_suffix(.detail))]
    Status {
        query: String,
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("response for query `{query}` is not valid JSON")]
    Decode {
        query: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Prometheus rejected query `{query}`: {message}")]
    Api { query: String, message: String },

    #[error("malformed response for query `{query}`: {reason}")]
    MalformedResponse { query: String, reason: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Errors raised while loading or validating module arguments.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read settings file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML settings")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON arguments")]
    Json(#[from] serde_json::Error),

    #[error("missing required arguments: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{0}")]
    Invalid(String),
}
