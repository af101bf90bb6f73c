use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::SettingsError;
use crate::prometheus_client::QUERY_API;

/// Module arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub prometheus_url: String,
    pub queries: Vec<String>,
    /// Request timeout in seconds. When unset the HTTP client default applies.
    pub timeout: Option<u64>,
}

/// Deserialized form that tracks which required arguments were omitted. Keys the host runtime
/// injects on its own (`_ansible_*` and the like) are ignored.
#[derive(Deserialize)]
struct RawSettings {
    prometheus_url: Option<String>,
    queries: Option<Vec<String>>,
    timeout: Option<u64>,
}

impl TryFrom<RawSettings> for Settings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        if raw.prometheus_url.is_none() {
            missing.push("prometheus_url");
        }
        if raw.queries.is_none() {
            missing.push("queries");
        }
        if !missing.is_empty() {
            return Err(SettingsError::Missing(missing));
        }

        Ok(Settings {
            prometheus_url: raw.prometheus_url.unwrap_or_default(),
            queries: raw.queries.unwrap_or_default(),
            timeout: raw.timeout,
        })
    }
}

impl Settings {
    pub fn new(prometheus_url: impl Into<String>, queries: Vec<String>) -> Settings {
        Settings {
            prometheus_url: prometheus_url.into(),
            queries,
            timeout: None,
        }
    }

    /// Loads arguments from `path`. Files ending in `.toml` are read as TOML, anything else as
    /// the JSON object a host runtime writes for binary modules.
    pub fn load(path: &Path) -> Result<Settings, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Settings::from_str(&contents),
            _ => Settings::from_json_str(&contents),
        }
    }

    pub fn from_str(content: &str) -> Result<Settings, SettingsError> {
        toml::from_str::<RawSettings>(content)?.try_into()
    }

    pub fn from_json_str(content: &str) -> Result<Settings, SettingsError> {
        serde_json::from_str::<RawSettings>(content)?.try_into()
    }

    /// Checks the arguments before any network call is attempted.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.prometheus_url.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "prometheus_url must not be empty".to_string(),
            ));
        }

        let endpoint = format!("{}{}", self.prometheus_url, QUERY_API);
        let parsed = Url::parse(&endpoint).map_err(|e| {
            SettingsError::Invalid(format!(
                "prometheus_url `{}` is not a valid URL: {}",
                self.prometheus_url, e
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SettingsError::Invalid(format!(
                "prometheus_url `{}` must use http or https",
                self.prometheus_url
            )));
        }

        if let Some(index) = self.queries.iter().position(|q| q.trim().is_empty()) {
            return Err(SettingsError::Invalid(format!(
                "queries[{}] must be a non-empty string",
                index
            )));
        }

        if self.timeout == Some(0) {
            return Err(SettingsError::Invalid(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
