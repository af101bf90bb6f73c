use indexmap::IndexMap;
use log::{info, warn};
use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::error::QueryError;
use crate::prometheus_client::{InstantValue, PrometheusClient};
use crate::settings::Settings;

/// Placeholder stored for queries that produced no sample.
pub const NO_DATA_MESSAGE: &str = "No data available for the specified time range.";

/// Value reported for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    NoData,
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(v) => serializer.serialize_f64(*v),
            MetricValue::NoData => serializer.serialize_str(NO_DATA_MESSAGE),
        }
    }
}

/// Query key -> value, in the order the queries were given.
pub type ResultSet = IndexMap<String, MetricValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub metrics_data: ResultSet,
    /// One entry per query whose key replaced an earlier query's entry.
    pub warnings: Vec<String>,
}

/// Replaces every `:` and `.` with `_`.
pub fn sanitize_key(query: &str) -> String {
    query.replace(&[':', '.'][..], "_")
}

pub struct Fetcher {
    client: PrometheusClient,
    queries: Vec<String>,
}

impl Fetcher {
    pub fn new(client: PrometheusClient, queries: Vec<String>) -> Self {
        Self { client, queries }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, QueryError> {
        let client = PrometheusClient::new(
            settings.prometheus_url.clone(),
            settings.timeout.map(Duration::from_secs),
        )?;
        Ok(Self::new(client, settings.queries.clone()))
    }

    /// Runs every query at the current wall-clock second.
    pub async fn fetch_all(&self) -> Result<FetchReport, QueryError> {
        self.fetch_all_at(chrono::Utc::now().timestamp()).await
    }

    /// Runs every query in order, all evaluated at `time`, stopping at the first error.
    ///
    /// Found values are keyed by the sanitized query. Absent values keep the raw query as
    /// their key, so callers relying on sanitized keys must look absent queries up by
    /// their original text.
    pub async fn fetch_all_at(&self, time: i64) -> Result<FetchReport, QueryError> {
        info!(
            "Fetching {} queries from {} at {}",
            self.queries.len(),
            self.client.url,
            time
        );

        let mut report = FetchReport::default();
        for query in &self.queries {
            let (key, value) = match self.client.fetch_latest_value(query, time).await? {
                InstantValue::Found(v) => (sanitize_key(query), MetricValue::Value(v)),
                InstantValue::Absent => {
                    info!("No data for query: {query}");
                    (query.clone(), MetricValue::NoData)
                }
            };

            if report.metrics_data.contains_key(&key) {
                let message = format!(
                    "result for query `{}` replaced an earlier result stored under key `{}`",
                    query, key
                );
                warn!("{message}");
                report.warnings.push(message);
            }
            report.metrics_data.insert(key, value);
        }

        Ok(report)
    }
}
