use log::{debug, info};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};

use crate::error::QueryError;

/// Path of the instant-query endpoint, appended verbatim to the configured base URL.
pub const QUERY_API: &str = "/api/v1/query";

/// Outcome of a single instant query that did not fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstantValue {
    Found(f64),
    /// The server answered successfully but had no sample for the query.
    Absent,
}

#[derive(Debug, Clone)]
pub struct PrometheusClient {
    pub url: String,
    client: Client,
}

impl PrometheusClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, QueryError> {
        let mut builder = Client::builder().user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            url: url.into(),
            client: builder.build().map_err(QueryError::ClientBuild)?,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.url, QUERY_API)
    }

    /// Evaluates `query` at `time` (Unix seconds) and returns the first sample's value.
    pub async fn fetch_latest_value(
        &self,
        query: &str,
        time: i64,
    ) -> Result<InstantValue, QueryError> {
        let start_time = Instant::now();
        info!("Query: {query} at {time}");

        let time = time.to_string();
        let transport = |source| QueryError::Transport {
            query: query.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        debug!(
            "Request took {} milliseconds",
            start_time.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(QueryError::Status {
                query: query.to_string(),
                status,
                detail: error_detail(&body),
            });
        }

        let json: JsonValue = serde_json::from_str(&body).map_err(|source| QueryError::Decode {
            query: query.to_string(),
            source,
        })?;
        debug!("Response: {json}");

        latest_sample(query, &json)
    }
}

/// Extracts the latest sample from an instant-query response body.
///
/// Vector results use `data.result[0].value[1]`; scalar and string results carry the
/// `[timestamp, value]` pair directly in `data.result`. An object body without a `data`
/// key, or a `data` without `result`, is treated as having no data.
pub fn latest_sample(query: &str, body: &JsonValue) -> Result<InstantValue, QueryError> {
    let malformed = |reason: String| QueryError::MalformedResponse {
        query: query.to_string(),
        reason,
    };

    let Some(body) = body.as_object() else {
        return Err(malformed("response body is not an object".to_string()));
    };

    if body.get("status").and_then(JsonValue::as_str) == Some("error") {
        return Err(QueryError::Api {
            query: query.to_string(),
            message: body
                .get("error")
                .and_then(JsonValue::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    let data = match body.get("data") {
        None => return Ok(InstantValue::Absent),
        Some(data) if data.is_object() => data,
        Some(_) => return Err(malformed("`data` is not an object".to_string())),
    };
    let result = match data.get("result") {
        None | Some(JsonValue::Null) => return Ok(InstantValue::Absent),
        Some(result) => result,
    };

    let pair = match data.get("resultType").and_then(JsonValue::as_str) {
        Some("scalar") | Some("string") => result,
        _ => {
            let entries = result
                .as_array()
                .ok_or_else(|| malformed("`data.result` is not an array".to_string()))?;
            let Some(first) = entries.first() else {
                return Ok(InstantValue::Absent);
            };
            first
                .get("value")
                .ok_or_else(|| malformed("first result has no `value` field".to_string()))?
        }
    };

    let sample = match pair.as_array().map(Vec::as_slice) {
        Some([_, sample]) => sample,
        _ => {
            return Err(malformed(format!(
                "expected a [timestamp, value] pair, got {pair}"
            )))
        }
    };

    parse_sample(sample)
        .map(InstantValue::Found)
        .ok_or_else(|| malformed(format!("sample value {sample} is not a number")))
}

fn parse_sample(sample: &JsonValue) -> Option<f64> {
    match sample {
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Pulls the `error` text out of a Prometheus error document, if the body is one.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<JsonValue>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}
