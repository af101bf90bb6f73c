//! Result documents handed back to the host runtime on stdout.

use serde::Serialize;
use std::io::Write;

use crate::fetcher::{FetchReport, ResultSet};

#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ModuleResponse {
    Success {
        changed: bool,
        metrics_data: ResultSet,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Failure {
        failed: bool,
        msg: String,
    },
}

impl ModuleResponse {
    /// Querying never modifies anything, so `changed` is always false.
    pub fn success(report: FetchReport) -> Self {
        ModuleResponse::Success {
            changed: false,
            metrics_data: report.metrics_data,
            warnings: report.warnings,
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        ModuleResponse::Failure {
            failed: true,
            msg: msg.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ModuleResponse::Failure { .. })
    }

    pub fn write_to(&self, mut writer: impl Write) -> std::io::Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::MetricValue;
    use serde_json::json;

    fn render(response: &ModuleResponse) -> serde_json::Value {
        let mut out = Vec::new();
        response.write_to(&mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_success_document() {
        let mut metrics_data = ResultSet::new();
        metrics_data.insert("up".to_string(), MetricValue::Value(1.0));
        metrics_data.insert("missing_metric".to_string(), MetricValue::NoData);

        let response = ModuleResponse::success(FetchReport {
            metrics_data,
            warnings: vec![],
        });

        assert!(!response.is_failure());
        assert_eq!(
            render(&response),
            json!({
                "changed": false,
                "metrics_data": {
                    "up": 1.0,
                    "missing_metric": "No data available for the specified time range."
                }
            })
        );
    }

    #[test]
    fn test_success_document_keeps_query_order() {
        let mut metrics_data = ResultSet::new();
        metrics_data.insert("z".to_string(), MetricValue::Value(1.0));
        metrics_data.insert("a".to_string(), MetricValue::Value(2.0));

        let mut out = Vec::new();
        ModuleResponse::success(FetchReport {
            metrics_data,
            warnings: vec![],
        })
        .write_to(&mut out)
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"changed\":false,\"metrics_data\":{\"z\":1.0,\"a\":2.0}}\n"
        );
    }

    #[test]
    fn test_success_document_with_warnings() {
        let response = ModuleResponse::success(FetchReport {
            metrics_data: ResultSet::new(),
            warnings: vec!["key collision".to_string()],
        });

        assert_eq!(
            render(&response),
            json!({ "changed": false, "metrics_data": {}, "warnings": ["key collision"] })
        );
    }

    #[test]
    fn test_failure_document() {
        let response = ModuleResponse::failure("request for query `up` failed");

        assert!(response.is_failure());
        assert_eq!(
            render(&response),
            json!({ "failed": true, "msg": "request for query `up` failed" })
        );
    }
}
