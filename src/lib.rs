//! Fetches the latest value of a list of PromQL expressions from a Prometheus server.

pub mod error;
pub mod fetcher;
pub mod prometheus_client;
pub mod response;
pub mod settings;

pub use error::{QueryError, SettingsError};
pub use fetcher::{sanitize_key, FetchReport, Fetcher, MetricValue, ResultSet, NO_DATA_MESSAGE};
pub use prometheus_client::{InstantValue, PrometheusClient};
pub use response::ModuleResponse;
pub use settings::Settings;
