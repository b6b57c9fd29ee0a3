//! Prometheus metrics for the librelog server.

use axum::http::Method;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Labels for HTTP request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabelsWithStatus {
    pub method: HttpMethod,
    pub endpoint: String,
    pub status: u16,
}

/// HTTP method label value.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Other,
}

impl From<&Method> for HttpMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => HttpMethod::Get,
            Method::POST => HttpMethod::Post,
            Method::PUT => HttpMethod::Put,
            Method::DELETE => HttpMethod::Delete,
            _ => HttpMethod::Other,
        }
    }
}

/// Labels for HTTP request latency histogram (without status, since status is unknown at start).
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: HttpMethod,
    pub endpoint: String,
}

/// How a record reached the server.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Transport {
    Stream,
    Post,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TransportLabels {
    pub transport: Transport,
}

impl From<Transport> for TransportLabels {
    fn from(transport: Transport) -> Self {
        Self { transport }
    }
}

/// Container for all Prometheus metrics.
pub struct Metrics {
    registry: Registry,

    /// Records accepted, by transport.
    pub records_ingested_total: Family<TransportLabels, Counter>,

    /// Messages rejected or failed, by transport.
    pub ingest_errors_total: Family<TransportLabels, Counter>,

    pub records_queried_total: Counter,

    pub records_exported_total: Counter,

    /// Open streaming ingestion connections.
    pub stream_connections: Gauge,

    /// Counter of HTTP requests.
    pub http_requests_total: Family<HttpLabelsWithStatus, Counter>,

    /// Histogram of HTTP request latency in seconds.
    pub http_request_duration_seconds: Family<HttpLabels, Histogram>,

    /// Gauge of currently in-flight requests.
    pub http_requests_in_flight: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let records_ingested_total = Family::<TransportLabels, Counter>::default();
        registry.register(
            "librelog_records_ingested",
            "Total number of records accepted for storage",
            records_ingested_total.clone(),
        );

        let ingest_errors_total = Family::<TransportLabels, Counter>::default();
        registry.register(
            "librelog_ingest_errors",
            "Total number of ingest messages that were rejected or failed",
            ingest_errors_total.clone(),
        );

        let records_queried_total = Counter::default();
        registry.register(
            "librelog_records_queried",
            "Total number of records returned by range queries",
            records_queried_total.clone(),
        );

        let records_exported_total = Counter::default();
        registry.register(
            "librelog_records_exported",
            "Total number of records written to exports",
            records_exported_total.clone(),
        );

        let stream_connections = Gauge::default();
        registry.register(
            "librelog_stream_connections",
            "Number of open streaming ingestion connections",
            stream_connections.clone(),
        );

        // HTTP requests total counter
        let http_requests_total = Family::<HttpLabelsWithStatus, Counter>::default();
        registry.register(
            "http_requests",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        // HTTP request duration histogram (buckets from 1ms to ~8s)
        let http_request_duration_seconds =
            Family::<HttpLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 14))
            });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_requests_in_flight = Gauge::default();
        registry.register(
            "http_requests_in_flight",
            "Number of HTTP requests currently being processed",
            http_requests_in_flight.clone(),
        );

        Self {
            registry,
            records_ingested_total,
            ingest_errors_total,
            records_queried_total,
            records_exported_total,
            stream_connections,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        }
    }

    pub fn record_ingested(&self, transport: Transport) {
        self.records_ingested_total
            .get_or_create(&transport.into())
            .inc();
    }

    pub fn record_ingest_error(&self, transport: Transport) {
        self.ingest_errors_total.get_or_create(&transport.into()).inc();
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}
