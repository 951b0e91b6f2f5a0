//! Metrics definitions for the poll service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `poll_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP verbs
//! - `endpoint`: parameterized paths, unknown paths collapse to `/other`
//! - `operation`: repository operation names fixed in code
//! - `pattern`, `outcome`: fixed enumerations in code

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its handle.
///
/// Must be called once, before any metric is recorded.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    build_recorder_builder()?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Histogram bucket configuration shared by the service and test harnesses.
pub fn build_recorder_builder() -> Result<PrometheusBuilder, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("poll_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("poll_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("poll_vote".to_string()),
            &[
                0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set vote buckets: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `poll_http_requests_total`, `poll_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("poll_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("poll_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// Replaces poll IDs with a placeholder.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/metrics" | "/api/v1/polls" => path.to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

fn normalize_dynamic_endpoint(path: &str) -> String {
    // /api/v1/polls/{poll_id}/{action}
    if let Some(rest) = path.strip_prefix("/api/v1/polls/") {
        let mut parts = rest.split('/');
        let id = parts.next();
        let action = parts.next();
        let extra = parts.next();

        if id.is_some_and(|s| !s.is_empty()) && extra.is_none() {
            match action {
                Some("votes") => return "/api/v1/polls/{poll_id}/votes".to_string(),
                Some("close") => return "/api/v1/polls/{poll_id}/close".to_string(),
                _ => {}
            }
        }
    }

    "/other".to_string()
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `poll_db_query_duration_seconds`, `poll_db_queries_total`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("poll_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("poll_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Domain Metrics
// ============================================================================

/// Record a room-name resolution
///
/// Metric: `poll_meeting_resolutions_total`
/// Labels: `pattern` (prefixed_numeric, bare_numeric, workspace_channel, code),
///         `outcome` (resolved, invalid_format, not_found, error)
pub fn record_meeting_resolution(pattern: &str, outcome: &str) {
    counter!("poll_meeting_resolutions_total",
        "pattern" => pattern.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a lazy meeting creation attempt
///
/// Metric: `poll_lazy_meetings_total`
/// Labels: `outcome` (created, raced)
pub fn record_lazy_meeting(outcome: &str) {
    counter!("poll_lazy_meetings_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a vote attempt
///
/// Metric: `poll_votes_total`, `poll_vote_duration_seconds`
/// Labels: `outcome` (recorded, already_voted, poll_closed, not_found, error)
pub fn record_vote(outcome: &str, duration: Duration) {
    histogram!("poll_vote_duration_seconds").record(duration.as_secs_f64());

    counter!("poll_votes_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a poll lifecycle transition
///
/// Metric: `poll_lifecycle_events_total`
/// Labels: `event` (created, closed)
pub fn record_poll_lifecycle(event: &str) {
    counter!("poll_lifecycle_events_total",
        "event" => event.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, Duration::from_millis(3));
        record_http_request("POST", "/api/v1/polls/9/votes", 409, Duration::from_millis(12));
        record_http_request("GET", "/nope", 404, Duration::from_millis(1));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(201), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(409), "error");
        assert_eq!(categorize_status_code(500), "error");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/api/v1/polls"), "/api/v1/polls");
    }

    #[test]
    fn test_normalize_endpoint_poll_paths() {
        assert_eq!(
            normalize_endpoint("/api/v1/polls/123/votes"),
            "/api/v1/polls/{poll_id}/votes"
        );
        assert_eq!(
            normalize_endpoint("/api/v1/polls/7/close"),
            "/api/v1/polls/{poll_id}/close"
        );
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/api/v1/polls/7"), "/other");
        assert_eq!(normalize_endpoint("/api/v1/polls//votes"), "/other");
        assert_eq!(normalize_endpoint("/api/v1/polls/7/votes/extra"), "/other");
        assert_eq!(normalize_endpoint("/api/v2/polls"), "/other");
    }

    #[test]
    fn test_record_db_query() {
        record_db_query("find_meeting_by_code", "success", Duration::from_millis(2));
        record_db_query("insert_poll", "error", Duration::from_millis(40));
    }

    #[test]
    fn test_record_domain_metrics() {
        record_meeting_resolution("bare_numeric", "resolved");
        record_meeting_resolution("workspace_channel", "not_found");
        record_lazy_meeting("created");
        record_lazy_meeting("raced");
        record_vote("recorded", Duration::from_millis(8));
        record_vote("already_voted", Duration::from_millis(1));
        record_poll_lifecycle("created");
        record_poll_lifecycle("closed");
    }
}
