//! Prometheus metrics exposition
//!
//! - `relay_logins_total` (counter)
//! - `relay_callbacks_total` (counter): label `outcome`
//! - `relay_token_requests_total` (counter): labels `grant_type`, `status`
//! - `relay_token_request_duration_seconds` (histogram): label `grant_type`

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const TOKEN_DURATION_METRIC: &str = "relay_token_request_duration_seconds";

/// Buckets from 10ms to 30s; token endpoint calls are a single round trip.
const TOKEN_DURATION_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(TOKEN_DURATION_METRIC.to_string()),
            TOKEN_DURATION_BUCKETS,
        )
        .expect("histogram bucket list is non-empty")
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> PrometheusHandle {
    builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Handle backed by a recorder that is not installed globally, for tests.
#[cfg(test)]
pub fn detached_handle() -> PrometheusHandle {
    builder().build_recorder().handle()
}

pub fn record_login() {
    metrics::counter!("relay_logins_total").increment(1);
}

/// Outcome of a callback: `tokens`, `invalid_state`, `denied`, `bad_request`
/// or `exchange_failed`.
pub fn record_callback(outcome: &'static str) {
    metrics::counter!("relay_callbacks_total", "outcome" => outcome).increment(1);
}

/// Record one token endpoint round trip. `status` is the provider's HTTP
/// status, or 0 when no response arrived.
pub fn record_token_request(grant_type: &'static str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "relay_token_requests_total",
        "grant_type" => grant_type,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(TOKEN_DURATION_METRIC, "grant_type" => grant_type).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_login();
        record_callback("tokens");
        record_token_request("refresh_token", 200, 0.05);
    }

    #[test]
    fn counters_render_with_labels() {
        let recorder = builder().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_login();
        record_callback("invalid_state");
        record_token_request("authorization_code", 400, 0.2);

        let output = handle.render();
        assert!(output.contains("relay_logins_total"));
        assert!(output.contains("outcome=\"invalid_state\""));
        assert!(output.contains("grant_type=\"authorization_code\""));
        assert!(output.contains("status=\"400\""));
        assert!(
            output.contains("relay_token_request_duration_seconds_bucket"),
            "duration must render as a histogram"
        );
        assert!(output.contains("le=\"30\""));
    }
}
