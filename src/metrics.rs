use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use tessera_auth::CredentialKind;

/// Installs the Prometheus recorder with an upkeep task.
///
/// Returns `None` when metrics are disabled. Without a recorder the `counter!`
/// calls below are no-ops.
pub fn init_metrics(enabled: bool) -> anyhow::Result<Option<PrometheusHandle>> {
    if !enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

// Auth metrics helpers

pub fn track_login(method: &'static str, success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("auth_login_total", "method" => method, "result" => result).increment(1);
}

pub fn track_tokens_issued() {
    for kind in [
        CredentialKind::Access,
        CredentialKind::Session,
        CredentialKind::Refresh,
    ] {
        counter!("auth_tokens_issued_total", "kind" => kind.as_str()).increment(1);
    }
}

pub fn track_validation_failure(reason: &'static str) {
    counter!("auth_validation_failures_total", "reason" => reason).increment(1);
}

pub fn track_refresh(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("auth_refresh_total", "result" => result).increment(1);
}

pub fn track_logout(all_devices: bool) {
    counter!("auth_logout_total", "all_devices" => all_devices.to_string()).increment(1);
}

pub fn track_store_error(operation: &'static str) {
    counter!("revocation_store_errors_total", "operation" => operation).increment(1);
}

pub fn track_otp_sent(channel: &'static str) {
    counter!("auth_otp_sent_total", "channel" => channel).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_metrics_install_nothing() {
        assert!(init_metrics(false).unwrap().is_none());
    }

    #[test]
    fn test_tracking_without_recorder_is_noop() {
        track_login("password", true);
        track_tokens_issued();
        track_validation_failure("expired");
        track_store_error("read");
    }
}
