use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::upstream::outcome::AttemptDecision;
use super::upstream::transport::{TransportError, UpstreamReply};

static TRACE_SEQ: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_trace_id() -> String {
    let seq = TRACE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("gen-{seq}")
}

fn sanitize_text(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

pub(crate) fn log_candidate_pool(trace_id: &str, candidates: &[String], api_versions: &[&str]) {
    log::info!(
        "event=generation_candidate_pool trace_id={} candidates={} api_versions={}",
        trace_id,
        candidates.join(","),
        api_versions.join(",")
    );
}

pub(crate) fn log_attempt(
    trace_id: &str,
    endpoint: &str,
    attempt: u32,
    outcome: &Result<UpstreamReply, TransportError>,
    decision: &AttemptDecision,
) {
    let status = match outcome {
        Ok(reply) => reply.status.to_string(),
        Err(_) => "-".to_string(),
    };
    let (decision_name, error) = match decision {
        AttemptDecision::Success(_) => ("success", None),
        AttemptDecision::Retry { error, .. } => ("retry", error.as_deref()),
        AttemptDecision::Abandon { error, .. } => ("abandon", error.as_deref()),
        AttemptDecision::Terminate => ("terminate", None),
    };
    let error = error.map(sanitize_text).unwrap_or_else(|| "-".to_string());
    if matches!(decision, AttemptDecision::Success(_)) {
        log::info!(
            "event=generation_attempt trace_id={} endpoint={} attempt={} status={} decision={}",
            trace_id,
            endpoint,
            attempt,
            status,
            decision_name
        );
    } else {
        log::warn!(
            "event=generation_attempt trace_id={} endpoint={} attempt={} status={} decision={} error={}",
            trace_id,
            endpoint,
            attempt,
            status,
            decision_name,
            error
        );
    }
}

pub(crate) fn log_backoff(trace_id: &str, endpoint: &str, attempt: u32, wait: Duration) {
    log::debug!(
        "event=generation_backoff trace_id={} endpoint={} attempt={} wait_ms={}",
        trace_id,
        endpoint,
        attempt,
        wait.as_millis()
    );
}

pub(crate) fn log_request_final(
    trace_id: &str,
    status_code: u16,
    model_name: Option<&str>,
    api_version: Option<&str>,
    error: Option<&str>,
    calls: u32,
) {
    let error = error.map(sanitize_text).unwrap_or_else(|| "-".to_string());
    log::info!(
        "event=generation_final trace_id={} status={} model={} api_version={} calls={} error={}",
        trace_id,
        status_code,
        model_name.unwrap_or("-"),
        api_version.unwrap_or("-"),
        calls,
        error
    );
}
