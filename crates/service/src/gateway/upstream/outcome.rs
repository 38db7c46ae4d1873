use oneonone_core::generation::extract_text;
use serde_json::Value;
use std::time::Duration;

use super::backoff::{rate_limit_delay, UNAVAILABLE_DELAY};
use super::transport::{TransportError, UpstreamReply};

pub(crate) const NO_TEXT_OUTPUT_MESSAGE: &str = "Gemini response did not contain text output.";

/// What a non-success status does to the current (model, version) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusAction {
    /// Wait `1000ms * 2^attempt`, then retry the same pair.
    BackoffRetry,
    /// Wait a fixed second, then move to the next pair.
    PauseThenAbandon,
    /// Move to the next pair at once.
    Abandon,
    /// Stop the whole search.
    Terminate,
    /// Record the upstream message and retry the same pair.
    RecordThenRetry,
}

const STATUS_ACTIONS: [(u16, StatusAction); 4] = [
    (429, StatusAction::BackoffRetry),
    (503, StatusAction::PauseThenAbandon),
    (404, StatusAction::Abandon),
    (403, StatusAction::Terminate),
];

pub(crate) fn status_action(status: u16) -> StatusAction {
    STATUS_ACTIONS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, action)| *action)
        .unwrap_or(StatusAction::RecordThenRetry)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptDecision {
    Success(String),
    /// Try the same pair again after `wait`, if attempts remain.
    Retry {
        wait: Option<Duration>,
        error: Option<String>,
    },
    /// Give up on this pair and advance to the next version/model.
    Abandon {
        wait: Option<Duration>,
        error: Option<String>,
    },
    Terminate,
}

/// `null`, `false`, `0` and `""` bodies carry nothing to extract.
pub(crate) fn is_usable_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn decide_attempt_outcome(
    outcome: &Result<UpstreamReply, TransportError>,
    attempt: u32,
) -> AttemptDecision {
    let reply = match outcome {
        Ok(reply) => reply,
        Err(err) => {
            return AttemptDecision::Retry {
                wait: None,
                error: Some(err.to_string()),
            };
        }
    };

    let is_success = (200..300).contains(&reply.status);
    let usable_payload = reply.payload.as_ref().filter(|payload| is_usable_payload(payload));
    if let (true, Some(payload)) = (is_success, usable_payload) {
        return match extract_text(payload) {
            Some(text) => AttemptDecision::Success(text),
            None => AttemptDecision::Abandon {
                wait: None,
                error: Some(NO_TEXT_OUTPUT_MESSAGE.to_string()),
            },
        };
    }

    // 中文注释：2xx 但 body 解析失败时不算成功，按普通非成功状态处理。
    match status_action(reply.status) {
        StatusAction::BackoffRetry => AttemptDecision::Retry {
            wait: Some(rate_limit_delay(attempt)),
            error: None,
        },
        StatusAction::PauseThenAbandon => AttemptDecision::Abandon {
            wait: Some(UNAVAILABLE_DELAY),
            error: None,
        },
        StatusAction::Abandon => AttemptDecision::Abandon {
            wait: None,
            error: None,
        },
        StatusAction::Terminate => AttemptDecision::Terminate,
        StatusAction::RecordThenRetry => AttemptDecision::Retry {
            wait: None,
            error: Some(upstream_error_message(reply.status, reply.payload.as_ref())),
        },
    }
}

fn upstream_error_message(status: u16, payload: Option<&Value>) -> String {
    payload
        .and_then(|payload| payload.pointer("/error/message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Gemini API returned status {status}."))
}
