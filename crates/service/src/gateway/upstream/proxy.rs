use oneonone_core::generation::{
    build_candidate_list, GenerationRequest, GenerationResult, API_VERSION_CANDIDATES,
};

use super::super::error::{DispatchError, ALL_CANDIDATES_FAILED_MESSAGE};
use super::super::trace_log;
use super::backoff::Sleeper;
use super::config::MAX_ATTEMPTS;
use super::outcome::{decide_attempt_outcome, AttemptDecision};
use super::transport::{GenerateTransport, UpstreamTarget};

/// Result of running the attempt loop for one (model, version) pair.
enum PairResult {
    Success(String),
    /// Pair given up (abandoned or out of attempts); search continues.
    Exhausted,
    Terminate,
}

/// Bookkeeping local to one dispatch.
struct SearchState {
    trace_id: String,
    last_error: Option<String>,
    calls: u32,
}

impl SearchState {
    fn record_error(&mut self, error: Option<String>) {
        if let Some(error) = error {
            self.last_error = Some(error);
        }
    }
}

/// Model-candidate fallback search over (model, API version, attempt).
#[derive(Debug, Clone)]
pub struct GenerationDispatcher<T, S> {
    transport: T,
    sleeper: S,
    upstream_base_url: String,
}

impl<T, S> GenerationDispatcher<T, S>
where
    T: GenerateTransport,
    S: Sleeper,
{
    pub fn new(transport: T, sleeper: S, upstream_base_url: &str) -> Self {
        Self {
            transport,
            sleeper,
            upstream_base_url: super::config::normalize_upstream_base_url(upstream_base_url),
        }
    }

    /// Tries every candidate in order and returns the first extracted text.
    ///
    /// Calls are strictly sequential. A 403 stops the search at once; any
    /// other failure is recorded and the search moves on.
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, DispatchError> {
        let mut state = SearchState {
            trace_id: trace_log::next_trace_id(),
            last_error: None,
            calls: 0,
        };
        let candidates = build_candidate_list(request.model_override.as_deref());
        trace_log::log_candidate_pool(&state.trace_id, &candidates, &API_VERSION_CANDIDATES);

        for model_name in &candidates {
            for api_version in API_VERSION_CANDIDATES {
                let target = UpstreamTarget {
                    base_url: self.upstream_base_url.clone(),
                    api_version: api_version.to_string(),
                    model_name: model_name.clone(),
                    api_key: api_key.to_string(),
                };
                match self.run_pair(&mut state, &target, &request.prompt).await {
                    PairResult::Success(text) => {
                        trace_log::log_request_final(
                            &state.trace_id,
                            200,
                            Some(model_name),
                            Some(api_version),
                            None,
                            state.calls,
                        );
                        return Ok(GenerationResult {
                            text,
                            model_name: model_name.clone(),
                            api_version: api_version.to_string(),
                        });
                    }
                    PairResult::Terminate => {
                        let err = DispatchError::AccessRestricted;
                        trace_log::log_request_final(
                            &state.trace_id,
                            err.status_code(),
                            Some(model_name),
                            Some(api_version),
                            Some(err.to_string().as_str()),
                            state.calls,
                        );
                        return Err(err);
                    }
                    PairResult::Exhausted => {}
                }
            }
        }

        let message = state
            .last_error
            .take()
            .unwrap_or_else(|| ALL_CANDIDATES_FAILED_MESSAGE.to_string());
        let err = DispatchError::Exhausted(message);
        trace_log::log_request_final(
            &state.trace_id,
            err.status_code(),
            None,
            None,
            Some(err.to_string().as_str()),
            state.calls,
        );
        Err(err)
    }

    async fn run_pair(
        &self,
        state: &mut SearchState,
        target: &UpstreamTarget,
        prompt: &str,
    ) -> PairResult {
        let endpoint = target.endpoint();
        for attempt in 0..MAX_ATTEMPTS {
            let outcome = self.transport.generate(target, prompt).await;
            state.calls += 1;
            let decision = decide_attempt_outcome(&outcome, attempt);
            trace_log::log_attempt(&state.trace_id, &endpoint, attempt, &outcome, &decision);

            match decision {
                AttemptDecision::Success(text) => return PairResult::Success(text),
                AttemptDecision::Terminate => return PairResult::Terminate,
                AttemptDecision::Retry { wait, error } => {
                    state.record_error(error);
                    if let Some(wait) = wait {
                        trace_log::log_backoff(&state.trace_id, &endpoint, attempt, wait);
                        self.sleeper.sleep(wait).await;
                    }
                }
                AttemptDecision::Abandon { wait, error } => {
                    state.record_error(error);
                    if let Some(wait) = wait {
                        trace_log::log_backoff(&state.trace_id, &endpoint, attempt, wait);
                        self.sleeper.sleep(wait).await;
                    }
                    return PairResult::Exhausted;
                }
            }
        }
        PairResult::Exhausted
    }
}
