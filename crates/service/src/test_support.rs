use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{json, Value};

use crate::gateway::upstream::backoff::Sleeper;
use crate::gateway::upstream::transport::{
    GenerateTransport, TransportError, UpstreamReply, UpstreamTarget,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn lock_env() -> MutexGuard<'static, ()> {
    // 中文注释：某个测试 panic 导致锁 poison 时，后续测试不应跟着失败。
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<std::ffi::OsString>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        let original = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, original }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        let original = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(value) = &self.original {
            std::env::set_var(self.key, value);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

pub(crate) fn text_payload(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub(crate) base_url: String,
    pub(crate) api_version: String,
    pub(crate) model_name: String,
    pub(crate) api_key: String,
    pub(crate) prompt: String,
}

type Outcome = Result<UpstreamReply, TransportError>;

#[derive(Default)]
struct Script {
    queued: VecDeque<Outcome>,
    repeat: Option<Outcome>,
    calls: Vec<RecordedCall>,
}

/// Upstream double: answers from a queue, then from an optional repeating outcome.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub(crate) fn new(outcomes: Vec<Outcome>) -> Self {
        let transport = Self::default();
        transport.lock().queued.extend(outcomes);
        transport
    }

    pub(crate) fn repeating(outcome: Outcome) -> Self {
        Self::new(Vec::new()).then_repeat(outcome)
    }

    pub(crate) fn then_repeat(self, outcome: Outcome) -> Self {
        self.lock().repeat = Some(outcome);
        self
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GenerateTransport for ScriptedTransport {
    fn generate(
        &self,
        target: &UpstreamTarget,
        prompt: &str,
    ) -> impl Future<Output = Outcome> + Send {
        let outcome = {
            let mut script = self.lock();
            script.calls.push(RecordedCall {
                base_url: target.base_url.clone(),
                api_version: target.api_version.clone(),
                model_name: target.model_name.clone(),
                api_key: target.api_key.clone(),
                prompt: prompt.to_string(),
            });
            match script.queued.pop_front() {
                Some(outcome) => outcome,
                None => script
                    .repeat
                    .clone()
                    .unwrap_or_else(|| Err(TransportError::Send("script exhausted".to_string()))),
            }
        };
        std::future::ready(outcome)
    }
}

/// Records requested waits without suspending.
#[derive(Clone, Default)]
pub(crate) struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        self.waits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(delay);
        std::future::ready(())
    }
}
