//! Caller-side wrapper around the generation proxy endpoint.

use oneonone_core::generation::GenerationResult;
use oneonone_core::mindmap::{
    build_mindmap_prompt, extract_mindmap_schema, MindmapError, MindmapSchema,
};
use oneonone_core::summary::{
    build_summary_prompt, parse_summary, MeetingSummary, SUMMARY_MODEL_OVERRIDE,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const ENV_PROXY_ENDPOINT: &str = "ONEONONE_PROXY_ENDPOINT";
pub const ENV_MODEL_OVERRIDE: &str = "ONEONONE_MODEL_OVERRIDE";
pub const DEFAULT_PROXY_ENDPOINT: &str = "http://localhost:48770/gemini-proxy";

const UNKNOWN: &str = "unknown";

pub type GenerationResponse = GenerationResult;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Non-2xx from the proxy; carries the server's `error` text when present.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Gemini proxy returned an unexpected response.")]
    UnexpectedResponse,
    #[error("{0}")]
    Transport(String),
    #[error("Gemini proxy request was cancelled.")]
    Cancelled,
    #[error("Transcript is empty.")]
    EmptyTranscript,
    #[error(transparent)]
    Mindmap(#[from] MindmapError),
}

#[derive(Debug, Clone, Default)]
pub struct ProxyCallOptions {
    pub model_override: Option<String>,
    pub cancel: Option<CancellationToken>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequestBody<'a> {
    prompt: &'a str,
    model_override: Option<&'a str>,
}

pub fn default_proxy_endpoint() -> String {
    std::env::var(ENV_PROXY_ENDPOINT)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_PROXY_ENDPOINT.to_string())
}

fn resolve_model_override(explicit: Option<String>) -> Option<String> {
    explicit
        .or_else(|| std::env::var(ENV_MODEL_OVERRIDE).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn rejection_message(status: u16, payload: Option<&Value>) -> String {
    payload
        .and_then(|value| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Gemini proxy request failed with status {status}."))
}

fn string_field_or_unknown(payload: &Value, field: &str) -> String {
    payload
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN)
        .to_string()
}

pub(crate) fn normalize_response(
    status: u16,
    payload: Option<Value>,
) -> Result<GenerationResponse, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Rejected {
            status,
            message: rejection_message(status, payload.as_ref()),
        });
    }
    let payload = payload.ok_or(ClientError::UnexpectedResponse)?;
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .ok_or(ClientError::UnexpectedResponse)?;
    Ok(GenerationResponse {
        text: text.to_string(),
        model_name: string_field_or_unknown(&payload, "modelName"),
        api_version: string_field_or_unknown(&payload, "apiVersion"),
    })
}

async fn post_prompt(
    client: &reqwest::Client,
    endpoint: &str,
    body: &ProxyRequestBody<'_>,
) -> Result<GenerationResponse, ClientError> {
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|err| ClientError::Transport(err.to_string()))?;
    let status = response.status().as_u16();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ClientError::Transport(err.to_string()))?;
    // 中文注释：响应体不是 JSON 时按“无 payload”处理，由状态码决定报错文案。
    let payload = serde_json::from_slice::<Value>(&bytes).ok();
    normalize_response(status, payload)
}

/// Posts `{prompt, modelOverride}` to `endpoint`.
///
/// Without an explicit override, `ONEONONE_MODEL_OVERRIDE` is used when set.
pub async fn call_generation_proxy(
    client: &reqwest::Client,
    endpoint: &str,
    prompt: &str,
    options: ProxyCallOptions,
) -> Result<GenerationResponse, ClientError> {
    let model_override = resolve_model_override(options.model_override);
    let body = ProxyRequestBody {
        prompt,
        model_override: model_override.as_deref(),
    };
    let call = post_prompt(client, endpoint, &body);
    match options.cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(ClientError::Cancelled),
                result = call => result,
            }
        }
        None => call.await,
    }
}

/// Summarizes a 1-on-1 transcript into takeaways and next actions.
pub async fn summarize_transcript(
    client: &reqwest::Client,
    endpoint: &str,
    transcript: &str,
    cancel: Option<CancellationToken>,
) -> Result<MeetingSummary, ClientError> {
    let prompt = build_summary_prompt(transcript).ok_or(ClientError::EmptyTranscript)?;
    let options = ProxyCallOptions {
        model_override: Some(SUMMARY_MODEL_OVERRIDE.to_string()),
        cancel,
    };
    let response = call_generation_proxy(client, endpoint, &prompt, options).await?;
    log::debug!(
        "event=summary_generated model={} api_version={}",
        response.model_name,
        response.api_version
    );
    Ok(parse_summary(&response.text))
}

/// Asks for a JSON outline of the transcript and parses it.
///
/// Uses the caller's default model override (`ONEONONE_MODEL_OVERRIDE`).
pub async fn generate_mindmap(
    client: &reqwest::Client,
    endpoint: &str,
    transcript: &str,
    cancel: Option<CancellationToken>,
) -> Result<MindmapSchema, ClientError> {
    let prompt = build_mindmap_prompt(transcript).ok_or(ClientError::EmptyTranscript)?;
    let options = ProxyCallOptions {
        model_override: None,
        cancel,
    };
    let response = call_generation_proxy(client, endpoint, &prompt, options).await?;
    log::debug!(
        "event=mindmap_generated model={} api_version={}",
        response.model_name,
        response.api_version
    );
    Ok(extract_mindmap_schema(&response.text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lock_env, EnvGuard};
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime")
    }

    fn test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client")
    }

    fn read_http_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).expect("read request");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return text[header_end + 4..].to_string();
            }
        }
        String::new()
    }

    /// Answers one request with `status` and `body`, returning the received request body.
    fn serve_once(status: u16, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock proxy");
        let addr = listener.local_addr().expect("mock addr");
        let join = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request_body = read_http_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
            request_body
        });
        (format!("http://{addr}/gemini-proxy"), join)
    }

    #[test]
    fn endpoint_comes_from_env_when_set() {
        let _lock = lock_env();
        let _endpoint = EnvGuard::set(ENV_PROXY_ENDPOINT, " http://10.0.0.2:8080/gemini-proxy ");
        assert_eq!(default_proxy_endpoint(), "http://10.0.0.2:8080/gemini-proxy");
        let _blank = EnvGuard::set(ENV_PROXY_ENDPOINT, "  ");
        assert_eq!(default_proxy_endpoint(), DEFAULT_PROXY_ENDPOINT);
    }

    #[test]
    fn error_field_becomes_rejection_message() {
        let err = normalize_response(403, Some(json!({ "error": "restricted" })))
            .expect_err("rejected");
        assert_eq!(
            err,
            ClientError::Rejected {
                status: 403,
                message: "restricted".to_string()
            }
        );
    }

    #[test]
    fn missing_error_field_uses_status_message() {
        let err = normalize_response(502, None).expect_err("rejected");
        assert_eq!(err.to_string(), "Gemini proxy request failed with status 502.");
        let err = normalize_response(500, Some(json!({ "error": 7 }))).expect_err("rejected");
        assert_eq!(err.to_string(), "Gemini proxy request failed with status 500.");
    }

    #[test]
    fn success_without_text_is_unexpected() {
        assert_eq!(
            normalize_response(200, Some(json!({ "modelName": "m" }))),
            Err(ClientError::UnexpectedResponse)
        );
        assert_eq!(normalize_response(200, None), Err(ClientError::UnexpectedResponse));
    }

    #[test]
    fn missing_model_and_version_default_to_unknown() {
        let response = normalize_response(200, Some(json!({ "text": "hi", "apiVersion": 1 })))
            .expect("response");
        assert_eq!(response.text, "hi");
        assert_eq!(response.model_name, "unknown");
        assert_eq!(response.api_version, "unknown");
    }

    #[test]
    fn call_posts_prompt_and_env_override() {
        let _lock = lock_env();
        let _override = EnvGuard::set(ENV_MODEL_OVERRIDE, "gemini-exp");
        let (endpoint, mock) = serve_once(
            200,
            r#"{"text":"done","modelName":"models/gemini-exp","apiVersion":"v1"}"#,
        );
        let client = test_client();

        let response = runtime()
            .block_on(call_generation_proxy(
                &client,
                &endpoint,
                "hello",
                ProxyCallOptions::default(),
            ))
            .expect("call proxy");

        assert_eq!(response.text, "done");
        assert_eq!(response.model_name, "models/gemini-exp");
        assert_eq!(response.api_version, "v1");
        let sent: Value = serde_json::from_str(&mock.join().expect("mock thread"))
            .expect("request json");
        assert_eq!(sent, json!({ "prompt": "hello", "modelOverride": "gemini-exp" }));
    }

    #[test]
    fn call_without_override_sends_null() {
        let _lock = lock_env();
        let _override = EnvGuard::remove(ENV_MODEL_OVERRIDE);
        let (endpoint, mock) = serve_once(400, r#"{"error":"Prompt is required."}"#);
        let client = test_client();

        let err = runtime()
            .block_on(call_generation_proxy(
                &client,
                &endpoint,
                " ",
                ProxyCallOptions::default(),
            ))
            .expect_err("rejected");

        assert_eq!(err.to_string(), "Prompt is required.");
        let sent: Value = serde_json::from_str(&mock.join().expect("mock thread"))
            .expect("request json");
        assert_eq!(sent["modelOverride"], Value::Null);
    }

    #[test]
    fn cancelled_token_aborts_call() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent proxy");
        let endpoint = format!("http://{}/gemini-proxy", listener.local_addr().expect("addr"));
        let token = CancellationToken::new();
        token.cancel();
        let options = ProxyCallOptions {
            model_override: None,
            cancel: Some(token),
        };
        let client = test_client();

        let result =
            runtime().block_on(call_generation_proxy(&client, &endpoint, "hello", options));
        assert_eq!(result, Err(ClientError::Cancelled));
        drop(listener);
    }

    #[test]
    fn summarize_rejects_blank_transcript_without_calling() {
        let client = test_client();
        let result = runtime().block_on(summarize_transcript(
            &client,
            "http://127.0.0.1:9/unused",
            "   ",
            None,
        ));
        assert_eq!(result, Err(ClientError::EmptyTranscript));
    }

    #[test]
    fn summarize_parses_sections_and_sends_summary_models() {
        let (endpoint, mock) = serve_once(
            200,
            r#"{"text":"[Key Takeaways]\n- shipped\n[Next Actions]\n- plan Q3","modelName":"models/gemini-2.5-flash","apiVersion":"v1beta"}"#,
        );
        let client = test_client();

        let summary = runtime()
            .block_on(summarize_transcript(&client, &endpoint, "we met", None))
            .expect("summary");

        assert_eq!(summary.key_takeaways, "- shipped");
        assert_eq!(summary.next_actions, "- plan Q3");
        let sent: Value = serde_json::from_str(&mock.join().expect("mock thread"))
            .expect("request json");
        assert_eq!(sent["modelOverride"], SUMMARY_MODEL_OVERRIDE);
        assert!(sent["prompt"]
            .as_str()
            .is_some_and(|prompt| prompt.ends_with("Transcript:\nwe met")));
    }

    #[test]
    fn mindmap_rejects_blank_transcript_without_calling() {
        let client = test_client();
        let result = runtime().block_on(generate_mindmap(
            &client,
            "http://127.0.0.1:9/unused",
            "\n ",
            None,
        ));
        assert_eq!(result, Err(ClientError::EmptyTranscript));
    }

    #[test]
    fn mindmap_parses_outline_and_uses_default_override() {
        let _lock = lock_env();
        let _override = EnvGuard::set(ENV_MODEL_OVERRIDE, "gemini-exp");
        let (endpoint, mock) = serve_once(
            200,
            r#"{"text":"Sure! {\"rootTopic\":\"Growth\",\"emotions\":[\"pride\"]} Done.","modelName":"models/gemini-exp","apiVersion":"v1beta"}"#,
        );
        let client = test_client();

        let schema = runtime()
            .block_on(generate_mindmap(&client, &endpoint, "we met", None))
            .expect("mindmap");

        assert_eq!(schema.root_topic, "Growth");
        assert_eq!(schema.emotions, vec!["pride".to_string()]);
        assert!(schema.categories.is_empty());
        assert!(schema.actions.is_empty());
        let sent: Value = serde_json::from_str(&mock.join().expect("mock thread"))
            .expect("request json");
        assert_eq!(sent["modelOverride"], "gemini-exp");
        assert!(sent["prompt"]
            .as_str()
            .is_some_and(|prompt| prompt.ends_with("[Conversation]\nwe met")));
    }

    #[test]
    fn mindmap_without_json_reports_distinct_error() {
        let (endpoint, mock) = serve_once(
            200,
            r#"{"text":"I cannot help with that.","modelName":"m","apiVersion":"v1"}"#,
        );
        let client = test_client();

        let result = runtime().block_on(generate_mindmap(&client, &endpoint, "we met", None));

        assert_eq!(result, Err(ClientError::Mindmap(MindmapError::NoJsonObject)));
        mock.join().expect("mock thread");
    }
}
