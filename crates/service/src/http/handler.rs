use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, Method, Request as HttpRequest, Response, StatusCode};
use oneonone_core::generation::{GenerationRequest, GenerationRequestError};
use thiserror::Error;

use crate::gateway::{
    runtime_config, GenerateTransport, GenerationDispatcher, ProxyConfig, Sleeper,
};
use crate::http::response::{error_response, json_response, preflight_response};

/// Faults raised before any upstream call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Server is missing GEMINI_API_KEY.")]
    MissingCredential,
    #[error("Request body too large (limit {0} bytes).")]
    PayloadTooLarge(usize),
    #[error(transparent)]
    Invalid(#[from] GenerationRequestError),
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyState<T, S> {
    pub(crate) dispatcher: GenerationDispatcher<T, S>,
    pub(crate) api_key: Option<String>,
    pub(crate) max_body_bytes: usize,
}

impl<T, S> ProxyState<T, S>
where
    T: GenerateTransport,
    S: Sleeper,
{
    pub fn new(config: &ProxyConfig, transport: T, sleeper: S) -> Self {
        let dispatcher = GenerationDispatcher::new(transport, sleeper, &config.upstream_base_url);
        Self::from_dispatcher(dispatcher, config.api_key.clone())
    }

    pub fn from_dispatcher(dispatcher: GenerationDispatcher<T, S>, api_key: Option<String>) -> Self {
        Self {
            dispatcher,
            api_key,
            max_body_bytes: runtime_config::proxy_max_body_bytes(),
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

fn request_error_response(err: RequestError) -> Response<Body> {
    log::debug!("event=generation_request_rejected status={} err={}", err.status_code(), err);
    error_response(err.status_code(), err.to_string())
}

async fn read_generation_request(
    headers: &header::HeaderMap,
    body: Body,
    max_body_bytes: usize,
) -> Result<GenerationRequest, RequestError> {
    if let Some(content_length) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
    {
        if content_length > max_body_bytes as u64 {
            return Err(RequestError::PayloadTooLarge(max_body_bytes));
        }
    }
    // 中文注释：没有 content-length（chunked）时同样要限流，靠 to_bytes 的上限兜住。
    let bytes = to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| RequestError::PayloadTooLarge(max_body_bytes))?;
    Ok(GenerationRequest::from_json_bytes(&bytes)?)
}

pub(crate) async fn generation_proxy_handler<T, S>(
    State(state): State<ProxyState<T, S>>,
    request: HttpRequest<Body>,
) -> Response<Body>
where
    T: GenerateTransport,
    S: Sleeper,
{
    let (parts, body) = request.into_parts();
    if parts.method == Method::OPTIONS {
        return preflight_response();
    }
    if parts.method != Method::POST {
        return request_error_response(RequestError::MethodNotAllowed);
    }
    // 中文注释：凭据缺失属于服务端配置问题，先于请求体校验返回 500。
    let Some(api_key) = state.api_key.as_deref() else {
        return request_error_response(RequestError::MissingCredential);
    };
    let generation_request =
        match read_generation_request(&parts.headers, body, state.max_body_bytes).await {
            Ok(generation_request) => generation_request,
            Err(err) => return request_error_response(err),
        };

    match state.dispatcher.generate(api_key, &generation_request).await {
        Ok(result) => json_response(StatusCode::OK, &result),
        Err(err) => {
            let status = StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, err.to_string())
        }
    }
}

pub(crate) async fn not_found_handler() -> Response<Body> {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
