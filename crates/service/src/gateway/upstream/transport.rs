use oneonone_core::generation::GenerateContentRequest;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use url::Url;

use super::outcome::is_usable_payload;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
    #[error("{0}")]
    Send(String),
}

/// What came back from one `generateContent` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    /// `None` when the body was not JSON or was `null`, `false`, `0` or `""`.
    pub payload: Option<Value>,
}

/// One `generateContent` call against a (model, version) endpoint.
pub trait GenerateTransport: Clone + Send + Sync + 'static {
    fn generate(
        &self,
        target: &UpstreamTarget,
        prompt: &str,
    ) -> impl Future<Output = Result<UpstreamReply, TransportError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub base_url: String,
    pub api_version: String,
    pub model_name: String,
    pub api_key: String,
}

impl UpstreamTarget {
    pub(crate) fn endpoint(&self) -> String {
        format!(
            "{}/{}/{}:generateContent",
            self.base_url, self.api_version, self.model_name
        )
    }

    pub(crate) fn request_url(&self) -> Result<Url, TransportError> {
        let endpoint = self.endpoint();
        let mut url = Url::parse(&endpoint).map_err(|_| TransportError::InvalidUrl(endpoint))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl GenerateTransport for ReqwestTransport {
    async fn generate(
        &self,
        target: &UpstreamTarget,
        prompt: &str,
    ) -> Result<UpstreamReply, TransportError> {
        let url = target.request_url()?;
        let response = self
            .client
            .post(url)
            .json(&GenerateContentRequest::user_prompt(prompt))
            .send()
            .await
            // 中文注释：reqwest 错误文本里带完整 URL（含 key），这里去掉 URL 再记录。
            .map_err(|err| TransportError::Send(err.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Send(err.without_url().to_string()))?;
        let payload = serde_json::from_slice::<Value>(&body)
            .ok()
            .filter(is_usable_payload);
        Ok(UpstreamReply { status, payload })
    }
}
