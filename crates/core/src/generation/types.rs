use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationRequestError {
    #[error("Invalid JSON payload.")]
    InvalidJson,
    #[error("Prompt is required.")]
    EmptyPrompt,
}

/// Inbound body of the generation proxy: `{ prompt, modelOverride? }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Already trimmed; never empty.
    pub prompt: String,
    /// Raw comma-separated override string, as the caller sent it.
    pub model_override: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: &str, model_override: Option<&str>) -> Result<Self, GenerationRequestError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationRequestError::EmptyPrompt);
        }
        Ok(Self {
            prompt: prompt.to_string(),
            model_override: model_override.map(str::to_string),
        })
    }

    pub fn from_json_bytes(body: &[u8]) -> Result<Self, GenerationRequestError> {
        // 中文注释：空 body 按 `{}` 处理，落到 prompt 校验而不是 JSON 校验。
        let value: Value = if body.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice(body).map_err(|_| GenerationRequestError::InvalidJson)?
        };
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, GenerationRequestError> {
        // 非字符串的 prompt 视为缺失；非字符串的 modelOverride 直接忽略。
        let prompt = value.get("prompt").and_then(Value::as_str).unwrap_or("");
        let model_override = value.get("modelOverride").and_then(Value::as_str);
        Self::new(prompt, model_override)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub text: String,
    pub model_name: String,
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Outbound `generateContent` body with a single user turn.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content<'a> {
    pub role: &'static str,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Part<'a> {
    pub text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn user_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}
