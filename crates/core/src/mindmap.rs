//! Conversation mindmaps: the prompt asking for a JSON outline and the
//! extraction of that outline from the generated text.

use regex::Regex;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const MINDMAP_INSTRUCTIONS: &str = r#"You are a graphic facilitator with sharp logical thinking and deep empathy.
Read the [Conversation] below and output strictly the JSON format described.

[Steps]
1. Core theme:
   - Find the single most fundamental theme of the whole conversation and set it as "rootTopic".
2. Facts and topics:
   - Extract two or more clusters of concrete events or topics and store each in the "categories" array.
   - Dig deeper where useful, adding children up to about four levels.
3. Emotions and values:
   - Extract two or more keywords for the main emotions or values and store them in the "emotions" array.
4. Strong actions (verbs):
   - Extract two or more verbs showing what the speaker is good at or motivated by and store them in the "actions" array.
5. Rules:
   - Output nothing but JSON (no prose, no code fences).
   - Never omit a key; use an empty array when there is no value.

[Output format]
{
  "rootTopic": "core theme",
  "categories": [
    {
      "name": "topic category",
      "children": [{ "name": "detail" }]
    }
  ],
  "emotions": ["emotion keyword"],
  "actions": ["action keyword"]
}

---
[Conversation]"#;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MindmapError {
    #[error("AI response did not contain a JSON object.")]
    NoJsonObject,
    #[error("AI returned malformed mindmap JSON: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindmapCategory {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub children: Vec<MindmapCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindmapSchema {
    #[serde(default, deserialize_with = "lenient")]
    pub root_topic: String,
    #[serde(default, deserialize_with = "lenient")]
    pub categories: Vec<MindmapCategory>,
    #[serde(default, deserialize_with = "lenient")]
    pub emotions: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub actions: Vec<String>,
}

/// A field of the wrong shape reads as its default instead of failing the whole outline.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Returns `None` when the transcript is blank.
pub fn build_mindmap_prompt(transcript: &str) -> Option<String> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return None;
    }
    Some(format!("{MINDMAP_INSTRUCTIONS}\n{transcript}"))
}

/// Parses the outline from the span between the first `{` and the last `}`.
pub fn extract_mindmap_schema(text: &str) -> Result<MindmapSchema, MindmapError> {
    let span = Regex::new(r"\{[\s\S]*\}")
        .ok()
        .and_then(|re| re.find(text))
        .ok_or(MindmapError::NoJsonObject)?;
    serde_json::from_str(span.as_str()).map_err(|err| MindmapError::InvalidJson(err.to_string()))
}
