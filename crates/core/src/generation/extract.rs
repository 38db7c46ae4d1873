use serde_json::Value;

const PRIMARY_PARTS_POINTER: &str = "/candidates/0/content/parts";
const NESTED_PARTS_POINTER: &str = "/candidates/0/candidates/0/content/parts";

/// Pulls the generated text out of a `generateContent` payload.
///
/// Parts are read from `candidates[0].content.parts`, falling back to the
/// nested `candidates[0].candidates[0].content.parts` shape. Non-empty `text`
/// entries are joined with `\n` and trimmed; an empty result yields `None`.
pub fn extract_text(payload: &Value) -> Option<String> {
    // 中文注释：两种结构都保留，先命中的优先；嵌套结构是否仍会出现尚未确认。
    let parts = payload
        .pointer(PRIMARY_PARTS_POINTER)
        .filter(|value| !value.is_null())
        .or_else(|| {
            payload
                .pointer(NESTED_PARTS_POINTER)
                .filter(|value| !value.is_null())
        })?;
    let parts = parts.as_array()?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
