pub const MODEL_NAMESPACE: &str = "models/";
pub const DEFAULT_MODELS: [&str; 2] = ["models/gemini-2.5-flash", "models/gemini-1.5-flash"];
/// Newer protocol first, legacy second.
pub const API_VERSION_CANDIDATES: [&str; 2] = ["v1beta", "v1"];

pub fn normalize_model_name(model: &str) -> String {
    if model.starts_with(MODEL_NAMESPACE) {
        model.to_string()
    } else {
        format!("{MODEL_NAMESPACE}{model}")
    }
}

pub fn parse_model_override(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(normalize_model_name)
        .collect()
}

/// Override entries first, then the defaults; duplicates keep their first position.
pub fn build_candidate_list(model_override: Option<&str>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(DEFAULT_MODELS.len());
    let defaults = DEFAULT_MODELS.iter().map(|model| model.to_string());
    for model in parse_model_override(model_override).into_iter().chain(defaults) {
        if !candidates.contains(&model) {
            candidates.push(model);
        }
    }
    candidates
}
