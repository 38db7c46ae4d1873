pub mod candidates;
pub mod extract;
pub mod types;

pub use candidates::{
    build_candidate_list, normalize_model_name, parse_model_override, API_VERSION_CANDIDATES,
    DEFAULT_MODELS, MODEL_NAMESPACE,
};
pub use extract::extract_text;
pub use types::{
    ErrorBody, GenerateContentRequest, GenerationRequest, GenerationRequestError,
    GenerationResult,
};
