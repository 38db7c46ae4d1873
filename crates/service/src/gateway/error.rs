use thiserror::Error;

pub(crate) const ACCESS_RESTRICTED_MESSAGE: &str =
    "AI access is restricted or the API key is invalid. Please retry in a few minutes.";
pub(crate) const ALL_CANDIDATES_FAILED_MESSAGE: &str =
    "All Gemini model candidates failed to generate content.";

/// Why a dispatch produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Upstream answered 403; no other candidate was tried.
    #[error("{}", ACCESS_RESTRICTED_MESSAGE)]
    AccessRestricted,
    /// Every candidate was consumed; carries the last recorded error.
    #[error("{0}")]
    Exhausted(String),
}

impl DispatchError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AccessRestricted => 403,
            Self::Exhausted(_) => 500,
        }
    }
}
