use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("Catalog credential `{0}` is not configured")]
    MissingCredential(&'static str),

    #[error("Catalog API error: {status}")]
    Upstream { status: u16 },

    #[error("Catalog request timed out")]
    Timeout,

    #[error("Catalog request failed: {0}")]
    Transport(String),

    #[error("Failed to parse catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ArtworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ArtworkError::Timeout
        } else {
            ArtworkError::Transport(e.to_string())
        }
    }
}
