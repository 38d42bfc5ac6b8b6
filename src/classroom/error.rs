use thiserror::Error;

/// Failures surfaced by the remote classroom service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unauthorized; the session token was rejected")]
    Unauthorized,

    #[error("non-JSON response: {0}")]
    NonJson(String),

    #[error("sign-in succeeded but no token was found in the response")]
    MissingToken,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }
}
