use poap_common::error::{BackendError, ProviderError};
use thiserror::Error;

/// Shown when the backend fails without saying why.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("the server did not respond in time")]
    Timeout,
    #[error("network error: {0}")]
    Http(String),
    /// Non-success response. `message` is the server's own when it sent one.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    /// Missing or expired login.
    #[error("please log in again")]
    Unauthorized,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<ApiError> for BackendError {
    fn from(err: ApiError) -> Self {
        BackendError::new(err.to_string())
    }
}

/// Login failure: the wallet refused to prove ownership, or the backend
/// refused the proof.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Wallet(#[from] ProviderError),
}
