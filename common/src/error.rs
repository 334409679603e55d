use thiserror::Error;

/// Errors raised while establishing or tearing down a wallet session.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// The wallet extension or SDK is not present in this environment.
    #[error("wallet is not installed")]
    NotInstalled,
    /// An operation needed a session but none is established.
    #[error("wallet is not connected")]
    NotConnected,
    /// The user declined the connection prompt.
    #[error("connection request was rejected")]
    UserRejected,
    /// The SDK failed (network error, timeout, unexpected response).
    #[error("wallet error: {0}")]
    Sdk(String),
}

/// Errors raised while submitting a signing request.
///
/// A declined or expired signature is not an error: it is reported through
/// [`crate::provider::SigningRequest`] resolving to `None`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("wallet is not connected")]
    NotConnected,
    #[error("request was rejected")]
    Rejected,
    #[error("wallet error: {0}")]
    Sdk(String),
}

impl From<SdkError> for ConnectorError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::NotInstalled => ConnectorError::NotInstalled,
            SdkError::Failed(msg) => ConnectorError::Sdk(msg),
        }
    }
}

impl From<SdkError> for ProviderError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::NotInstalled => ProviderError::NotConnected,
            SdkError::Failed(msg) => ProviderError::Sdk(msg),
        }
    }
}

/// Failure reported by a wallet SDK binding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("SDK not available")]
    NotInstalled,
    #[error("{0}")]
    Failed(String),
}

/// Failure reported by the platform backend to a workflow.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
