/// Failures that escape the analysis pipeline.
///
/// Unparseable model output is not an error: it is absorbed by the fallback
/// result, so once the remote call succeeds the caller always gets a value.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CriticError {
    /// Malformed or oversized input. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote completion call failed (timeout, non-2xx, no choices).
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The pipeline could not be constructed from its configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CriticError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP-like status a transport layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Api { status, .. } => *status,
            Self::Config(_) => 500,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
