use thiserror::Error;

/// Failure of a client call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// The server's `message`, or the operation's fallback text.
        message: String,
    },

    /// The configured base URL cannot have request paths appended.
    #[error("invalid base url {base_url}: {reason}")]
    InvalidBaseUrl {
        /// The base URL the client was built with.
        base_url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// The user-facing message: the server's text when it sent one.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::InvalidBaseUrl { .. } => self.to_string(),
            Self::Transport(error) => error.to_string(),
        }
    }

    /// HTTP status of an [`ClientError::Api`] failure.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::InvalidBaseUrl { .. } | Self::Transport(_) => None,
        }
    }
}
