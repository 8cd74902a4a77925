//! Error types for fintrack-client

use fintrack_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Server responded with {status}")]
    Status { status: u16 },

    #[error("Invalid response body: {message}")]
    Decode { message: String },

    #[error("Could not build HTTP client: {message}")]
    Setup { message: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ClientError::Decode {
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            ClientError::Status {
                status: status.as_u16(),
            }
        } else {
            ClientError::Transport(error)
        }
    }
}

impl From<ClientError> for CoreError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Transport(e) => CoreError::Transport {
                message: e.to_string(),
            },
            ClientError::Status { status } => CoreError::Status { status },
            ClientError::Decode { message } => CoreError::Decode { message },
            ClientError::Setup { message } => CoreError::InternalError { message },
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
