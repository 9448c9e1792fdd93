//! Errors surfaced by the client flows.

use thiserror::Error;

/// Shown when neither the server nor the provider supplied a message.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while processing your request. Please try again.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Bad amount or missing required field; no request was made.
    #[error("{0}")]
    Validation(String),

    /// The card SDK or card input has not finished loading.
    #[error("Payment system is not ready. Please wait a moment and try again.")]
    NotReady,

    /// The request never reached the server.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status or a failure body.
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// The payment provider declined or could not complete the payment.
    #[error("Payment error: {}", .0.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    Payment(Option<String>),

    /// Browser storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The control is already handling a request.
    #[error("A request is already in progress")]
    Busy,
}

impl ClientError {
    /// Text to show next to the form or control.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::NotReady => self.to_string(),
            ClientError::Network(msg) => format!(
                "Network error: {}. Please check your connection and submit again.",
                msg
            ),
            ClientError::Server { message, .. } | ClientError::Payment(message) => message
                .clone()
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            ClientError::Storage(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            ClientError::Busy => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Server {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: None,
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
