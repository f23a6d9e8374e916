use thiserror::Error;

/// Error taxonomy for the chat client.
///
/// Model-call failures are recovered at the REPL loop (printed with
/// guidance, prompt continues); `Configuration` aborts startup before the
/// loop is entered.
#[derive(Debug, Error)]
pub enum Error {
    #[error("model endpoint at '{endpoint}' is unreachable: {reason}")]
    ModelUnavailable { endpoint: String, reason: String },

    #[error("model '{model}' is not served by '{endpoint}'")]
    ModelNotFound { model: String, endpoint: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unexpected response from model endpoint: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
