use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::Error;

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::ConnectionRefused
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("connection refused")
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::TimedOut
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("timed out")
        {
            return true;
        }

        current = source.source();
    }

    false
}

/// Classifies a transport-level failure into `ModelUnavailable` with an
/// actionable reason. Status-level failures are handled by the provider.
pub(crate) fn request_error(err: reqwest::Error, endpoint: &str, timeout_secs: u64) -> Error {
    let reason = if err.is_timeout() || error_chain_has_timeout(&err) {
        format!(
            "request timed out after {timeout_secs}s. \
             Increase MODEL_TIMEOUT_SECS or check model responsiveness."
        )
    } else if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            "connection refused. Ensure the model server is running (`ollama serve`) \
             and OLLAMA_BASE_URL is correct."
                .to_string()
        } else {
            "failed to connect. Check OLLAMA_BASE_URL and network connectivity.".to_string()
        }
    } else {
        err.to_string()
    };

    Error::ModelUnavailable {
        endpoint: endpoint.to_string(),
        reason,
    }
}
