use thiserror::Error;

/// Failures talking to the remote data collaborator.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Collaborator returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed collaborator response: {0}")]
    Decode(String),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

impl NetworkError {
    /// Connection failures and 5xx answers are worth another attempt; a 4xx
    /// or an undecodable body will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Request(e) => !e.is_decode() && !e.is_builder(),
            NetworkError::Status { status, .. } => *status >= 500,
            NetworkError::Decode(_) => false,
            NetworkError::Unavailable(_) => true,
        }
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let server = NetworkError::Status { status: 503, url: "/tasks".into() };
        let client = NetworkError::Status { status: 404, url: "/tasks/9".into() };

        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!NetworkError::Decode("eof".into()).is_retryable());
        assert!(NetworkError::Unavailable("down".into()).is_retryable());
    }
}
