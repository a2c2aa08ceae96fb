use thiserror::Error;

/// Failure talking to the catalog server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL cannot be combined with a resource path.
    #[error("invalid API url {url}: {reason}")]
    InvalidUrl {
        /// URL that failed to parse.
        url: String,
        /// Parser message.
        reason: String,
    },
    /// The request never produced a response (connection, timeout, TLS).
    #[error("request to {path} failed: {source}")]
    Transport {
        /// Resource path of the request.
        path: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("server returned {status} for {path}: {message}")]
    Status {
        /// Resource path of the request.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the canonical reason.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("unexpected response from {path}: {source}")]
    Decode {
        /// Resource path of the request.
        path: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of a server-side failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
