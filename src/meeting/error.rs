//! Error taxonomy for pipeline stages.
//!
//! Every stage converts its internal failures into one of these variants so
//! the API layer can map them onto status codes without inspecting message
//! text. `RateLimited` carries the wait suggested by the upstream service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    /// A referenced entity (meeting, transcript) does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request or the stored record is not in a usable shape.
    #[error("{0}")]
    InvalidInput(String),

    /// The uploaded payload exceeds the configured ceiling.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The external capability is missing its credential. Operator action
    /// required; no status transition happens for this.
    #[error("{0}")]
    Unconfigured(String),

    /// The external capability is throttling us.
    #[error("{message}")]
    RateLimited {
        message: String,
        /// Suggested wait before retrying, as reported by the service
        /// (e.g. "7m12.34s"), or a generic hint.
        retry_after: String,
    },

    /// Anything else: network, parse, persistence. The meeting has been
    /// marked failed by the time this surfaces.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

pub type StageResult<T> = std::result::Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = StageError::NotFound("Meeting not found".to_string());
        assert_eq!(err.to_string(), "Meeting not found");

        let err = StageError::RateLimited {
            message: "Rate limit exceeded. Please wait 2m30s and try again.".to_string(),
            retry_after: "2m30s".to_string(),
        };
        assert!(err.to_string().contains("2m30s"));
    }

    #[test]
    fn test_from_anyhow() {
        let err: StageError = anyhow::anyhow!("connection reset").into();
        assert!(matches!(err, StageError::Failed(_)));
        assert_eq!(err.to_string(), "connection reset");
    }
}
