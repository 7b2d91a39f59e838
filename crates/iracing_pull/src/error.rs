//! Pipeline errors, tagged with the step that failed.

use iracing_client::IracingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PullError {
    #[error("{0}")]
    Config(IracingError),

    #[error("{0}")]
    Auth(IracingError),

    #[error("{0}")]
    Fetch(IracingError),

    #[error("failed to save telemetry: {0}")]
    Save(IracingError),

    #[error("failed to upload to Google Drive: {0}")]
    Upload(IracingError),
}

impl PullError {
    /// Whether the failure ends the run with a printed diagnostic only.
    ///
    /// Credential, login and fetch failures are reported and the run stops;
    /// local write and upload failures propagate out of `main`.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            PullError::Config(_) | PullError::Auth(_) | PullError::Fetch(_)
        )
    }
}

/// Result type alias for pipeline operations.
pub type PullResult<T> = Result<T, PullError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_vs_propagated() {
        let auth = PullError::Auth(IracingError::Auth {
            status: 401,
            body: String::new(),
        });
        assert!(auth.is_reported());
        let upload = PullError::Upload(IracingError::OAuth("denied".into()));
        assert!(!upload.is_reported());
        assert_eq!(
            upload.to_string(),
            "failed to upload to Google Drive: oauth error: denied"
        );
    }
}
