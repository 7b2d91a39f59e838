//! `IracingClient` trait, telemetry record model and the reqwest-based client.

use async_trait::async_trait;
use thiserror::Error;

pub mod auth;
pub mod config;
pub mod csv_writer;
pub mod drive;
pub mod http_client;
pub mod records;

pub use auth::AuthContext;
pub use config::{Config, Credentials};
pub use records::{TelemetryRecord, key_union};

#[derive(Debug, Error)]
pub enum IracingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {status} - {body}")]
    Auth { status: u16, body: String },
    #[error("failed to fetch data: {status} - {body}")]
    Fetch { status: u16, body: String },
    #[error("decoding error: {0}")]
    Decode(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("oauth error: {0}")]
    OAuth(String),
    #[error("upload failed: {status} - {body}")]
    Upload { status: u16, body: String },
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl IracingError {
    /// Status code carried by a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            IracingError::Auth { status, .. }
            | IracingError::Fetch { status, .. }
            | IracingError::Upload { status, .. } => Some(*status),
            IracingError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[async_trait]
pub trait IracingClient: Send + Sync + 'static {
    /// Exchange credentials for a request context. The bearer variant never
    /// touches the network; the login variant posts to the login endpoint.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthContext, IracingError>;

    /// Fetch every telemetry record visible to the authenticated account.
    async fn fetch_telemetry(
        &self,
        auth: &AuthContext,
    ) -> Result<Vec<TelemetryRecord>, IracingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_rejections() {
        let err = IracingError::Auth {
            status: 401,
            body: "nope".into(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "authentication failed: 401 - nope");
        assert_eq!(IracingError::Config("x".into()).status(), None);
    }

    #[test]
    fn fetch_error_renders_status_and_body() {
        let err = IracingError::Fetch {
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "failed to fetch data: 503 - maintenance");
    }
}
