//! HTTP client implementation for the iRacing data API.
//!
//! This module provides a reqwest-based implementation of the [`IracingClient`](crate::IracingClient) trait.

use crate::auth::{AuthContext, encode_password};
use crate::records::{TelemetryRecord, records_from_value};
use crate::{Credentials, IracingClient, IracingError};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::time::Duration;

pub const LOGIN_PATH: &str = "/auth";
pub const TELEMETRY_PATH: &str = "/data/telemetry/all";

/// Client for the iRacing API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestIracingClient {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestIracingClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "https://members-ng.iracing.com")
    /// * `timeout` - Upper bound for every request issued by this client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IracingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, IracingError> {
        let raw = format!("{}{}", self.base_url, path);
        raw.parse()
            .map_err(|e| IracingError::Config(format!("invalid url {raw}: {e}")))
    }

    /// Post the hashed credentials and turn the response cookies into a session.
    async fn login(&self, email: &str, password: &str) -> Result<AuthContext, IracingError> {
        let url = self.url(LOGIN_PATH)?;
        let body = serde_json::json!({
            "email": email,
            "password": encode_password(email, password),
        });

        tracing::debug!(%url, "posting login request");
        let resp = self.client.post(url).json(&body).send().await?;
        let status = resp.status().as_u16();
        if status != 200 {
            let body = failure_body(resp).await;
            tracing::warn!(status, "login rejected");
            return Err(IracingError::Auth { status, body });
        }

        tracing::info!("login succeeded");
        Ok(AuthContext::session_from_response(&resp))
    }
}

/// Body of a failed response, reported verbatim.
async fn failure_body(resp: reqwest::Response) -> String {
    resp.text().await.unwrap_or_default()
}

#[async_trait]
impl IracingClient for ReqwestIracingClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthContext, IracingError> {
        match credentials {
            Credentials::ApiKey(key) => Ok(AuthContext::Bearer(key.clone())),
            Credentials::Login { email, password } => {
                self.login(email, password.expose_secret()).await
            }
        }
    }

    async fn fetch_telemetry(
        &self,
        auth: &AuthContext,
    ) -> Result<Vec<TelemetryRecord>, IracingError> {
        let url = self.url(TELEMETRY_PATH)?;
        tracing::debug!(%url, mode = auth.mode(), "fetching telemetry");

        let request = auth.authorize(self.client.get(url.clone()), &url);
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        if status != 200 {
            let body = failure_body(resp).await;
            tracing::warn!(status, "telemetry fetch rejected");
            return Err(IracingError::Fetch { status, body });
        }

        // Read body as text first so decoding failures can quote it.
        let text = resp.text().await?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            let snippet: String = text.chars().take(512).collect();
            IracingError::Decode(format!("decoding telemetry: {e} - body: {snippet}"))
        })?;
        let records = records_from_value(value)?;
        tracing::info!(count = records.len(), "fetched telemetry records");
        Ok(records)
    }
}
