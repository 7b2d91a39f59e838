use crate::IracingError;
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://members-ng.iracing.com";
pub const DEFAULT_OUTPUT_DIR: &str = "./iracing_data";
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com";

/// Credentials for one of the two authentication modes.
#[derive(Clone, Debug)]
pub enum Credentials {
    ApiKey(SecretString),
    Login {
        email: String,
        password: SecretString,
    },
}

/// Settings for the Google Drive upload step.
#[derive(Clone, Debug)]
pub struct DriveConfig {
    pub client_secrets: PathBuf,
    pub token_cache: PathBuf,
    pub base_url: String,
    pub auth_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: String,
    pub output_dir: PathBuf,
    pub http_timeout: Duration,
    pub skip_upload: bool,
    pub drive: DriveConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, IracingError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function, so tests never have to mutate the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, IracingError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // Empty values are treated as unset.
        let mut get = move |k: &str| get(k).filter(|v| !v.trim().is_empty());

        let credentials = resolve_credentials(&mut get)?;
        let base_url = get("IRACING_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let output_dir = get("IRACING_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let http_timeout = parse_secs(
            get("IRACING_HTTP_TIMEOUT_SECS"),
            "IRACING_HTTP_TIMEOUT_SECS",
            30,
        )?;
        let skip_upload = get("IRACING_SKIP_UPLOAD")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let drive = DriveConfig {
            client_secrets: get("GOOGLE_CLIENT_SECRETS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("client_secrets.json")),
            token_cache: get("GOOGLE_TOKEN_CACHE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("drive_token.json")),
            base_url: get("GOOGLE_DRIVE_BASE_URL").unwrap_or_else(|| DEFAULT_DRIVE_BASE_URL.into()),
            auth_timeout: parse_secs(
                get("GOOGLE_OAUTH_TIMEOUT_SECS"),
                "GOOGLE_OAUTH_TIMEOUT_SECS",
                300,
            )?,
        };

        Ok(Self {
            credentials,
            base_url,
            output_dir,
            http_timeout,
            skip_upload,
            drive,
        })
    }
}

fn resolve_credentials<F>(get: &mut F) -> Result<Credentials, IracingError>
where
    F: FnMut(&str) -> Option<String>,
{
    let api_key = get("IRACING_API_KEY");
    let email = get("IRACING_EMAIL");
    let password = get("IRACING_PASSWORD");

    let bearer = |key: Option<String>| {
        key.map(|k| Credentials::ApiKey(SecretString::new(k.into())))
            .ok_or_else(|| IracingError::Config("IRACING_API_KEY missing".into()))
    };
    let login = |email: Option<String>, password: Option<String>| match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials::Login {
            email,
            password: SecretString::new(password.into()),
        }),
        (None, Some(_)) => Err(IracingError::Config("IRACING_EMAIL missing".into())),
        (Some(_), None) => Err(IracingError::Config("IRACING_PASSWORD missing".into())),
        (None, None) => Err(IracingError::Config(
            "IRACING_EMAIL and IRACING_PASSWORD missing".into(),
        )),
    };

    match get("IRACING_AUTH_MODE").map(|m| m.to_ascii_lowercase()).as_deref() {
        Some("bearer") => bearer(api_key),
        Some("login") => login(email, password),
        Some(other) => Err(IracingError::Config(format!(
            "IRACING_AUTH_MODE must be `bearer` or `login`, got `{other}`"
        ))),
        None if api_key.is_some() => bearer(api_key),
        None if email.is_some() || password.is_some() => login(email, password),
        None => Err(IracingError::Config(
            "set IRACING_API_KEY, or IRACING_EMAIL and IRACING_PASSWORD".into(),
        )),
    }
}

fn parse_secs(value: Option<String>, name: &str, default: u64) -> Result<Duration, IracingError> {
    match value {
        None => Ok(Duration::from_secs(default)),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| IracingError::Config(format!("{name} must be a whole number of seconds"))),
    }
}
