use iracing_client::Config;
use iracing_client::drive::{DriveUploader, GoogleDriveUploader, InstalledFlowTokenProvider};
use iracing_client::http_client::ReqwestIracingClient;
use iracing_pull::PullError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure logging from env var `IRACING_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("IRACING_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // Keep the OAuth and HTTP internals quiet by default
    let combined_filter = format!("{},hyper=warn,yup_oauth2=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,yup_oauth2=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("iracing_pull: log filter: {}", log_env);

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}", PullError::Config(e));
            return Ok(());
        }
    };

    let client = ReqwestIracingClient::new(&cfg.base_url, cfg.http_timeout)?;
    let uploader = if cfg.skip_upload {
        None
    } else {
        Some(GoogleDriveUploader::new(
            &cfg.drive.base_url,
            InstalledFlowTokenProvider::from_config(&cfg.drive),
            cfg.http_timeout,
        )?)
    };

    let uploader = uploader.as_ref().map(|u| u as &dyn DriveUploader);
    match iracing_pull::run(&cfg, &client, uploader).await {
        Ok(outcome) => {
            tracing::info!(
                records = outcome.records,
                path = %outcome.path.display(),
                "iracing_pull: run complete"
            );
            Ok(())
        }
        Err(e) if e.is_reported() => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
