//! Sequential telemetry pull: authenticate, fetch, save as CSV, upload.

use std::path::PathBuf;

use iracing_client::drive::{DriveUploader, UploadedFile};
use iracing_client::{Config, IracingClient, csv_writer};

pub mod error;

pub use error::{PullError, PullResult};

/// What a completed run produced.
#[derive(Debug)]
pub struct PullOutcome {
    pub path: PathBuf,
    pub records: usize,
    pub uploaded: Option<UploadedFile>,
}

/// Run the pipeline once.
///
/// Each step only starts when the previous one succeeded: a rejected login
/// skips the fetch, a rejected fetch writes no file. `uploader` is `None`
/// when uploading is disabled.
pub async fn run(
    cfg: &Config,
    client: &dyn IracingClient,
    uploader: Option<&dyn DriveUploader>,
) -> PullResult<PullOutcome> {
    let auth = client
        .authenticate(&cfg.credentials)
        .await
        .map_err(PullError::Auth)?;

    let records = client
        .fetch_telemetry(&auth)
        .await
        .map_err(PullError::Fetch)?;

    let path = csv_writer::write_records(&records, &cfg.output_dir).map_err(PullError::Save)?;
    println!("All telemetry data saved to {}", path.display());

    let uploaded = match uploader {
        Some(uploader) => {
            let file = uploader.upload(&path).await.map_err(PullError::Upload)?;
            println!("File uploaded to Google Drive: {}", file.name);
            Some(file)
        }
        None => {
            tracing::info!("upload disabled; leaving file local");
            None
        }
    };

    Ok(PullOutcome {
        path,
        records: records.len(),
        uploaded,
    })
}
