//! Upload command - Upload one file through a resumable session
//!
//! Provides the `driveup upload` CLI command which:
//! 1. Loads and validates configuration
//! 2. Reads the access token from the configured environment variable
//! 3. Creates the Graph adapter and the resumable upload controller
//! 4. Runs the upload, printing progress, and cancels it on Ctrl-C

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use driveup_core::config::Config;
use driveup_core::domain::{ParentFolder, RemoteFile};
use driveup_core::usecases::{ResumableUpload, UploadOptions};
use driveup_graph::client::GraphClient;
use driveup_graph::provider::GraphUploadProvider;

use crate::output::{get_formatter, OutputFormat};

/// Upload command options
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local file to upload
    pub file: PathBuf,

    /// Item ID of the destination folder
    #[arg(long)]
    pub folder_id: String,

    /// Path of the destination folder below the drive root (empty for root)
    #[arg(long, default_value = "")]
    pub folder_name: String,

    /// Remote file name (defaults to the local file name)
    #[arg(long)]
    pub name: Option<String>,
}

impl UploadCommand {
    /// Execute the upload command
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        // Step 1: Load config
        let config = Config::load_or_default(config_path);
        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::bail!(
                "Invalid configuration ({}): {}",
                config_path.display(),
                messages.join("; ")
            );
        }
        info!(config_path = %config_path.display(), "Loaded configuration");

        // Step 2: Access token
        let token = std::env::var(&config.auth.access_token_env).with_context(|| {
            format!(
                "No access token: set the {} environment variable",
                config.auth.access_token_env
            )
        })?;

        // Step 3: Adapters and controller
        let client = GraphClient::with_base_url(token, &config.graph.base_url);
        let provider = Arc::new(GraphUploadProvider::new(client));
        let folder = ParentFolder::new(&self.folder_id, &self.folder_name)
            .context("Invalid destination folder")?;
        let options = UploadOptions::from(&config.upload);

        let upload = match &self.name {
            Some(name) => {
                ResumableUpload::new(
                    provider.clone(),
                    provider,
                    &self.file,
                    name.as_str(),
                    folder,
                    options,
                )
                .await
            }
            None => {
                ResumableUpload::for_file(provider.clone(), provider, &self.file, folder, options)
                    .await
            }
        }
        .with_context(|| format!("Failed to start upload of {}", self.file.display()))?;
        let upload = Arc::new(upload);

        formatter.info(&format!(
            "Uploading {} ({} bytes)",
            upload.upload_file().display(),
            upload.file_size()
        ));

        // Step 4: Progress reporter
        let reporter = {
            let mut progress = upload.subscribe_progress();
            tokio::spawn(async move {
                let formatter = get_formatter(format);
                while progress.changed().await.is_ok() {
                    let current = *progress.borrow_and_update();
                    formatter.progress(&current);
                }
            })
        };

        // Step 5: Run, canceling on Ctrl-C
        let runner = {
            let upload = upload.clone();
            async move { upload.start_upload().await }
        };
        tokio::pin!(runner);

        let outcome = tokio::select! {
            result = &mut runner => result,
            _ = tokio::signal::ctrl_c() => {
                formatter.warn("Interrupted, canceling upload");
                if let Err(e) = upload.cancel_upload().await {
                    warn!(error = %e, "Remote session could not be deleted");
                    formatter.warn(&format!("Remote session could not be deleted: {e}"));
                }
                (&mut runner).await
            }
        };
        reporter.abort();

        match outcome.context("Upload failed")? {
            Some(file) => {
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&summary_json(&file));
                } else {
                    formatter.success(&format!("Uploaded {} ({} bytes)", file.name, file.size));
                    formatter.info(&format!("ID: {}", file.id));
                    if let Some(url) = &file.web_url {
                        formatter.info(&format!("URL: {}", url));
                    }
                }
                Ok(())
            }
            None => {
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "canceled": true,
                        "file": self.file.display().to_string(),
                    }));
                }
                anyhow::bail!("Upload of {} was canceled", self.file.display())
            }
        }
    }
}

/// JSON summary of a finished upload
fn summary_json(file: &RemoteFile) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "id": file.id,
        "name": file.name,
        "size": file.size,
        "web_url": file.web_url,
        "last_modified": file.last_modified.map(|t| t.to_rfc3339()),
    })
}
