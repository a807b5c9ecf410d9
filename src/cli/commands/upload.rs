use crate::api::{ensure_pdf, InvoiceApi};
use crate::cli::commands::connect;
use crate::config::InvoiceReviewConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub const UPLOADED_NOTICE: &str = "File Uploaded Successfully";

pub struct UploadCommand {
    file: PathBuf,
    config: InvoiceReviewConfig,
}

impl UploadCommand {
    pub fn new(file: PathBuf, config: InvoiceReviewConfig) -> Self {
        Self { file, config }
    }

    pub async fn execute(&self) -> Result<()> {
        let bytes = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let file_name = self
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Rejected locally so a bad file never reaches the service
        if let Err(e) = ensure_pdf(&file_name, &bytes) {
            println!("❌ {}", e.notice());
            return Err(e.into());
        }

        println!("📤 Uploading {} ({} bytes)", file_name, bytes.len());
        let api = connect(&self.config)?;
        match api.upload_invoice(&file_name, bytes).await {
            Ok(()) => {
                println!("✅ {UPLOADED_NOTICE}");
                println!("💡 It will appear in 'invoice-review list' once processing finishes");
                Ok(())
            }
            Err(e) => {
                println!("❌ {}", e.notice());
                Err(e.into())
            }
        }
    }
}
