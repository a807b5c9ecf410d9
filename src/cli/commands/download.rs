use crate::api::InvoiceApi;
use crate::cli::commands::connect;
use crate::config::InvoiceReviewConfig;
use crate::dashboard::DashboardRow;
use crate::highlight::{PdfPreview, PdfSource};
use anyhow::{bail, Result};
use std::path::PathBuf;

pub struct DownloadCommand {
    id: String,
    out: Option<PathBuf>,
    config: InvoiceReviewConfig,
}

impl DownloadCommand {
    pub fn new(id: String, out: Option<PathBuf>, config: InvoiceReviewConfig) -> Self {
        Self { id, out, config }
    }

    pub async fn execute(&self) -> Result<()> {
        let api = connect(&self.config)?;
        let invoice = api.get_invoice(&self.id).await?;

        let row = DashboardRow::from_invoice(&invoice);
        if !row.can_download {
            bail!(
                "Invoice {} is {}; only completed invoices can be downloaded",
                invoice.id,
                row.status_label
            );
        }

        let source = match &invoice.custom_generated_invoice_url {
            Some(url) if !url.is_empty() => PdfSource::Url(url.clone()),
            _ => PdfSource::Blob(api.get_custom_invoice(&invoice.id).await?),
        };
        let preview = PdfPreview::acquire(api.as_ref(), source).await?;

        let out = self
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(&invoice.file_name));
        preview.save_as(&out)?;

        println!("📥 Saved {} ({} bytes)", out.display(), preview.len());
        Ok(())
    }
}
