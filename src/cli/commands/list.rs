use crate::api::InvoiceApi;
use crate::cli::commands::connect;
use crate::config::InvoiceReviewConfig;
use crate::dashboard::{self, DashboardRow};
use anyhow::Result;

pub struct ListCommand {
    config: InvoiceReviewConfig,
}

impl ListCommand {
    pub fn new(config: InvoiceReviewConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<()> {
        println!("📋 INVOICES");
        println!("===========");
        println!();

        let api = connect(&self.config)?;
        let invoices = api.list_invoices().await?;
        println!();

        if invoices.is_empty() {
            println!("📭 No invoices yet");
            println!("💡 Upload one with 'invoice-review upload FILE.pdf'");
            return Ok(());
        }

        let rows: Vec<DashboardRow> = dashboard::rows(&invoices);
        print!("{}", dashboard::render_table(&rows));
        println!();

        let completed = rows.iter().filter(|r| r.can_download).count();
        println!("💼 {} invoices, {} completed", rows.len(), completed);
        Ok(())
    }
}
