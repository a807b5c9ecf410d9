use crate::api::InvoiceApi;
use crate::cli::commands::connect;
use crate::config::InvoiceReviewConfig;
use crate::highlight::{HighlightLayer, PdfSource, PreviewSlot};
use anyhow::Result;

pub struct HighlightsCommand {
    id: String,
    page: Option<u32>,
    svg: bool,
    config: InvoiceReviewConfig,
}

impl HighlightsCommand {
    pub fn new(id: String, page: Option<u32>, svg: bool, config: InvoiceReviewConfig) -> Self {
        Self {
            id,
            page,
            svg,
            config,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let api = connect(&self.config)?;
        let invoice = api.get_invoice(&self.id).await?;
        let layer = HighlightLayer::from_attributes(&invoice.attributes);

        if self.svg {
            print!("{}", layer.render_svg(self.page.unwrap_or(0)));
            return Ok(());
        }

        let mut slot = PreviewSlot::new();
        if let Some(url) = &invoice.file_url {
            match slot.load(api.as_ref(), PdfSource::Url(url.clone())).await {
                Ok(preview) => println!("📄 Source PDF: {} bytes", preview.len()),
                Err(e) => println!("⚠️  Source PDF unavailable: {e}"),
            }
        }

        let pages: Vec<u32> = match self.page {
            Some(page) => vec![page],
            None => layer.pages().collect(),
        };
        if pages.iter().all(|&p| layer.boxes_for_page(p).is_empty()) {
            println!("🖍️  No highlight boxes");
            return Ok(());
        }

        for page in pages {
            println!("📃 Page {page}:");
            for highlight in layer.boxes_for_page(page) {
                println!(
                    "   {:<9} {:<20} left {:>6.2}% top {:>6.2}% {:>6.2}% x {:>6.2}%",
                    highlight.color().css(),
                    highlight.attribute_name,
                    highlight.left,
                    highlight.top,
                    highlight.width,
                    highlight.height,
                );
            }
        }
        Ok(())
    }
}
