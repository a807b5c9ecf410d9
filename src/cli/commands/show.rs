use crate::api::InvoiceApi;
use crate::cli::commands::{connect, print_attribute_table};
use crate::config::InvoiceReviewConfig;
use crate::highlight::HighlightLayer;
use crate::invoice::{validate, AttributeEditor};
use anyhow::Result;

pub struct ShowCommand {
    id: String,
    config: InvoiceReviewConfig,
}

impl ShowCommand {
    pub fn new(id: String, config: InvoiceReviewConfig) -> Self {
        Self { id, config }
    }

    pub async fn execute(&self) -> Result<()> {
        let api = connect(&self.config)?;
        let invoice = api.get_invoice(&self.id).await?;
        println!();

        println!("🧾 INVOICE {}", invoice.id);
        println!("──────────────────────");
        println!("   📄 File:   {}", invoice.file_name);
        println!("   📊 Status: {}", invoice.state);
        if let Some(url) = &invoice.file_url {
            println!("   🔗 Source: {url}");
        }
        if let Some(url) = &invoice.custom_generated_invoice_url {
            println!("   🏁 Output: {url}");
        }
        println!("   🧭 Resumes at: {}", invoice.state.wizard_step());
        println!();

        let editor = AttributeEditor::new(&invoice.attributes, self.config.mapping_rules());
        println!("🔖 ATTRIBUTES:");
        print_attribute_table(&editor);
        println!();

        let layer = HighlightLayer::from_attributes(&invoice.attributes);
        println!(
            "🖍️  {} highlight boxes across {} pages",
            layer.len(),
            layer.pages().count()
        );

        let report = validate(
            &invoice.attributes,
            &self.config.validation_rules(),
            chrono::Local::now().date_naive(),
        );
        if report.has_errors() {
            println!("⚠️  Validation would fail:");
            for failure in report.failures() {
                println!("   ❌ {}: {}", failure.attribute_name, failure.message);
            }
        } else {
            println!("✅ Validation would pass");
        }
        Ok(())
    }
}
