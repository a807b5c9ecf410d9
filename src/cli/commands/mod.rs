use crate::api::InvoiceApiClient;
use crate::config::InvoiceReviewConfig;
use crate::invoice::AttributeEditor;
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

pub mod download;
pub mod highlights;
pub mod init;
pub mod list;
pub mod review;
pub mod show;
pub mod upload;

/// Build the API client, reporting progress the same way for every command
pub fn connect(config: &InvoiceReviewConfig) -> Result<Arc<InvoiceApiClient>> {
    print!("🔄 Connecting to {}... ", config.api.base_url);
    std::io::stdout().flush()?;

    match InvoiceApiClient::new(&config.api) {
        Ok(client) => {
            println!("✅");
            Ok(Arc::new(client))
        }
        Err(e) => {
            println!("❌ Failed to initialize invoice client: {e}");
            Err(e.into())
        }
    }
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("🧾 invoice-review - Invoice attribute review and generation");
    println!();
    println!("To get started:");
    println!("  📋 invoice-review list              # See invoices and their status");
    println!("  📤 invoice-review upload FILE.pdf   # Send a new invoice for extraction");
    println!("  🔍 invoice-review show ID           # Inspect extracted attributes");
    println!("  ✏️  invoice-review review ID         # Map, validate and generate");
    println!("  📥 invoice-review download ID       # Fetch the generated invoice");
    println!();
    println!("Setup:");
    println!("  ⚙️  invoice-review init              # Write invoice-review.toml");
    println!();
    println!("💡 Start with 'invoice-review list' to find invoices waiting for review!");
    Ok(())
}

/// Attribute table for the mapping step
pub(crate) fn print_attribute_table(editor: &AttributeEditor) {
    for attr in editor.visible_roots() {
        let mark = if attr.is_mapped() { "☑" } else { "☐" };
        if attr.is_leaf() {
            println!(
                "   {} {:<24} {}",
                mark,
                attr.name(),
                attr.value().unwrap_or("")
            );
            continue;
        }

        println!("   {} {:<24} ({} items)", mark, attr.name(), attr.children().len());
        let Ok(dialog) = editor.open_children(attr.id()) else {
            continue;
        };
        for (index, row) in dialog.rows(editor).iter().enumerate() {
            let mark = if row.mapped { "☑" } else { "☐" };
            let fields: Vec<String> = row
                .fields
                .iter()
                .filter_map(|&id| editor.get(id))
                .map(|field| format!("{}={}", field.name(), field.value().unwrap_or("")))
                .collect();
            println!(
                "      {} {}[{}] {}",
                mark,
                attr.name(),
                index,
                fields.join("  ")
            );
        }
    }
}
